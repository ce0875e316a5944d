use crate::urna::*;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use student_voting::session::AdminCredentials;

pub const DEFAULT_STORE_FILE: &str = "urna-store.json";
pub const DEFAULT_SESSION_FILE: &str = "urna-session.json";

/// Creating an election from the command line requires two slates, even though
/// the model accepts one.
pub const DEFAULT_MIN_SLATES: usize = 2;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "minSlates")]
    pub min_slates: Option<usize>,
    #[serde(rename = "singleOpenElection")]
    pub single_open_election: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrnaConfig {
    #[serde(rename = "storePath")]
    pub store_path: Option<String>,
    /// Defaults to a file next to the store.
    #[serde(rename = "sessionPath")]
    pub session_path: Option<String>,
    pub admin: Option<AdminCredentials>,
    pub rules: Option<RulesConfig>,
}

impl UrnaConfig {
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(
            self.store_path
                .clone()
                .unwrap_or_else(|| DEFAULT_STORE_FILE.to_string()),
        )
    }

    pub fn session_path(&self) -> PathBuf {
        match &self.session_path {
            Some(p) => PathBuf::from(p),
            None => self
                .store_path()
                .parent()
                .map(|dir| dir.join(DEFAULT_SESSION_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
        }
    }

    pub fn admin(&self) -> AdminCredentials {
        self.admin.clone().unwrap_or_default()
    }

    pub fn rules(&self) -> ElectionRules {
        let rules = self.rules.clone().unwrap_or_default();
        ElectionRules {
            min_slates: rules.min_slates.unwrap_or(DEFAULT_MIN_SLATES),
            single_open_election: rules
                .single_open_election
                .unwrap_or(ElectionRules::DEFAULT_RULES.single_open_election),
        }
    }
}

pub fn read_config(path: &Path) -> UrnaResult<UrnaConfig> {
    let p = path.display().to_string();
    let contents = fs::read_to_string(path).context(ReadingFileSnafu { path: p.clone() })?;
    let config: UrnaConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: p })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = UrnaConfig::default();
        assert_eq!(c.store_path(), PathBuf::from(DEFAULT_STORE_FILE));
        assert_eq!(c.session_path(), PathBuf::from(DEFAULT_SESSION_FILE));
        assert_eq!(c.admin(), AdminCredentials::default());
        assert_eq!(c.rules().min_slates, 2);
        assert!(c.rules().single_open_election);
    }

    #[test]
    fn partial_config() {
        let js = r#"{
            "storePath": "/var/lib/urna/store.json",
            "rules": { "singleOpenElection": false }
        }"#;
        let c: UrnaConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            c.session_path(),
            PathBuf::from("/var/lib/urna").join(DEFAULT_SESSION_FILE)
        );
        assert_eq!(
            c.rules(),
            ElectionRules {
                min_slates: 2,
                single_open_election: false
            }
        );
    }

    #[test]
    fn read_from_file() {
        let path = std::env::temp_dir().join(format!("urna-config-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"admin": {"username": "mesa", "password": "s3cret"}, "rules": {"minSlates": 1}}"#,
        )
        .unwrap();
        let c = read_config(&path).unwrap();
        assert_eq!(c.admin().username, "mesa");
        assert_eq!(c.rules().min_slates, 1);
        fs::remove_file(&path).unwrap();

        assert!(matches!(
            read_config(&path),
            Err(UrnaError::ReadingFile { .. })
        ));
    }
}
