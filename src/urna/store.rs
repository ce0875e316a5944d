// Key-value storage of the elections and of the session markers.

use crate::urna::*;

use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use student_voting::session::Session;

pub const ELECTIONS_KEY: &str = "elections";
pub const ADMIN_AUTH_KEY: &str = "adminAuth";
pub const VOTER_KEY: &str = "voter";

/// A flat store of string values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> UrnaResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> UrnaResult<()>;
    fn remove(&mut self, key: &str) -> UrnaResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> UrnaResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> UrnaResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> UrnaResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store kept in one JSON object on disk.
///
/// Values that are JSON documents are kept as such in the file, so that it
/// stays readable. Every change rewrites the whole file through a temporary
/// file and a rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> FileStore {
        FileStore { path: path.into() }
    }

    fn read_entries(&self) -> UrnaResult<JSMap<String, JSValue>> {
        let p = self.path.display().to_string();
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("read_entries: {} does not exist yet", p);
                return Ok(JSMap::new());
            }
            Err(e) => return Err(e).context(ReadingFileSnafu { path: p }),
        };
        match serde_json::from_str::<JSValue>(&contents) {
            Ok(JSValue::Object(m)) => Ok(m),
            Ok(_) | Err(_) => {
                warn!("read_entries: {} is not a JSON object, treating it as empty", p);
                Ok(JSMap::new())
            }
        }
    }

    fn write_entries(&self, entries: &JSMap<String, JSValue>) -> UrnaResult<()> {
        let p = self.path.display().to_string();
        let contents = serde_json::to_string_pretty(entries).context(SerializingJsonSnafu {})?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).context(WritingFileSnafu {
            path: tmp.display().to_string(),
        })?;
        fs::rename(&tmp, &self.path).context(WritingFileSnafu { path: p })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> UrnaResult<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries.get(key).map(|v| match v {
            JSValue::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn set(&mut self, key: &str, value: &str) -> UrnaResult<()> {
        let mut entries = self.read_entries()?;
        let v = serde_json::from_str::<JSValue>(value)
            .unwrap_or_else(|_| JSValue::String(value.to_string()));
        entries.insert(key.to_string(), v);
        self.write_entries(&entries)
    }

    fn remove(&mut self, key: &str) -> UrnaResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// The only access to the storage: the elections live in the durable store,
/// the session markers in the session store.
pub struct Gateway<S: KeyValueStore> {
    pub(crate) durable: S,
    pub(crate) session: S,
}

impl<S: KeyValueStore> Gateway<S> {
    pub fn new(durable: S, session: S) -> Gateway<S> {
        Gateway { durable, session }
    }

    /// All the stored elections. Missing or unreadable data is an empty
    /// collection.
    pub fn load_all(&self) -> UrnaResult<Vec<Election>> {
        let data = match self.durable.get(ELECTIONS_KEY)? {
            Some(d) => d,
            None => return Ok(Vec::new()),
        };
        match serde_json::from_str::<Vec<Election>>(&data) {
            Ok(mut elections) => {
                for e in elections.iter_mut() {
                    e.seed_missing_tally();
                }
                debug!("load_all: {} elections", elections.len());
                Ok(elections)
            }
            Err(e) => {
                warn!("load_all: stored elections cannot be read ({}), ignoring them", e);
                Ok(Vec::new())
            }
        }
    }

    /// Replaces the whole collection.
    pub fn save_all(&mut self, elections: &[Election]) -> UrnaResult<()> {
        let data = serde_json::to_string(elections).context(SerializingJsonSnafu {})?;
        self.durable.set(ELECTIONS_KEY, &data)?;
        debug!("save_all: {} elections saved", elections.len());
        Ok(())
    }

    pub fn load_session(&self) -> UrnaResult<Session> {
        let admin_authenticated = self.session.get(ADMIN_AUTH_KEY)?.as_deref() == Some("true");
        let pending_voter = match self.session.get(VOTER_KEY)? {
            Some(s) => match serde_json::from_str::<VoterIdentity>(&s) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("load_session: ignoring unreadable voter marker: {}", e);
                    None
                }
            },
            None => None,
        };
        Ok(Session {
            admin_authenticated,
            pending_voter,
        })
    }

    pub fn save_session(&mut self, session: &Session) -> UrnaResult<()> {
        if session.admin_authenticated {
            self.session.set(ADMIN_AUTH_KEY, "true")?;
        } else {
            self.session.remove(ADMIN_AUTH_KEY)?;
        }
        match &session.pending_voter {
            Some(v) => {
                let data = serde_json::to_string(v).context(SerializingJsonSnafu {})?;
                self.session.set(VOTER_KEY, &data)
            }
            None => self.session.remove(VOTER_KEY),
        }
    }

    /// Removes the elections and the session markers.
    pub fn wipe(&mut self) -> UrnaResult<()> {
        warn!("wipe: removing all the elections and the session");
        self.durable.remove(ELECTIONS_KEY)?;
        self.durable.remove(ADMIN_AUTH_KEY)?;
        self.durable.remove(VOTER_KEY)?;
        self.session.remove(ADMIN_AUTH_KEY)?;
        self.session.remove(VOTER_KEY)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use student_voting::builder::ElectionBuilder;

    pub(crate) fn memory_gateway() -> Gateway<MemoryStore> {
        Gateway::new(MemoryStore::default(), MemoryStore::default())
    }

    pub(crate) fn sample_election(title: &str) -> Election {
        ElectionBuilder::new(&ElectionRules::DEFAULT_RULES)
            .title(title)
            .description("Yearly vote")
            .slate("Blue")
            .slate("Green")
            .build(&[])
            .unwrap()
    }

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("urna-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn absent_data_is_empty() {
        let g = memory_gateway();
        assert!(g.load_all().unwrap().is_empty());
        assert_eq!(g.load_session().unwrap(), Session::default());
    }

    #[test]
    fn corrupt_data_is_empty() {
        let mut g = memory_gateway();
        g.durable.set(ELECTIONS_KEY, "[{\"id\": ").unwrap();
        assert!(g.load_all().unwrap().is_empty());
        g.durable.set(ELECTIONS_KEY, "{\"not\": \"a list\"}").unwrap();
        assert!(g.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_and_load() {
        let mut g = memory_gateway();
        let elections = vec![sample_election("A"), sample_election("B")];
        g.save_all(&elections).unwrap();
        assert_eq!(g.load_all().unwrap(), elections);
        g.save_all(&elections[1..]).unwrap();
        assert_eq!(g.load_all().unwrap(), elections[1..].to_vec());
    }

    #[test]
    fn empty_tally_gets_zero_counts() {
        let mut g = memory_gateway();
        let mut e = sample_election("A");
        e.votes.clear();
        g.durable
            .set(ELECTIONS_KEY, &serde_json::to_string(&[e]).unwrap())
            .unwrap();
        let loaded = g.load_all().unwrap();
        assert_eq!(loaded[0].votes.get("chapa-1"), Some(&0));
        assert_eq!(loaded[0].votes.get("chapa-2"), Some(&0));
    }

    #[test]
    fn session_markers() {
        let mut g = memory_gateway();
        let s = Session {
            admin_authenticated: true,
            pending_voter: Some(VoterIdentity {
                name: "Ana".to_string(),
                cpf: "11144477735".to_string(),
            }),
        };
        g.save_session(&s).unwrap();
        assert_eq!(g.session.get(ADMIN_AUTH_KEY).unwrap().as_deref(), Some("true"));
        assert_eq!(g.load_session().unwrap(), s);
        // Session markers never land in the durable store.
        assert_eq!(g.durable.get(ADMIN_AUTH_KEY).unwrap(), None);
        g.save_session(&Session::default()).unwrap();
        assert_eq!(g.session.get(VOTER_KEY).unwrap(), None);
        assert_eq!(g.load_session().unwrap(), Session::default());
    }

    #[test]
    fn wipe_removes_everything() {
        let mut g = memory_gateway();
        g.save_all(&[sample_election("A")]).unwrap();
        g.save_session(&Session {
            admin_authenticated: true,
            pending_voter: None,
        })
        .unwrap();
        g.wipe().unwrap();
        assert!(g.load_all().unwrap().is_empty());
        assert_eq!(g.load_session().unwrap(), Session::default());
    }

    #[test]
    fn file_store() {
        let path = temp_path("file-store");
        let _ = fs::remove_file(&path);
        let mut store = FileStore::new(&path);
        assert_eq!(store.get("x").unwrap(), None);
        store.set("x", "plain text").unwrap();
        store.set("flag", "true").unwrap();
        store.set("doc", "[1, 2]").unwrap();
        assert_eq!(store.get("x").unwrap().as_deref(), Some("plain text"));
        assert_eq!(store.get("flag").unwrap().as_deref(), Some("true"));
        assert_eq!(store.get("doc").unwrap().as_deref(), Some("[1,2]"));
        store.remove("x").unwrap();
        assert_eq!(store.get("x").unwrap(), None);
        // The file holds the documents as JSON values.
        let js: JSValue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(js["doc"][1], 2);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_gateway_round_trip() {
        let durable = temp_path("gateway-durable");
        let session = temp_path("gateway-session");
        let mut g = Gateway::new(FileStore::new(&durable), FileStore::new(&session));
        let elections = vec![sample_election("A")];
        g.save_all(&elections).unwrap();
        let g2 = Gateway::new(FileStore::new(&durable), FileStore::new(&session));
        assert_eq!(g2.load_all().unwrap(), elections);
        fs::write(&durable, "garbage").unwrap();
        assert!(g2.load_all().unwrap().is_empty());
        let _ = fs::remove_file(&durable);
        let _ = fs::remove_file(&session);
    }
}
