// Backup documents: the whole collection of elections in one JSON file.

use crate::urna::store::{Gateway, KeyValueStore};
use crate::urna::*;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JSValue;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct Snapshot {
    pub elections: Vec<Election>,
    #[serde(rename = "exportDate")]
    pub export_date: DateTime<Utc>,
    pub version: String,
}

/// Reads the elections of a backup document.
///
/// Only `elections` is required, and it must be a list of elections. The
/// other fields are informative.
pub fn parse_snapshot(blob: &str) -> Option<Vec<Election>> {
    let js: JSValue = match serde_json::from_str(blob) {
        Ok(js) => js,
        Err(e) => {
            warn!("parse_snapshot: not a JSON document: {}", e);
            return None;
        }
    };
    let elections = match js.get("elections") {
        Some(JSValue::Array(_)) => js["elections"].clone(),
        _ => {
            warn!("parse_snapshot: no list of elections in the document");
            return None;
        }
    };
    match js.get("version").and_then(|v| v.as_str()) {
        Some(SNAPSHOT_VERSION) => {}
        Some(v) => warn!("parse_snapshot: unknown version {:?}, reading anyway", v),
        None => debug!("parse_snapshot: no version"),
    }
    match serde_json::from_value::<Vec<Election>>(elections) {
        Ok(mut res) => {
            for e in res.iter_mut() {
                let added = e.seed_missing_tally();
                if !added.is_empty() {
                    debug!("parse_snapshot: election {}: zero count for {:?}", e.id, added);
                }
            }
            Some(res)
        }
        Err(e) => {
            warn!("parse_snapshot: invalid election: {}", e);
            None
        }
    }
}

impl<S: KeyValueStore> Gateway<S> {
    pub fn export_snapshot(&self) -> UrnaResult<String> {
        self.export_snapshot_at(Utc::now())
    }

    pub fn export_snapshot_at(&self, at: DateTime<Utc>) -> UrnaResult<String> {
        let snapshot = Snapshot {
            elections: self.load_all()?,
            export_date: at,
            version: SNAPSHOT_VERSION.to_string(),
        };
        info!(
            "export_snapshot: exporting {} elections",
            snapshot.elections.len()
        );
        serde_json::to_string_pretty(&snapshot).context(SerializingJsonSnafu {})
    }

    /// Replaces all the elections with the ones of the backup.
    ///
    /// Returns false, and leaves the stored elections untouched, if the
    /// document cannot be read.
    pub fn import_snapshot(&mut self, blob: &str) -> UrnaResult<bool> {
        let elections = match parse_snapshot(blob) {
            Some(e) => e,
            None => return Ok(false),
        };
        for e in elections.iter() {
            for violation in e.check_integrity() {
                warn!("import_snapshot: election {}: {}", e.id, violation);
            }
        }
        if elections.iter().filter(|e| e.is_open()).count() > 1 {
            warn!("import_snapshot: the backup has more than one open election");
        }
        self.save_all(&elections)?;
        info!("import_snapshot: imported {} elections", elections.len());
        Ok(true)
    }
}
