// ********* Stored data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a slate, unique within one election.
pub type SlateId = String;

/// Identifier of an election.
///
/// Freshly created elections get a random UUID. Elections imported from older
/// backups may carry any string (the first versions used a millisecond clock).
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(pub String);

impl ElectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ElectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ElectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ElectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A candidate ticket ("chapa").
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Slate {
    pub id: SlateId,
    pub name: String,
    /// The number printed on the ballot. Unique within an election.
    pub number: u32,
}

/// A voter, as recorded in the voter log once the vote has been cast.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Voter {
    pub name: String,
    /// Digits only.
    pub cpf: String,
    #[serde(rename = "votedAt")]
    pub voted_at: DateTime<Utc>,
}

/// The identity of someone about to vote.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct VoterIdentity {
    pub name: String,
    pub cpf: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    Open,
    Closed,
}

impl Display for ElectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionStatus::Open => write!(f, "open"),
            ElectionStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub title: String,
    pub description: String,
    #[serde(rename = "startDate", with = "timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "endDate", with = "optional_timestamp", default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(rename = "chapas")]
    pub slates: Vec<Slate>,
    /// Tally: slate id -> number of votes.
    pub votes: BTreeMap<SlateId, u64>,
    pub voters: Vec<Voter>,
    pub status: ElectionStatus,
}

impl Election {
    pub fn is_open(&self) -> bool {
        self.status == ElectionStatus::Open
    }

    pub fn slate(&self, slate_id: &str) -> Option<&Slate> {
        self.slates.iter().find(|s| s.id == slate_id)
    }

    pub fn slate_by_number(&self, number: u32) -> Option<&Slate> {
        self.slates.iter().find(|s| s.number == number)
    }

    /// Sum of all the counts in the tally.
    pub fn total_votes(&self) -> u64 {
        self.votes.values().sum()
    }

    /// Adds a zero count for every slate absent from the tally. Elections
    /// saved without any vote may carry an empty tally.
    ///
    /// Returns the ids of the slates that were added.
    pub fn seed_missing_tally(&mut self) -> Vec<SlateId> {
        let mut added: Vec<SlateId> = Vec::new();
        for s in self.slates.iter() {
            if !self.votes.contains_key(&s.id) {
                self.votes.insert(s.id.clone(), 0);
                added.push(s.id.clone());
            }
        }
        added
    }

    /// Checks the invariants that tie the tally, the slates and the voter log
    /// together. Returns the list of violations, empty if the election is
    /// consistent.
    pub fn check_integrity(&self) -> Vec<IntegrityViolation> {
        let mut res: Vec<IntegrityViolation> = Vec::new();
        let mut seen_ids: Vec<&str> = Vec::new();
        let mut seen_numbers: Vec<u32> = Vec::new();
        for s in self.slates.iter() {
            if seen_ids.contains(&s.id.as_str()) {
                res.push(IntegrityViolation::DuplicateSlateId(s.id.clone()));
            }
            seen_ids.push(s.id.as_str());
            if seen_numbers.contains(&s.number) {
                res.push(IntegrityViolation::DuplicateBallotNumber(s.number));
            }
            seen_numbers.push(s.number);
            if !self.votes.contains_key(&s.id) {
                res.push(IntegrityViolation::MissingTallyEntry(s.id.clone()));
            }
        }
        for k in self.votes.keys() {
            if !seen_ids.contains(&k.as_str()) {
                res.push(IntegrityViolation::UnknownTallyEntry(k.clone()));
            }
        }
        let total = self.total_votes();
        if total != self.voters.len() as u64 {
            res.push(IntegrityViolation::TallyMismatch {
                total_votes: total,
                voters: self.voters.len() as u64,
            });
        }
        res
    }
}

/// A broken invariant in a stored election.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum IntegrityViolation {
    DuplicateSlateId(SlateId),
    DuplicateBallotNumber(u32),
    /// A slate without a tally entry.
    MissingTallyEntry(SlateId),
    /// A tally entry without a slate.
    UnknownTallyEntry(SlateId),
    TallyMismatch { total_votes: u64, voters: u64 },
}

impl Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityViolation::DuplicateSlateId(id) => write!(f, "duplicate slate id {}", id),
            IntegrityViolation::DuplicateBallotNumber(n) => {
                write!(f, "duplicate ballot number {}", n)
            }
            IntegrityViolation::MissingTallyEntry(id) => {
                write!(f, "slate {} has no tally entry", id)
            }
            IntegrityViolation::UnknownTallyEntry(id) => {
                write!(f, "tally entry {} does not match any slate", id)
            }
            IntegrityViolation::TallyMismatch {
                total_votes,
                voters,
            } => write!(
                f,
                "tally counts {} votes but {} voters are recorded",
                total_votes, voters
            ),
        }
    }
}

// ********* Errors **********

/// Errors raised by the election model and the session flow.
///
/// None of them leave any state modified.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ElectionError {
    /// A required text field is empty. Carries the name of the field.
    BlankField(&'static str),
    InvalidCpf(String),
    DuplicateBallotNumber(u32),
    NotEnoughSlates { required: usize, provided: usize },
    AlreadyVoted,
    NoActiveElection,
    /// Another election is still open.
    ElectionAlreadyOpen(ElectionId),
    UnknownElection(ElectionId),
    ElectionClosed(ElectionId),
    UnknownSlate(SlateId),
    InvalidCredentials,
    NotAuthenticated,
    NoPendingVoter,
}

impl Error for ElectionError {}

impl Display for ElectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElectionError::BlankField(field) => write!(f, "the {} must not be blank", field),
            ElectionError::InvalidCpf(cpf) => write!(f, "invalid CPF: {:?}", cpf),
            ElectionError::DuplicateBallotNumber(n) => {
                write!(f, "ballot number {} is used by more than one slate", n)
            }
            ElectionError::NotEnoughSlates { required, provided } => write!(
                f,
                "at least {} slate(s) required, {} provided",
                required, provided
            ),
            ElectionError::AlreadyVoted => write!(f, "this CPF has already voted"),
            ElectionError::NoActiveElection => write!(f, "no election is open at the moment"),
            ElectionError::ElectionAlreadyOpen(id) => {
                write!(f, "election {} is still open, close it first", id)
            }
            ElectionError::UnknownElection(id) => write!(f, "no election with id {}", id),
            ElectionError::ElectionClosed(id) => write!(f, "election {} is closed", id),
            ElectionError::UnknownSlate(id) => write!(f, "no slate with id {}", id),
            ElectionError::InvalidCredentials => write!(f, "wrong username or password"),
            ElectionError::NotAuthenticated => write!(f, "administrator login required"),
            ElectionError::NoPendingVoter => {
                write!(f, "no voter identified, identify yourself first")
            }
        }
    }
}

// ********* Rules **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ElectionRules {
    /// Minimum number of slates for a new election.
    pub min_slates: usize,
    /// Refuse to create an election while another one is open.
    pub single_open_election: bool,
}

impl ElectionRules {
    pub const DEFAULT_RULES: ElectionRules = ElectionRules {
        min_slates: 1,
        single_open_election: true,
    };
}

impl Default for ElectionRules {
    fn default() -> Self {
        Self::DEFAULT_RULES
    }
}

/// Start and end of an election.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ElectionDates {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl ElectionDates {
    /// Starts now, no end date.
    pub fn starting_now() -> Self {
        ElectionDates {
            start: Utc::now(),
            end: None,
        }
    }
}

// ********* Timestamps **********

/// Parses a timestamp as written by the various versions of the election
/// forms: full RFC 3339, or a local date-time without seconds or timezone
/// (`2024-03-01T08:00`), or a bare date. Naive values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&d));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| Utc.from_utc_datetime(&d))
}

pub(crate) fn format_timestamp(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_timestamp(d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(d)?;
        super::parse_timestamp(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", s)))
    }
}

// An absent end date is written as an empty string.
mod optional_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_str(&super::format_timestamp(d)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let s: Option<String> = Option::deserialize(d)?;
        match s.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(x) => super::parse_timestamp(x)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid timestamp {:?}", x))),
        }
    }
}
