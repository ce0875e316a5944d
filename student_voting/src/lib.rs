//! Election and vote model for small student elections.
//!
//! An [`Election`] holds a list of slates ("chapas"), a tally per slate and the
//! log of the voters. A voter is identified by their CPF and may vote only
//! once, across all the elections of a collection.
//!
//! All the operations are pure: they take the current state and return the
//! updated one. Persisting the result is the job of the caller.
//!
//! ```
//! use student_voting::*;
//!
//! let election = create_election(
//!     "Student council",
//!     "Yearly election",
//!     ElectionDates::starting_now(),
//!     &["Blue".to_string(), "Green".to_string()],
//!     &ElectionRules::DEFAULT_RULES,
//!     &[],
//! )?;
//! let voter = VoterIdentity {
//!     name: "Ana".to_string(),
//!     cpf: "111.444.777-35".to_string(),
//! };
//! let election = cast_vote(&election, "chapa-2", &voter)?;
//! let elections = vec![election];
//! assert!(has_voted(&elections, "11144477735"));
//!
//! let results = tally::project(&elections[0]);
//! assert_eq!(results.winner.map(|w| w.slate.name), Some("Green".to_string()));
//! # Ok::<(), ElectionError>(())
//! ```

mod config;
pub mod builder;
pub mod cpf;
pub mod manual;
pub mod session;
pub mod tally;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

pub use crate::config::*;
use crate::builder::ElectionBuilder;
use crate::cpf::clean_cpf;

/// Creates a new open election, slates numbered from 1 in the given order.
///
/// See [`ElectionBuilder`] for the checks.
pub fn create_election(
    title: &str,
    description: &str,
    dates: ElectionDates,
    slate_names: &[String],
    rules: &ElectionRules,
    existing: &[Election],
) -> Result<Election, ElectionError> {
    let election = ElectionBuilder::new(rules)
        .title(title)
        .description(description)
        .dates(dates)
        .slates(slate_names)
        .build(existing)?;
    info!(
        "create_election: created {} ({:?}) with {} slates",
        election.id,
        election.title,
        election.slates.len()
    );
    Ok(election)
}

/// The election that currently accepts votes.
///
/// If more than one election is open (which the creation rules normally
/// prevent), the first one wins.
pub fn find_active_election(elections: &[Election]) -> Option<&Election> {
    let mut open = elections.iter().filter(|e| e.is_open());
    let first = open.next();
    if let Some(other) = open.next() {
        warn!(
            "find_active_election: more than one open election ({} and {} at least), using the first",
            first.map(|e| e.id.to_string()).unwrap_or_default(),
            other.id
        );
    }
    first
}

pub fn find_election<'a>(elections: &'a [Election], id: &ElectionId) -> Option<&'a Election> {
    elections.iter().find(|e| e.id == *id)
}

/// True if this CPF is in the voter log of any election.
pub fn has_voted(elections: &[Election], cpf: &str) -> bool {
    let cpf = clean_cpf(cpf);
    elections
        .iter()
        .any(|e| e.voters.iter().any(|v| clean_cpf(&v.cpf) == cpf))
}

/// Casts a vote for a slate, timestamped now.
pub fn cast_vote(
    election: &Election,
    slate_id: &str,
    voter: &VoterIdentity,
) -> Result<Election, ElectionError> {
    cast_vote_at(election, slate_id, voter, Utc::now())
}

/// Returns the election with one more vote for `slate_id` and the voter
/// appended to the log.
///
/// Fails if the slate is not part of the tally of this election. The input
/// is never modified.
pub fn cast_vote_at(
    election: &Election,
    slate_id: &str,
    voter: &VoterIdentity,
    at: DateTime<Utc>,
) -> Result<Election, ElectionError> {
    if !election.votes.contains_key(slate_id) {
        return Err(ElectionError::UnknownSlate(slate_id.to_string()));
    }
    let mut res = election.clone();
    if let Some(count) = res.votes.get_mut(slate_id) {
        *count += 1;
    }
    res.voters.push(Voter {
        name: voter.name.trim().to_string(),
        cpf: clean_cpf(&voter.cpf),
        voted_at: at,
    });
    debug!(
        "cast_vote: election {}: slate {} now has {} votes",
        res.id, slate_id, res.votes[slate_id]
    );
    Ok(res)
}

/// Records a vote in the collection: the voter must not have voted before, the
/// election must exist and be open.
///
/// Returns the updated collection, the input is left untouched.
pub fn record_vote(
    elections: &[Election],
    election_id: &ElectionId,
    slate_id: &str,
    voter: &VoterIdentity,
) -> Result<Vec<Election>, ElectionError> {
    if has_voted(elections, &voter.cpf) {
        return Err(ElectionError::AlreadyVoted);
    }
    let idx = elections
        .iter()
        .position(|e| e.id == *election_id)
        .ok_or_else(|| ElectionError::UnknownElection(election_id.clone()))?;
    if !elections[idx].is_open() {
        return Err(ElectionError::ElectionClosed(election_id.clone()));
    }
    let updated = cast_vote(&elections[idx], slate_id, voter)?;
    let mut res = elections.to_vec();
    res[idx] = updated;
    info!(
        "record_vote: vote recorded in election {} ({} voters)",
        election_id,
        res[idx].voters.len()
    );
    Ok(res)
}

/// Closes an election. Closing an election that is closed or absent does
/// nothing.
///
/// Only the status changes: the dates stay as the administrator entered them.
pub fn close_election(elections: Vec<Election>, id: &ElectionId) -> Vec<Election> {
    elections
        .into_iter()
        .map(|mut e| {
            if e.id == *id && e.is_open() {
                info!("close_election: closing {}", e.id);
                e.status = ElectionStatus::Closed;
            }
            e
        })
        .collect()
}

/// Removes an election and all its votes.
pub fn delete_election(elections: Vec<Election>, id: &ElectionId) -> Vec<Election> {
    let before = elections.len();
    let res: Vec<Election> = elections.into_iter().filter(|e| e.id != *id).collect();
    if res.len() < before {
        info!("delete_election: deleted {}", id);
    } else {
        debug!("delete_election: no election {}", id);
    }
    res
}
