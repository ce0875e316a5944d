use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::*;
use crate::cpf::{clean_cpf, is_valid_cpf};
use crate::{find_active_election, has_voted};

/// The administrator account.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        AdminCredentials {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

/// The ephemeral state of a user session.
///
/// It is not part of the election data. The caller loads it before handling an
/// action and stores it back afterwards.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Session {
    pub admin_authenticated: bool,
    /// Set once a voter has been identified, until the vote is cast.
    pub pending_voter: Option<VoterIdentity>,
}

impl Session {
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        credentials: &AdminCredentials,
    ) -> Result<(), ElectionError> {
        if username == credentials.username && password == credentials.password {
            info!("login: administrator {} logged in", username);
            self.admin_authenticated = true;
            Ok(())
        } else {
            Err(ElectionError::InvalidCredentials)
        }
    }

    pub fn logout(&mut self) {
        self.admin_authenticated = false;
    }

    pub fn require_admin(&self) -> Result<(), ElectionError> {
        if self.admin_authenticated {
            Ok(())
        } else {
            Err(ElectionError::NotAuthenticated)
        }
    }

    /// Identifies a voter and returns the election they are going to vote in.
    ///
    /// The checks are, in order: a name is given, the CPF has 11 digits, the
    /// CPF did not vote in any election, and an election is open.
    pub fn begin_vote<'a>(
        &mut self,
        name: &str,
        cpf: &str,
        elections: &'a [Election],
    ) -> Result<&'a Election, ElectionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ElectionError::BlankField("name"));
        }
        if !is_valid_cpf(cpf) {
            return Err(ElectionError::InvalidCpf(cpf.to_string()));
        }
        let cpf = clean_cpf(cpf);
        if has_voted(elections, &cpf) {
            return Err(ElectionError::AlreadyVoted);
        }
        let active = find_active_election(elections).ok_or(ElectionError::NoActiveElection)?;
        debug!("begin_vote: voter identified for election {}", active.id);
        self.pending_voter = Some(VoterIdentity {
            name: name.to_string(),
            cpf,
        });
        Ok(active)
    }

    pub fn pending_voter(&self) -> Result<&VoterIdentity, ElectionError> {
        self.pending_voter
            .as_ref()
            .ok_or(ElectionError::NoPendingVoter)
    }

    /// Forgets the voter once the vote has been recorded.
    pub fn finish_vote(&mut self) {
        self.pending_voter = None;
    }

    pub fn clear(&mut self) {
        *self = Session::default();
    }
}
