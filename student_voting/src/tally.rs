use log::debug;
use serde::Serialize;

use crate::config::*;

/// The result of one slate.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct SlateResult {
    pub slate: Slate,
    pub votes: u64,
    /// In percent of all the votes, 0 when nobody voted.
    pub percentage: f64,
}

impl SlateResult {
    /// The percentage with two decimals, as displayed in the reports.
    pub fn percentage_label(&self) -> String {
        format!("{:.2}", self.percentage)
    }
}

/// Everything the reports need to know about the outcome of an election.
#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct ElectionProjection {
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
    #[serde(rename = "totalVoters")]
    pub total_voters: u64,
    /// Sorted by decreasing number of votes. Slates with the same number of
    /// votes keep the order of the ballot.
    #[serde(rename = "perSlate")]
    pub per_slate: Vec<SlateResult>,
    /// The first entry of `per_slate`. Only missing when the election has no
    /// slate at all. It is set even when no vote has been cast.
    pub winner: Option<SlateResult>,
}

impl ElectionProjection {
    /// True if somebody actually won: there is a winner with at least one vote.
    pub fn has_decided_winner(&self) -> bool {
        self.total_votes > 0 && self.winner.is_some()
    }
}

/// Computes the percentages, the ranking and the winner of an election.
pub fn project(election: &Election) -> ElectionProjection {
    let total_votes = election.total_votes();
    let mut per_slate: Vec<SlateResult> = election
        .slates
        .iter()
        .map(|slate| {
            let votes = election.votes.get(&slate.id).cloned().unwrap_or(0);
            let percentage = if total_votes > 0 {
                (votes as f64 / total_votes as f64) * 100.0
            } else {
                0.0
            };
            SlateResult {
                slate: slate.clone(),
                votes,
                percentage,
            }
        })
        .collect();
    // Stable sort: ties keep the ballot order.
    per_slate.sort_by(|a, b| b.votes.cmp(&a.votes));
    let winner = per_slate.first().cloned();
    debug!(
        "project: election {}: {} votes, winner {:?}",
        election.id,
        total_votes,
        winner.as_ref().map(|w| &w.slate.name)
    );
    ElectionProjection {
        total_votes,
        total_voters: election.voters.len() as u64,
        per_slate,
        winner,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ElectionBuilder;
    use crate::cast_vote;

    fn identity(name: &str, cpf: &str) -> VoterIdentity {
        VoterIdentity {
            name: name.to_string(),
            cpf: cpf.to_string(),
        }
    }

    fn three_slates() -> Election {
        ElectionBuilder::new(&ElectionRules::DEFAULT_RULES)
            .title("Council")
            .description("Yearly vote")
            .slate("A")
            .slate("B")
            .slate("C")
            .build(&[])
            .unwrap()
    }

    #[test]
    fn no_votes() {
        let e = three_slates();
        let p = project(&e);
        assert_eq!(p.total_votes, 0);
        assert_eq!(p.total_voters, 0);
        assert!(p.per_slate.iter().all(|r| r.percentage == 0.0));
        assert!(p.per_slate.iter().all(|r| r.percentage_label() == "0.00"));
        assert_eq!(p.winner.map(|w| w.slate.name), Some("A".to_string()));
        assert!(!project(&e).has_decided_winner());
    }

    #[test]
    fn ranking_is_stable_on_ties() {
        let mut e = three_slates();
        e = cast_vote(&e, "chapa-3", &identity("x", "00000000001")).unwrap();
        e = cast_vote(&e, "chapa-2", &identity("y", "00000000002")).unwrap();
        e = cast_vote(&e, "chapa-3", &identity("z", "00000000003")).unwrap();
        let p = project(&e);
        let names: Vec<&str> = p.per_slate.iter().map(|r| r.slate.name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
        assert_eq!(p.per_slate[0].percentage_label(), "66.67");
        assert_eq!(p.per_slate[1].percentage_label(), "33.33");
        assert_eq!(p.winner.as_ref().map(|w| w.votes), Some(2));
    }

    #[test]
    fn tie_between_two_slates() {
        let mut e = ElectionBuilder::new(&ElectionRules::DEFAULT_RULES)
            .title("E")
            .description("d")
            .slate("A")
            .slate("B")
            .build(&[])
            .unwrap();
        e = cast_vote(&e, "chapa-1", &identity("voter1", "11144477735")).unwrap();
        assert_eq!(e.votes["chapa-1"], 1);
        assert_eq!(e.votes["chapa-2"], 0);
        e = cast_vote(&e, "chapa-2", &identity("voter2", "22255588846")).unwrap();
        let p = project(&e);
        assert_eq!(p.total_votes, 2);
        assert_eq!(p.total_voters, 2);
        assert_eq!(p.per_slate[0].slate.name, "A");
        assert_eq!(p.per_slate[0].percentage_label(), "50.00");
        assert_eq!(p.per_slate[1].percentage_label(), "50.00");
        assert_eq!(p.winner.map(|w| w.slate.name), Some("A".to_string()));
        assert!(project(&e).has_decided_winner());
    }

    #[test]
    fn empty_election() {
        let e = Election {
            slates: Vec::new(),
            votes: Default::default(),
            ..three_slates()
        };
        let p = project(&e);
        assert!(p.per_slate.is_empty());
        assert_eq!(p.winner, None);
    }
}
