use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde_json::json;
use serde_json::Value as JSValue;

use crate::urna::*;

use student_voting::cpf::format_cpf;
use student_voting::tally::{project, ElectionProjection};

fn status_label(election: &Election) -> &'static str {
    if election.is_open() {
        "Open"
    } else {
        "Closed"
    }
}

/// The results of one election as displayed by `urna results`.
pub fn results_text(election: &Election) -> String {
    let p = project(election);
    let mut s = String::new();
    // Writing into a String does not fail.
    let _ = writeln!(s, "{} [{}]", election.title, status_label(election));
    let _ = writeln!(s, "Total votes: {}", p.total_votes);
    let _ = writeln!(s, "Total voters: {}", p.total_voters);
    for (idx, r) in p.per_slate.iter().enumerate() {
        let _ = writeln!(
            s,
            "{:>3}. {:>3} {:<30} {:>6} {:>7}%",
            idx + 1,
            r.slate.number,
            r.slate.name,
            r.votes,
            r.percentage_label()
        );
    }
    if let Some(w) = p.winner.as_ref().filter(|_| p.has_decided_winner()) {
        let _ = writeln!(s, "Winner: {} - {}", w.slate.number, w.slate.name);
    }
    s
}

/// The report covering all the elections: descriptions, ranked results and
/// voter lists.
pub fn general_summary(elections: &[Election], at: DateTime<Utc>) -> String {
    let rule = "=".repeat(50);
    let thin_rule = "-".repeat(50);
    let mut s = String::new();
    let _ = writeln!(s, "GENERAL REPORT OF THE VOTING SYSTEM");
    let _ = writeln!(s, "{}\n", rule);
    let _ = writeln!(s, "Exported at: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    let _ = writeln!(s, "Number of elections: {}\n", elections.len());

    for (index, election) in elections.iter().enumerate() {
        let p: ElectionProjection = project(election);
        let _ = writeln!(s, "\n{}", rule);
        let _ = writeln!(s, "ELECTION {}: {}", index + 1, election.title);
        let _ = writeln!(s, "{}\n", rule);
        let _ = writeln!(s, "Description: {}", election.description);
        let _ = writeln!(s, "Status: {}", status_label(election));
        let _ = writeln!(
            s,
            "Start: {}",
            election.start_date.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(end) = election.end_date {
            let _ = writeln!(s, "End: {}", end.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        let _ = writeln!(s, "Total votes: {}", p.total_votes);
        let _ = writeln!(s, "Total voters: {}\n", p.total_voters);

        let _ = writeln!(s, "RESULTS BY SLATE:");
        let _ = writeln!(s, "{}", thin_rule);
        for (idx, r) in p.per_slate.iter().enumerate() {
            let _ = writeln!(
                s,
                "{}. Slate {} - {}",
                idx + 1,
                r.slate.number,
                r.slate.name
            );
            let _ = writeln!(s, "   Votes: {} ({}%)", r.votes, r.percentage_label());
            if idx == 0 && p.total_votes > 0 {
                let _ = writeln!(s, "   * WINNER");
            }
            let _ = writeln!(s);
        }

        if p.total_voters > 0 {
            let _ = writeln!(s, "\nVOTERS:");
            let _ = writeln!(s, "{}", thin_rule);
            for (idx, v) in election.voters.iter().enumerate() {
                let _ = writeln!(s, "{}. {} (CPF: {})", idx + 1, v.name, format_cpf(&v.cpf));
                let _ = writeln!(
                    s,
                    "   Voted at: {}",
                    v.voted_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
        let _ = writeln!(s);
    }
    s
}

/// The results of one election in JSON format.
pub fn build_results_js(election: &Election) -> JSValue {
    let p = project(election);
    json!({
        "election": {
            "id": election.id,
            "title": election.title,
            "description": election.description,
            "status": election.status,
            "startDate": election.start_date,
            "endDate": election.end_date,
        },
        "results": p,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urna::store::tests::sample_election;

    fn at(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).unwrap()
    }

    fn voted() -> Election {
        let e = sample_election("Council");
        let ana = VoterIdentity {
            name: "Ana".to_string(),
            cpf: "11144477735".to_string(),
        };
        cast_vote_at(&e, "chapa-2", &ana, at("2024-05-01T12:30:00Z")).unwrap()
    }

    #[test]
    fn summary_marks_winner() {
        let s = general_summary(&[voted()], at("2024-05-02T09:00:00Z"));
        assert!(s.contains("Exported at: 2024-05-02 09:00:00 UTC"));
        assert!(s.contains("Number of elections: 1"));
        assert!(s.contains("ELECTION 1: Council"));
        assert!(s.contains("1. Slate 2 - Green\n   Votes: 1 (100.00%)\n   * WINNER"));
        assert!(s.contains("1. Ana (CPF: 111.444.777-35)"));
        assert!(s.contains("Voted at: 2024-05-01 12:30:00 UTC"));
    }

    #[test]
    fn summary_without_votes() {
        let s = general_summary(&[sample_election("Council")], at("2024-05-02T09:00:00Z"));
        assert!(!s.contains("WINNER"));
        assert!(!s.contains("VOTERS:"));
        assert!(s.contains("Votes: 0 (0.00%)"));
    }

    #[test]
    fn results_display() {
        let s = results_text(&voted());
        assert!(s.starts_with("Council [Open]\n"));
        assert!(s.contains("Winner: 2 - Green"));
        assert!(!results_text(&sample_election("Council")).contains("Winner"));
    }

    #[test]
    fn results_json() {
        let js = build_results_js(&voted());
        assert_eq!(js["election"]["status"], "open");
        assert_eq!(js["results"]["totalVotes"], 1);
        assert_eq!(js["results"]["winner"]["slate"]["name"], "Green");
        assert_eq!(js["results"]["perSlate"][1]["percentage"], 0.0);
    }
}
