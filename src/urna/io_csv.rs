// CSV reports of an election.

use std::io::Write;

use crate::urna::*;

use student_voting::cpf::format_cpf;
use student_voting::tally::project;

/// One line per slate, ranked: slate,number,votes,percentage
pub fn write_results_csv<W: Write>(out: W, election: &Election) -> UrnaResult<()> {
    let projection = project(election);
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["slate", "number", "votes", "percentage"])
        .context(WritingCsvSnafu {})?;
    for r in projection.per_slate.iter() {
        wtr.write_record([
            r.slate.name.clone(),
            r.slate.number.to_string(),
            r.votes.to_string(),
            format!("{}%", r.percentage_label()),
        ])
        .context(WritingCsvSnafu {})?;
    }
    wtr.flush().context(FlushingCsvSnafu {})?;
    debug!(
        "write_results_csv: {} slates written for election {}",
        projection.per_slate.len(),
        election.id
    );
    Ok(())
}

/// The voter roster, in voting order: name,cpf,voted_at
pub fn write_voters_csv<W: Write>(out: W, election: &Election) -> UrnaResult<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["name", "cpf", "voted_at"])
        .context(WritingCsvSnafu {})?;
    for v in election.voters.iter() {
        wtr.write_record([
            v.name.clone(),
            format_cpf(&v.cpf),
            v.voted_at.to_rfc3339(),
        ])
        .context(WritingCsvSnafu {})?;
    }
    wtr.flush().context(FlushingCsvSnafu {})?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urna::store::tests::sample_election;

    fn voted() -> Election {
        let e = sample_election("Council");
        let at = parse_timestamp("2024-05-01T12:30:00Z").unwrap();
        let ana = VoterIdentity {
            name: "Ana, da Silva".to_string(),
            cpf: "11144477735".to_string(),
        };
        cast_vote_at(&e, "chapa-2", &ana, at).unwrap()
    }

    #[test]
    fn results() {
        let mut buf: Vec<u8> = Vec::new();
        write_results_csv(&mut buf, &voted()).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(
            s,
            "slate,number,votes,percentage\nGreen,2,1,100.00%\nBlue,1,0,0.00%\n"
        );
    }

    #[test]
    fn results_without_votes() {
        let mut buf: Vec<u8> = Vec::new();
        write_results_csv(&mut buf, &sample_election("Council")).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(
            s,
            "slate,number,votes,percentage\nBlue,1,0,0.00%\nGreen,2,0,0.00%\n"
        );
    }

    #[test]
    fn voters() {
        let mut buf: Vec<u8> = Vec::new();
        write_voters_csv(&mut buf, &voted()).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert_eq!(
            s,
            "name,cpf,voted_at\n\"Ana, da Silva\",111.444.777-35,2024-05-01T12:30:00+00:00\n"
        );
    }
}
