use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use student_voting::tally::project;
use student_voting::*;

use crate::args::{Args, Command, ReportKind};
use crate::urna::config_reader::*;
use crate::urna::store::{FileStore, Gateway, KeyValueStore};

pub mod config_reader;
mod io_csv;
pub mod snapshot;
pub mod store;
mod summary;

#[derive(Debug, Snafu)]
pub enum UrnaError {
    #[snafu(display("Error reading file {path}"))]
    ReadingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing to the standard output"))]
    WritingOutput { source: std::io::Error },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing to JSON"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Error writing CSV"))]
    WritingCsv { source: csv::Error },
    #[snafu(display("Error writing CSV"))]
    FlushingCsv { source: std::io::Error },
    #[snafu(display("{source}"))]
    Model { source: ElectionError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type UrnaResult<T> = Result<T, UrnaError>;

/// The application: a gateway to the storage and the configuration.
pub struct Urna<S: KeyValueStore> {
    gateway: Gateway<S>,
    config: UrnaConfig,
}

impl<S: KeyValueStore> Urna<S> {
    pub fn new(gateway: Gateway<S>, config: UrnaConfig) -> Urna<S> {
        Urna { gateway, config }
    }

    /// Runs one command. The session is loaded before and saved after, also
    /// when the command fails.
    pub fn run<W: Write>(&mut self, command: &Command, out: &mut W) -> UrnaResult<()> {
        let mut session = self.gateway.load_session()?;
        debug!("run: {:?} with session {:?}", command, session);
        let res = self.dispatch(command, &mut session, out);
        self.gateway.save_session(&session)?;
        res
    }

    fn dispatch<W: Write>(
        &mut self,
        command: &Command,
        session: &mut session::Session,
        out: &mut W,
    ) -> UrnaResult<()> {
        match command {
            Command::Identify { name, cpf } => {
                let elections = self.gateway.load_all()?;
                let active = session
                    .begin_vote(name, cpf, &elections)
                    .context(ModelSnafu {})?;
                let msg = format!(
                    "Voter {} identified for the election {:?}. Run `urna ballot` to see the slates.",
                    name.trim(),
                    active.title
                );
                print_line(out, &msg)
            }
            Command::Ballot => {
                session.pending_voter().context(ModelSnafu {})?;
                let elections = self.gateway.load_all()?;
                let active = self.pick(&elections, None)?;
                print_line(out, &format!("Ballot - {}", active.title))?;
                for s in active.slates.iter() {
                    print_line(out, &format!("  {:>3}  {}  ({})", s.number, s.name, s.id))?;
                }
                Ok(())
            }
            Command::Vote { slate } => {
                let voter = session.pending_voter().context(ModelSnafu {})?.clone();
                let elections = self.gateway.load_all()?;
                let active = self.pick(&elections, None)?;
                let slate_id = resolve_slate(active, slate);
                let active_id = active.id.clone();
                let updated =
                    record_vote(&elections, &active_id, &slate_id, &voter).context(ModelSnafu {})?;
                self.gateway.save_all(&updated)?;
                session.finish_vote();
                let when = find_election(&updated, &active_id)
                    .and_then(|e| e.voters.last())
                    .map(|v| v.voted_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_default();
                print_line(out, &format!("Vote recorded successfully at {}", when))
            }
            Command::Login { username, password } => {
                session
                    .login(username, password, &self.config.admin())
                    .context(ModelSnafu {})?;
                print_line(out, "Logged in")
            }
            Command::Logout => {
                session.logout();
                print_line(out, "Logged out")
            }
            Command::Create {
                title,
                description,
                start,
                end,
                slates,
            } => {
                session.require_admin().context(ModelSnafu {})?;
                let dates = ElectionDates {
                    start: match start {
                        Some(s) => parse_date_arg(s)?,
                        None => Utc::now(),
                    },
                    end: match end {
                        Some(s) => Some(parse_date_arg(s)?),
                        None => None,
                    },
                };
                let mut elections = self.gateway.load_all()?;
                let election = create_election(
                    title,
                    description,
                    dates,
                    slates,
                    &self.config.rules(),
                    &elections,
                )
                .context(ModelSnafu {})?;
                let id = election.id.clone();
                elections.push(election);
                self.gateway.save_all(&elections)?;
                print_line(out, &format!("Created election {}", id))
            }
            Command::List => {
                session.require_admin().context(ModelSnafu {})?;
                let elections = self.gateway.load_all()?;
                if elections.is_empty() {
                    return print_line(out, "No elections");
                }
                for e in elections.iter() {
                    let line = format!(
                        "{}  {:<6}  {:>5} votes  {}",
                        e.id,
                        e.status,
                        e.total_votes(),
                        e.title
                    );
                    print_line(out, &line)?;
                }
                Ok(())
            }
            Command::Close { id } => {
                session.require_admin().context(ModelSnafu {})?;
                let id = ElectionId::from(id.as_str());
                let elections = self.existing(&id)?;
                self.gateway.save_all(&close_election(elections, &id))?;
                print_line(out, &format!("Election {} closed", id))
            }
            Command::Delete { id } => {
                session.require_admin().context(ModelSnafu {})?;
                let id = ElectionId::from(id.as_str());
                let elections = self.existing(&id)?;
                self.gateway.save_all(&delete_election(elections, &id))?;
                print_line(out, &format!("Election {} deleted", id))
            }
            Command::Results { id, json } => {
                session.require_admin().context(ModelSnafu {})?;
                let id = ElectionId::from(id.as_str());
                let elections = self.existing(&id)?;
                let election = self.pick(&elections, Some(&id))?;
                if *json {
                    let js = summary::build_results_js(election);
                    let pretty = serde_json::to_string_pretty(&js).context(SerializingJsonSnafu {})?;
                    print_line(out, &pretty)
                } else {
                    out.write_all(summary::results_text(election).as_bytes())
                        .context(WritingOutputSnafu {})
                }
            }
            Command::Report {
                kind,
                election,
                out: out_path,
            } => {
                session.require_admin().context(ModelSnafu {})?;
                let elections = self.gateway.load_all()?;
                let id = election.as_deref().map(ElectionId::from);
                let mut buf: Vec<u8> = Vec::new();
                match kind {
                    ReportKind::Results => {
                        let e = self.pick(&elections, id.as_ref())?;
                        info!("report: results of {}: {} votes", e.id, project(e).total_votes);
                        io_csv::write_results_csv(&mut buf, e)?;
                    }
                    ReportKind::Voters => {
                        let e = self.pick(&elections, id.as_ref())?;
                        io_csv::write_voters_csv(&mut buf, e)?;
                    }
                    ReportKind::Summary => {
                        if id.is_some() {
                            warn!("report: the summary covers all the elections, ignoring --election");
                        }
                        buf.extend(summary::general_summary(&elections, Utc::now()).into_bytes());
                    }
                }
                write_output(out_path.as_deref(), &buf, out)
            }
            Command::Export { out: out_path } => {
                session.require_admin().context(ModelSnafu {})?;
                let blob = self.gateway.export_snapshot()?;
                write_output(out_path.as_deref(), blob.as_bytes(), out)
            }
            Command::Import { file } => {
                session.require_admin().context(ModelSnafu {})?;
                let blob =
                    fs::read_to_string(file).context(ReadingFileSnafu { path: file.clone() })?;
                if !self.gateway.import_snapshot(&blob)? {
                    whatever!(
                        "Could not import {}: expected a backup document with a list of elections",
                        file
                    )
                }
                let count = self.gateway.load_all()?.len();
                print_line(out, &format!("Imported {} elections", count))
            }
            Command::Wipe { yes } => {
                session.require_admin().context(ModelSnafu {})?;
                if !*yes {
                    whatever!("This deletes all the elections, votes and voters. Run again with --yes to confirm.")
                }
                self.gateway.wipe()?;
                session.clear();
                print_line(out, "All data deleted")
            }
        }
    }

    /// The collection, if it holds an election with this id.
    fn existing(&self, id: &ElectionId) -> UrnaResult<Vec<Election>> {
        let elections = self.gateway.load_all()?;
        if find_election(&elections, id).is_none() {
            return Err(ElectionError::UnknownElection(id.clone())).context(ModelSnafu {});
        }
        Ok(elections)
    }

    /// The election with the given id, or the open one.
    fn pick<'a>(
        &self,
        elections: &'a [Election],
        id: Option<&ElectionId>,
    ) -> UrnaResult<&'a Election> {
        let res = match id {
            Some(id) => {
                find_election(elections, id).ok_or_else(|| ElectionError::UnknownElection(id.clone()))
            }
            None => find_active_election(elections).ok_or(ElectionError::NoActiveElection),
        };
        res.context(ModelSnafu {})
    }
}

/// The slate designated by a ballot number or by an id. Unknown values are
/// passed through and rejected when the vote is cast.
fn resolve_slate(election: &Election, choice: &str) -> SlateId {
    let choice = choice.trim();
    if election.slate(choice).is_some() {
        return choice.to_string();
    }
    choice
        .parse::<u32>()
        .ok()
        .and_then(|n| election.slate_by_number(n))
        .map(|s| s.id.clone())
        .unwrap_or_else(|| choice.to_string())
}

fn parse_date_arg(s: &str) -> UrnaResult<chrono::DateTime<Utc>> {
    match parse_timestamp(s) {
        Some(d) => Ok(d),
        None => whatever!("Invalid date {:?}, expected e.g. 2024-05-01T08:00", s),
    }
}

fn print_line<W: Write>(out: &mut W, line: &str) -> UrnaResult<()> {
    writeln!(out, "{}", line).context(WritingOutputSnafu {})
}

/// Writes to the given file, or to `out` if there is none or it is 'stdout'.
fn write_output<W: Write>(path: Option<&str>, content: &[u8], out: &mut W) -> UrnaResult<()> {
    match path {
        Some(p) if !p.is_empty() && p != "stdout" => {
            fs::write(Path::new(p), content).context(WritingFileSnafu { path: p.to_string() })?;
            info!("write_output: {} bytes written to {}", content.len(), p);
            Ok(())
        }
        _ => out.write_all(content).context(WritingOutputSnafu {}),
    }
}

/// Entry point of the command line: reads the configuration and runs the
/// command against the files on disk.
pub fn run_args(args: &Args) -> UrnaResult<()> {
    let mut config = match &args.config {
        Some(p) => read_config(Path::new(p))?,
        None => UrnaConfig::default(),
    };
    if let Some(store) = &args.store {
        config.store_path = Some(store.clone());
    }
    info!(
        "run_args: store {}, session {}",
        config.store_path().display(),
        config.session_path().display()
    );
    let gateway = Gateway::new(
        FileStore::new(config.store_path()),
        FileStore::new(config.session_path()),
    );
    let mut app = Urna::new(gateway, config);
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    app.run(&args.command, &mut handle)
}
