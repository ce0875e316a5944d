use clap::{Parser, Subcommand, ValueEnum};

/// Ballot box for student elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. See the manual of the
    /// student_voting crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) The file holding the elections. Overrides the
    /// storePath of the configuration file.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Identifies a voter before voting.
    Identify {
        /// Full name of the voter.
        #[clap(long, value_parser)]
        name: String,
        /// CPF, with or without punctuation.
        #[clap(long, value_parser)]
        cpf: String,
    },
    /// Shows the ballot of the open election.
    Ballot,
    /// Casts the vote of the identified voter.
    Vote {
        /// The ballot number or the id of the slate.
        #[clap(long, value_parser)]
        slate: String,
    },
    /// Logs in as administrator.
    Login {
        #[clap(short, long, value_parser)]
        username: String,
        #[clap(short, long, value_parser)]
        password: String,
    },
    /// Ends the administrator session.
    Logout,
    /// Creates an election. Requires the administrator login.
    Create {
        #[clap(long, value_parser)]
        title: String,
        #[clap(long, value_parser)]
        description: String,
        /// (date, default now) Start of the election, RFC 3339 or YYYY-MM-DDTHH:MM.
        #[clap(long, value_parser)]
        start: Option<String>,
        /// (date, optional) End of the election.
        #[clap(long, value_parser)]
        end: Option<String>,
        /// Name of a slate. Repeat the flag for each slate, in ballot order.
        #[clap(long = "slate", value_parser)]
        slates: Vec<String>,
    },
    /// Lists all the elections.
    List,
    /// Closes an election.
    Close {
        #[clap(value_parser)]
        id: String,
    },
    /// Deletes an election and its votes.
    Delete {
        #[clap(value_parser)]
        id: String,
    },
    /// Shows the results of an election.
    Results {
        #[clap(value_parser)]
        id: String,
        /// Prints the results in JSON format.
        #[clap(long, takes_value = false)]
        json: bool,
    },
    /// Writes a report.
    Report {
        #[clap(value_enum)]
        kind: ReportKind,
        /// (election id, default the open election) For the results and voters reports.
        #[clap(short, long, value_parser)]
        election: Option<String>,
        /// (file path or empty) Where to write the report. Standard output if not set.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Writes a backup of all the elections.
    Export {
        /// (file path or empty) Standard output if not set.
        #[clap(short, long, value_parser)]
        out: Option<String>,
    },
    /// Replaces all the elections with the content of a backup.
    Import {
        #[clap(value_parser)]
        file: String,
    },
    /// Deletes all the elections and the session. Cannot be undone.
    Wipe {
        /// Confirms the deletion.
        #[clap(long, takes_value = false)]
        yes: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// CSV with the votes and percentages of each slate.
    Results,
    /// CSV with the list of the voters.
    Voters,
    /// Plain text summary of all the elections.
    Summary,
}
