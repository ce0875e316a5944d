use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod args;
mod urna;

fn main() {
    let args = args::Args::parse();

    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = urna::run_args(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("Error: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
