use crate::report::{run_export, run_import, run_reminders, ExportArgs, ImportArgs, RemindersArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use job_tracker::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "job-tracker",
    about = "Track job applications, follow-ups and certification expiry",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the reminders due today and certification states
    Reminders(RemindersArgs),
    /// Export the tracker as CSV or JSON
    Export(ExportArgs),
    /// Merge a CSV or JSON file into the data file
    Import(ImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured data file
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Reminders(args) => run_reminders(args),
        Command::Export(args) => run_export(args),
        Command::Import(args) => run_import(args),
    }
}
