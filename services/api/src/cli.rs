use crate::report::{run_expiry_report, ExpiryReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use pmo::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "PMO Dashboard",
    about = "Serve the PMO dashboard API or inspect accreditation expiry from the command line",
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
    /// Accreditation document expiry tooling
    Expiry {
        #[command(subcommand)]
        command: ExpiryCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ExpiryCommand {
    /// Print every document expiring within the alert window
    Report(ExpiryReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Expiry {
            command: ExpiryCommand::Report(args),
        } => run_expiry_report(args),
    }
}
