use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "devicetalk")]
#[command(about = "Natural-language Q&A over one device's live telemetry", long_about = None)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP service.
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
        /// Listen port. Defaults to $PORT, then 5000.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Answer a single question on the command line and exit.
    Ask { question: String },
}
