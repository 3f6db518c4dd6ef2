//! QR Wallet CLI - top up your wallet from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{balance, codes, login, logs, setup, status, topup};

/// QR Wallet - redeem top-up codes from your terminal
#[derive(Parser)]
#[command(name = "qw", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in profile, balance and used codes
    Status {
        /// Re-read profile and balance from the server first
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the wallet balance
    Balance {
        /// Re-read the balance from the server first
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store the credentials of a signed-in student
    Login {
        /// Bearer token for the wallet API
        #[arg(long)]
        token: Option<String>,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Phone number
        #[arg(long)]
        phone: Option<String>,
        /// Balance reported at sign-in
        #[arg(long)]
        balance: Option<String>,
    },

    /// Clear the session (used codes are kept)
    Logout {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Redeem a top-up code
    #[command(group(clap::ArgGroup::new("source").args(["code", "image", "frames"])))]
    Topup {
        /// Code to redeem
        #[arg(long)]
        code: Option<String>,
        /// Image file holding the QR code
        #[arg(long)]
        image: Option<PathBuf>,
        /// Directory of images replayed as camera frames
        #[arg(long)]
        frames: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List codes redeemed on this device
    Codes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configure the wallet API
    Setup {
        /// API base URL
        #[arg(long)]
        api_url: Option<String>,
        /// Value of the `lang` header
        #[arg(long)]
        lang: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Delay between camera frames in milliseconds
        #[arg(long)]
        frame_interval: Option<u64>,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::Balance { .. } => "balance",
            Commands::Login { .. } => "login",
            Commands::Logout { .. } => "logout",
            Commands::Topup { .. } => "topup",
            Commands::Codes { .. } => "codes",
            Commands::Setup { .. } => "setup",
            Commands::Logs { .. } => "logs",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let logger = commands::get_logger();
    if let Some(l) = &logger {
        let _ = l.log_command(cli.command.name());
    }

    match cli.command {
        Commands::Status { refresh, json } => status::run(logger, refresh, json).await,
        Commands::Balance { refresh, json } => balance::run(logger, refresh, json).await,
        Commands::Login {
            token,
            name,
            phone,
            balance,
        } => login::run(logger, token, name, phone, balance),
        Commands::Logout { force } => login::run_logout(logger, force),
        Commands::Topup {
            code,
            image,
            frames,
            json,
        } => topup::run(logger, code, image, frames, json).await,
        Commands::Codes { json } => codes::run(logger, json),
        Commands::Setup {
            api_url,
            lang,
            timeout,
            frame_interval,
        } => setup::run(api_url, lang, timeout, frame_interval),
        Commands::Logs { command } => logs::run(logger, command),
    }
}
