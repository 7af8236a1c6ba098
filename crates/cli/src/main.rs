//! BarberTime CLI - sign in to the BarberTime backend from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in with a password (or set BARBERTIME_PASSWORD)
//! bt-cli login -e ana@example.com
//!
//! # Create an account
//! bt-cli register -e ana@example.com --first-name Ana --last-name Bell --role barber
//!
//! # Passwordless sign-in
//! bt-cli otp request -e ana@example.com
//! bt-cli otp verify -e ana@example.com -c 123456
//!
//! # Who am I?
//! bt-cli whoami
//!
//! # Forget the stored credential
//! bt-cli logout
//! ```
//!
//! # Environment Variables
//!
//! - `BARBERTIME_API_URL` - Backend base URL
//! - `BARBERTIME_CREDENTIALS_PATH` - Credential file location
//! - `BARBERTIME_PASSWORD` - Password for `login` and `register`
//! - `BARBERTIME_LOG_FORMAT` - `json` for structured logs, text otherwise
//! - `RUST_LOG` - Log filter (default: `barbertime=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

use commands::{CliError, ProfileArgs};

#[derive(Parser)]
#[command(name = "bt-cli")]
#[command(author, version, about = "BarberTime sign-in tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "BARBERTIME_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log into it
    Register {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Password; omit to sign in with one-time codes only
        #[arg(short, long, env = "BARBERTIME_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Passwordless sign-in with emailed codes
    Otp {
        #[command(subcommand)]
        action: OtpAction,
    },
    /// Show the logged-in account
    Whoami,
    /// Forget the stored credential
    Logout,
}

#[derive(Subcommand)]
enum OtpAction {
    /// Email a one-time code
    Request {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Verify a code, registering the account if it is new
    Verify {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// The 6-digit code from the email
        #[arg(short, long)]
        code: String,

        #[command(flatten)]
        profile: ProfileArgs,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "barbertime=info,bt_cli=info".into());

    let json = std::env::var("BARBERTIME_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let session = commands::connect()?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&session, &email, password).await?;
        }
        Commands::Register {
            email,
            password,
            profile,
        } => commands::account::register(&session, &email, password, &profile).await?,
        Commands::Otp { action } => match action {
            OtpAction::Request { email } => commands::otp::request(&session, &email).await?,
            OtpAction::Verify {
                email,
                code,
                profile,
            } => commands::otp::verify(&session, &email, &code, &profile).await?,
        },
        Commands::Whoami => commands::account::whoami(&session).await,
        Commands::Logout => commands::account::logout(&session),
    }
    Ok(())
}
