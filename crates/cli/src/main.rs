//! Baby Cash CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bc-cli migrate
//!
//! # Create an admin user
//! bc-cli admin create -e admin@babycash.com -f Ana -l Gómez -p 'cambiar123'
//!
//! # Promote an existing account
//! bc-cli admin promote -e ana@babycash.com
//!
//! # Load the demo catalog
//! bc-cli seed --file seed/catalog.yaml
//!
//! # Run maintenance jobs on demand
//! bc-cli jobs expire-points
//! bc-cli jobs cleanup-tokens
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bc-cli")]
#[command(author, version, about = "Baby Cash CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Load products, testimonials and contact info
    Seed {
        /// YAML file with products and testimonials
        #[arg(short, long, default_value = "seed/catalog.yaml")]
        file: String,
    },
    /// Run a maintenance job once
    Jobs {
        #[command(subcommand)]
        job: Job,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Last name
        #[arg(short, long)]
        last_name: String,

        /// Initial password (6-50 characters, letters and digits)
        #[arg(short, long)]
        password: String,
    },
    /// Give an existing account the ADMIN role
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum Job {
    /// Expire loyalty points past their expiry date
    ExpirePoints,
    /// Delete refresh tokens that died more than 30 days ago
    CleanupTokens,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                first_name,
                last_name,
                password,
            } => {
                commands::admin::create_user(&email, &first_name, &last_name, &password).await?;
            }
            AdminAction::Promote { email } => commands::admin::promote(&email).await?,
        },
        Commands::Seed { file } => commands::seed::run(&file).await?,
        Commands::Jobs { job } => match job {
            Job::ExpirePoints => commands::jobs::expire_points().await?,
            Job::CleanupTokens => commands::jobs::cleanup_tokens().await?,
        },
    }
    Ok(())
}
