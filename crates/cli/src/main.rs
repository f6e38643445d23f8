//! Candela CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run catalog and session migrations
//! candela-cli migrate
//!
//! # Load the demo catalog into an empty database
//! candela-cli seed
//!
//! # Create an admin account
//! CANDELA_ADMIN_PASSWORD=... candela-cli user create -e admin@example.com -n "Admin"
//!
//! # Grant the admin role to an existing account
//! candela-cli user promote -e cliente@example.com
//! ```
//!
//! # Environment Variables
//!
//! - `CANDELA_DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "candela-cli")]
#[command(author, version, about = "Candela CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (catalog schema and session table)
    Migrate,
    /// Seed demo categories, products and store settings
    Seed,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new admin account
    Create {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 6 characters)
        #[arg(short, long, env = "CANDELA_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Grant the admin role to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
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
    let pool = commands::connect().await?;
    match cli.command {
        Commands::Migrate => commands::migrate::run(&pool).await?,
        Commands::Seed => commands::seed::run(&pool).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                password,
            } => {
                commands::user::create_admin(&pool, &email, &name, &password).await?;
            }
            UserAction::Promote { email } => commands::user::promote(&pool, &email).await?,
        },
    }
    Ok(())
}
