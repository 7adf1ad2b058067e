//! Salon CLI - migrations, role administration, and staff sign-in.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! salon migrate
//!
//! # Show the permission matrix
//! salon roles
//! salon roles --role receptionist
//!
//! # Check a single permission
//! salon check staff inventory view
//!
//! # Assign a role
//! salon staff grant --user-id 6f1c... --role manager
//!
//! # Sign in, inspect, and keep a session fresh
//! salon login --email ada@example.com
//! salon whoami
//! salon watch
//! salon logout
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;

use salon_core::{Role, UserId};
use salon_portal::telemetry;

mod commands;

#[derive(Parser)]
#[command(name = "salon")]
#[command(author, version, about = "Salon portal CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Show what each role may do
    Roles {
        /// Only show this role
        #[arg(short, long)]
        role: Option<Role>,
    },
    /// Check one (role, area, action) triple
    Check {
        role: String,
        area: String,
        action: String,
    },
    /// Manage staff role assignments
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Sign in to the hosted auth service
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prefer the environment variable over the flag)
        #[arg(short, long, env = "SALON_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and clear local state
    Logout,
    /// Show the signed-in user and their role
    Whoami,
    /// Keep the session fresh and print realtime invalidations
    Watch,
}

#[derive(Subcommand)]
enum StaffAction {
    /// Assign a role to a login, replacing any previous role
    Grant {
        #[arg(short, long)]
        user_id: UserId,

        #[arg(short, long)]
        role: Role,
    },
    /// List every role assignment
    List,
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing("salon_cli=info,salon_portal=info", false);

    let cli = Cli::parse();

    let result: Result<(), commands::CliError> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Roles { role } => commands::roles::print_matrix(role),
        Commands::Check { role, area, action } => {
            if !commands::roles::check(&role, &area, &action) {
                std::process::exit(2);
            }
        }
        Commands::Staff { action } => match action {
            StaffAction::Grant { user_id, role } => commands::staff::grant(user_id, role).await?,
            StaffAction::List => commands::staff::list().await?,
        },
        Commands::Login { email, password } => {
            commands::session::login(&email, &SecretString::from(password)).await?;
        }
        Commands::Logout => commands::session::logout().await?,
        Commands::Whoami => commands::session::whoami().await?,
        Commands::Watch => commands::watch::run().await?,
    }
    Ok(())
}
