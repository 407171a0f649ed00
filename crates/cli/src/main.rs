//! StyleCore CLI - Database migrations and tenant provisioning.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! sc-cli migrate
//!
//! # Create a tenant with the default email (<slug>@example.com)
//! sc-cli tenant create "Acme Salon"
//!
//! # Create a tenant with an explicit contact email
//! sc-cli tenant create "Acme Salon" owner@acme.test
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `tenant create` - Provision a tenant and its default domain

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "StyleCore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
}

#[derive(Subcommand)]
enum TenantAction {
    /// Create a new tenant with a `<slug>.localhost` domain
    Create {
        /// Display name; the tenant id is its slug
        name: String,

        /// Contact email (defaults to `<slug>@example.com`)
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Tenant { action } => match action {
            TenantAction::Create { name, email } => {
                commands::tenant::create(&name, email.as_deref()).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn tenant_create_takes_optional_email() {
        let cli = Cli::try_parse_from(["sc-cli", "tenant", "create", "Acme Salon"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Tenant {
                action: TenantAction::Create { email: None, .. }
            })
        ));

        let cli = Cli::try_parse_from(["sc-cli", "tenant", "create", "Acme", "a@b.test"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Tenant {
                action: TenantAction::Create { email: Some(_), .. }
            })
        ));
    }
}
