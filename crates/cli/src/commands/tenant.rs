//! Tenant provisioning.
//!
//! # Usage
//!
//! ```bash
//! sc-cli tenant create "Acme Salon"
//! sc-cli tenant create "Acme Salon" owner@acme.test
//! ```
//!
//! # Environment Variables
//!
//! - `STYLECORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use stylecore_core::{BlueprintError, TenantBlueprint};
use stylecore_web::config::{ConfigError, get_database_url};
use stylecore_web::db::{self, PgStore, RepositoryError, TenantStore};
use stylecore_web::models::{Domain, Tenant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blueprint(#[from] BlueprintError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Tenant already exists: {0}")]
    TenantExists(String),

    #[error("Domain already in use: {0}")]
    DomainExists(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

/// Create a tenant named `name` with its default `<slug>.localhost` domain.
pub async fn create(name: &str, email: Option<&str>) -> Result<(), TenantError> {
    dotenvy::dotenv().ok();

    let blueprint = TenantBlueprint::new(name, email)?;
    let database_url = get_database_url("STYLECORE_DATABASE_URL")?;

    tracing::info!("Connecting to database...");
    let store = PgStore::new(db::create_pool(&database_url).await?);

    tracing::info!(tenant_id = %blueprint.id, "Creating tenant");
    let (tenant, domain) = store
        .create_tenant(&blueprint)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(field) if field == "domain" => {
                TenantError::DomainExists(blueprint.domain.clone())
            }
            RepositoryError::Conflict(_) => TenantError::TenantExists(blueprint.id.to_string()),
            other => TenantError::Repository(other),
        })?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", summary(&tenant, &domain));
    }
    Ok(())
}

fn summary(tenant: &Tenant, domain: &Domain) -> String {
    format!(
        "Tenant '{}' created\n  id:     {}\n  email:  {}\n  domain: {}\n  url:    http://{}:8000",
        tenant.name, tenant.id, tenant.email, domain.domain, domain.domain
    )
}
