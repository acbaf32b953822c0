//! Shared helpers for `PostgreSQL` integration tests.

use std::sync::Arc;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use parley::clock::system_clock;
use parley::tenancy::{
    adapters::memory::InMemoryWorkflowRegistry,
    domain::{CallerIdentity, TenantId},
    services::{AgentRegistryService, RegisterAgentRequest},
};
use parley::thread::{adapters::postgres::PostgresThreadRepository, services::ThreadRegistryService};
use uuid::Uuid;

use super::cluster::shared_cluster;

/// Environment variable naming an external server to use instead of the
/// embedded cluster.
pub const DATABASE_URL_VAR: &str = "PARLEY_TEST_DATABASE_URL";

/// Schema applied to every test database.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_parley_core/up.sql");

/// Connection pool shared by all adapters under test.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// A migrated database that is dropped with this value.
pub struct TestDatabase {
    pool: Option<PgPool>,
    admin_url: String,
    name: String,
}

impl TestDatabase {
    /// Returns a handle to the database pool.
    ///
    /// # Errors
    ///
    /// Returns an error after the database has been released.
    pub fn pool(&self) -> Result<PgPool, eyre::Report> {
        self.pool
            .clone()
            .ok_or_else(|| eyre::eyre!("test database already released"))
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        drop(self.pool.take());
        if let Ok(mut admin) = PgConnection::establish(&self.admin_url) {
            let statement = format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.name);
            if let Err(err) = diesel::sql_query(statement).execute(&mut admin) {
                tracing::warn!(database = %self.name, error = %err, "failed to drop test database");
            }
        }
    }
}

/// Returns the admin URL of the server tests run against.
///
/// `PARLEY_TEST_DATABASE_URL` selects an external server; otherwise the
/// shared embedded cluster is started on first use.
///
/// # Errors
///
/// Returns an error when the embedded cluster cannot start.
pub fn admin_url() -> Result<String, eyre::Report> {
    match std::env::var(DATABASE_URL_VAR) {
        Ok(url) => Ok(url),
        Err(_) => Ok(shared_cluster()?.database_url("postgres")),
    }
}

/// Creates and migrates a fresh database.
///
/// # Errors
///
/// Returns an error when no server is reachable or the setup fails.
pub fn database() -> Result<TestDatabase, eyre::Report> {
    let admin_url = admin_url()?;
    let (server, _) = admin_url
        .rsplit_once('/')
        .ok_or_else(|| eyre::eyre!("admin URL {admin_url} has no database path"))?;
    let name = format!("parley_test_{}", Uuid::new_v4().simple());

    let mut admin = PgConnection::establish(&admin_url)?;
    diesel::sql_query(format!("CREATE DATABASE {name}")).execute(&mut admin)?;

    let database_url = format!("{server}/{name}");
    let mut database = TestDatabase {
        pool: None,
        admin_url: admin_url.clone(),
        name,
    };
    let mut connection = PgConnection::establish(&database_url)?;
    connection.batch_execute(CREATE_SCHEMA_SQL)?;
    let pool = Pool::builder()
        .max_size(4)
        .build(ConnectionManager::<PgConnection>::new(database_url))?;

    database.pool = Some(pool);
    Ok(database)
}

/// Returns a caller for `tenant`.
///
/// # Errors
///
/// Returns an error for a blank tenant.
pub fn caller(tenant: &str) -> Result<CallerIdentity, eyre::Report> {
    Ok(CallerIdentity::new(TenantId::new(tenant)?))
}

/// Builds a thread registry over `pool` with the `Support:Conversational`
/// workflow registered for `acme`.
///
/// # Errors
///
/// Returns an error when agent registration fails.
pub async fn thread_registry(pool: PgPool) -> Result<ThreadRegistryService, eyre::Report> {
    let clock = system_clock();
    let workflows = Arc::new(InMemoryWorkflowRegistry::new());
    AgentRegistryService::new(workflows.clone(), clock.clone())
        .register(
            RegisterAgentRequest::for_tenant("acme", "Support", "1.0.0")
                .with_built_in("Conversational"),
        )
        .await?;
    Ok(ThreadRegistryService::new(
        Arc::new(PostgresThreadRepository::new(pool)),
        workflows,
        clock,
    ))
}
