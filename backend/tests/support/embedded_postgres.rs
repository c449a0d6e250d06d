//! Migrated, seeded PostgreSQL databases for the Diesel repository suites.
//!
//! - Each context creates a uniquely named database, so suites running in
//!   parallel never share rows.
//! - The schema comes from the crate's own [`run_migrations`], so the tests
//!   also cover the migration itself.
//! - Seeding and raw inspection go through `postgres`, keeping Diesel out of
//!   the assertions.

use std::future::Future;

use helpdesk::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use tokio::runtime::Runtime;
use uuid::Uuid;

use super::format_postgres_error;
use super::pg_embed::test_cluster;

/// Directory rows mirroring the in-memory demo data. Explicit ids are
/// followed by `setval` so later `BIGSERIAL` inserts do not collide.
const SEED_SQL: &str = r"
INSERT INTO branches (id, name) VALUES (1, 'Downtown'), (2, 'Harbour');
INSERT INTO priorities (id, name) VALUES
    (1, 'Low'), (2, 'Medium'), (3, 'High'), (4, 'Urgent');
INSERT INTO users (id, name, email, role, branch_id) VALUES
    (1, 'Ada Admin', 'admin@example.com', 1, NULL),
    (2, 'Alan Agent', 'agent@example.com', 2, 1),
    (3, 'Grace Manager', 'manager@example.com', 3, NULL),
    (4, 'Barbara Branch', 'branch@example.com', 4, 1),
    (5, 'Edsger Agent', 'harbour.agent@example.com', 2, 2),
    (6, 'Idle Manager', 'idle.manager@example.com', 3, NULL);
INSERT INTO manager_agents (manager_id, agent_id) VALUES (3, 2), (3, 5);
INSERT INTO customers (id, name, branch_id) VALUES
    (1, 'Acme Repairs', 1), (2, 'Globex', 2);
INSERT INTO labels (id, name, color) VALUES
    (1, 'Warranty', '#1E90FF'), (2, 'Parts Ordered', '#FFA500');
SELECT setval('branches_id_seq', 2);
SELECT setval('priorities_id_seq', 4);
SELECT setval('users_id_seq', 6);
SELECT setval('customers_id_seq', 2);
SELECT setval('labels_id_seq', 2);
";

/// A running cluster with one migrated and seeded database.
pub struct DbContext {
    pub runtime: Runtime,
    pub pool: DbPool,
    pub database_url: String,
    _cluster: TestCluster,
}

impl DbContext {
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Run raw SQL outside Diesel.
    pub fn execute(&self, sql: &str) -> Result<(), String> {
        let mut client = self.client()?;
        client
            .batch_execute(sql)
            .map_err(|err| format_postgres_error(&err))
    }

    /// Evaluate a single `BIGINT` scalar query.
    pub fn scalar(&self, sql: &str) -> Result<i64, String> {
        let mut client = self.client()?;
        let row = client
            .query_one(sql, &[])
            .map_err(|err| format_postgres_error(&err))?;
        row.try_get(0).map_err(|err| format_postgres_error(&err))
    }

    /// Insert a bare open ticket with id `id`, created by the admin.
    pub fn seed_ticket(&self, id: i64) -> Result<(), String> {
        self.execute(&format!(
            "INSERT INTO tickets \
                 (id, tracking_number, slug, issue, created_by, created_at, updated_at) \
             VALUES ({id}, 'TKT{id:07}', 'seeded-{id}', 'Seeded {id}', 1, now(), now()); \
             SELECT setval('tickets_id_seq', (SELECT max(id) FROM tickets));"
        ))
    }

    fn client(&self) -> Result<Client, String> {
        Client::connect(&self.database_url, NoTls).map_err(|err| format_postgres_error(&err))
    }
}

fn create_database(cluster: &TestCluster) -> Result<String, String> {
    let name = format!("helpdesk_{}", Uuid::new_v4().simple());
    let admin_url = cluster.connection().database_url("postgres");
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!(r#"CREATE DATABASE "{name}""#))
        .map_err(|err| format_postgres_error(&err))?;
    Ok(cluster.connection().database_url(&name))
}

/// Start a cluster, create a fresh database, migrate and seed it, and open a
/// small pool against it.
pub fn setup_database() -> Result<DbContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database_url = create_database(&cluster)?;

    runtime
        .block_on(run_migrations(&database_url))
        .map_err(|err| err.to_string())?;
    let mut client =
        Client::connect(&database_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(SEED_SQL)
        .map_err(|err| format_postgres_error(&err))?;

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(DbContext {
        runtime,
        pool,
        database_url,
        _cluster: cluster,
    })
}
