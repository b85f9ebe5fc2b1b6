//! Backend capability descriptions.
//!
//! Every dialect-divergent piece of SQL lives here: placeholder style, the
//! native wait primitive, the row-lock hint, identity-column retrieval, the
//! create-database pre-step and the idempotent DDL. The scenario set and the
//! schema initializer are written once against this description; the driver
//! crates only adapt pool and row types.

use crate::types::{BackendKind, SqlFamily};
use std::time::Duration;

/// Fixed category set of the reference dataset.
pub const CATEGORIES: [&str; 5] = ["electronics", "books", "home", "toys", "sports"];

/// Category used by the AggregateRead scenario.
pub const AGGREGATE_CATEGORY: &str = "electronics";

/// Sentinel key claimed by the seeding transaction (see `seed_state` DDL).
pub const SEED_MARKER: &str = "products";

/// How a backend hands back the identity column of a fresh insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRetrieval {
    /// `INSERT .. RETURNING id`: the insert itself yields the id row.
    InsertReturning,
    /// The driver reports `LAST_INSERT_ID()` on the execute result.
    LastInsertId,
}

/// Capability description for one backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlDialect {
    kind: BackendKind,
}

impl SqlDialect {
    pub fn for_kind(kind: BackendKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn family(&self) -> SqlFamily {
        self.kind.family()
    }

    /// Parameter placeholder for the n-th bind (1-based).
    pub fn placeholder(&self, n: usize) -> String {
        match self.family() {
            SqlFamily::Postgres => format!("${}", n),
            SqlFamily::Mysql => "?".to_string(),
        }
    }

    pub fn identity_retrieval(&self) -> IdentityRetrieval {
        match self.family() {
            SqlFamily::Postgres => IdentityRetrieval::InsertReturning,
            SqlFamily::Mysql => IdentityRetrieval::LastInsertId,
        }
    }

    /// Native server-side wait primitive; binds the duration in seconds as
    /// its single parameter.
    pub fn native_wait_sql(&self) -> String {
        match self.family() {
            SqlFamily::Postgres => format!("SELECT pg_sleep({})", self.placeholder(1)),
            SqlFamily::Mysql => format!("SELECT SLEEP({})", self.placeholder(1)),
        }
    }

    /// Seconds value bound into [`Self::native_wait_sql`].
    pub fn wait_seconds(wait: Duration) -> f64 {
        wait.as_secs_f64()
    }

    pub fn insert_visit_sql(&self) -> &'static str {
        match self.family() {
            SqlFamily::Postgres => "INSERT INTO visits DEFAULT VALUES RETURNING id",
            SqlFamily::Mysql => "INSERT INTO visits () VALUES ()",
        }
    }

    /// Most-recent-first page of the visit log; binds the limit.
    pub fn recent_visits_sql(&self) -> String {
        format!(
            "SELECT id, visit_time FROM visits ORDER BY visit_time DESC, id DESC LIMIT {}",
            self.placeholder(1)
        )
    }

    /// Count aggregate over the reference dataset; binds the category.
    pub fn count_category_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM products WHERE category = {}",
            self.placeholder(1)
        )
    }

    /// Locking read used by the Contention blocker; binds the row id.
    pub fn lock_row_sql(&self) -> String {
        format!(
            "SELECT price FROM products WHERE id = {} FOR UPDATE",
            self.placeholder(1)
        )
    }

    /// Plain read issued by the Contention blocked session; binds the row id.
    pub fn read_price_sql(&self) -> String {
        format!("SELECT price FROM products WHERE id = {}", self.placeholder(1))
    }

    pub fn count_products_sql(&self) -> &'static str {
        "SELECT COUNT(*) FROM products"
    }

    /// Idempotent DDL, in application order.
    pub fn schema_sql(&self) -> [&'static str; 3] {
        match self.family() {
            SqlFamily::Postgres => [
                "CREATE TABLE IF NOT EXISTS visits (\
                 id BIGSERIAL PRIMARY KEY, \
                 visit_time TIMESTAMPTZ NOT NULL DEFAULT now())",
                "CREATE TABLE IF NOT EXISTS products (\
                 id BIGSERIAL PRIMARY KEY, \
                 name VARCHAR(100) NOT NULL, \
                 category VARCHAR(50) NOT NULL, \
                 price DECIMAL(10,2) NOT NULL)",
                "CREATE TABLE IF NOT EXISTS seed_state (\
                 table_name VARCHAR(64) PRIMARY KEY, \
                 seeded_at TIMESTAMPTZ NOT NULL DEFAULT now())",
            ],
            SqlFamily::Mysql => [
                "CREATE TABLE IF NOT EXISTS visits (\
                 id BIGINT AUTO_INCREMENT PRIMARY KEY, \
                 visit_time TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6))",
                "CREATE TABLE IF NOT EXISTS products (\
                 id BIGINT AUTO_INCREMENT PRIMARY KEY, \
                 name VARCHAR(100) NOT NULL, \
                 category VARCHAR(50) NOT NULL, \
                 price DECIMAL(10,2) NOT NULL)",
                "CREATE TABLE IF NOT EXISTS seed_state (\
                 table_name VARCHAR(64) PRIMARY KEY, \
                 seeded_at TIMESTAMP(6) NOT NULL DEFAULT CURRENT_TIMESTAMP(6))",
            ],
        }
    }

    /// Claim the seed sentinel. Affects one row when this transaction wins,
    /// zero when the marker already exists (committed or in flight).
    pub fn claim_seed_marker_sql(&self) -> String {
        match self.family() {
            SqlFamily::Postgres => format!(
                "INSERT INTO seed_state (table_name) VALUES ('{}') \
                 ON CONFLICT (table_name) DO NOTHING",
                SEED_MARKER
            ),
            SqlFamily::Mysql => format!(
                "INSERT IGNORE INTO seed_state (table_name) VALUES ('{}')",
                SEED_MARKER
            ),
        }
    }

    /// Administrative database for the create-database pre-step, if the kind
    /// needs a default database to connect to at all.
    pub fn admin_database(&self) -> Option<&'static str> {
        match self.kind {
            BackendKind::Postgres => Some("postgres"),
            BackendKind::Cockroach => Some("defaultdb"),
            // The MySQL wire protocol accepts connections with no default
            // schema selected.
            BackendKind::Mysql | BackendKind::Mariadb => None,
        }
    }

    /// Whether `CREATE DATABASE` supports an `IF NOT EXISTS` guard. Stock
    /// Postgres does not; there the pre-step must check `pg_database` first.
    pub fn create_database_is_idempotent(&self) -> bool {
        !matches!(self.kind, BackendKind::Postgres)
    }

    /// Existence probe for the target database; binds the database name.
    pub fn database_exists_sql(&self) -> String {
        match self.family() {
            SqlFamily::Postgres => format!(
                "SELECT 1 FROM pg_database WHERE datname = {}",
                self.placeholder(1)
            ),
            SqlFamily::Mysql => format!(
                "SELECT 1 FROM information_schema.schemata WHERE schema_name = {}",
                self.placeholder(1)
            ),
        }
    }

    /// Create the target database. `CREATE DATABASE` does not accept bound
    /// parameters, so the identifier is quoted here and nowhere else.
    pub fn create_database_sql(&self, database: &str) -> String {
        match self.kind {
            BackendKind::Postgres => {
                format!("CREATE DATABASE {}", quote_ident(database, '"'))
            }
            BackendKind::Cockroach => {
                format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(database, '"'))
            }
            BackendKind::Mysql | BackendKind::Mariadb => {
                format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(database, '`'))
            }
        }
    }
}

/// Quote an SQL identifier, doubling any embedded quote character.
fn quote_ident(ident: &str, quote: char) -> String {
    let mut out = String::with_capacity(ident.len() + 2);
    out.push(quote);
    for ch in ident.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
    out
}
