use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream;
use serde_json::Value;
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    postgres::{PgPoolOptions, PgRow},
};

use crate::{
    BatchWrite, CommitReceipt, LedgerEntry, LedgerError, Result, Selector, Version, WriteBatch,
    selector::{Clause, Condition},
    store::{EntryStream, Ledger, check_range},
};

/// Advisory lock key held by every committing transaction.
const COMMIT_LOCK: i64 = 0x6c65_6467_6572;

/// PostgreSQL-backed ledger implementation.
///
/// Keys live in `ledger_state`; the JSON form of each value is kept next to
/// the raw bytes so selector queries can be answered with JSONB operators.
/// Commits are serialised with a transaction-level advisory lock, which
/// makes read-set validation and height assignment race free.
#[derive(Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a pool of up to `max_connections`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_entry(row: PgRow) -> Result<LedgerEntry> {
        Ok(LedgerEntry {
            key: row.try_get("key")?,
            value: row.try_get("value")?,
            version: Version::new(row.try_get("version")?),
        })
    }

    fn entries_stream(rows: Vec<PgRow>) -> Result<EntryStream> {
        let entries = rows
            .into_iter()
            .map(Self::row_to_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::pin(stream::iter(entries.into_iter().map(Ok))))
    }
}

#[async_trait]
impl Ledger for PostgresLedger {
    async fn get(&self, key: &str) -> Result<Option<LedgerEntry>> {
        let row: Option<PgRow> =
            sqlx::query("SELECT key, value, version FROM ledger_state WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_entry).transpose()
    }

    async fn range_scan(&self, start: &str, end: &str) -> Result<EntryStream> {
        check_range(start, end)?;

        let rows = sqlx::query(
            r#"
            SELECT key, value, version
            FROM ledger_state
            WHERE key >= $1 AND ($2 = '' OR key < $2)
            ORDER BY key ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Self::entries_stream(rows)
    }

    async fn rich_query(&self, query: &str) -> Result<EntryStream> {
        let selector = Selector::parse(query)?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT key, value, version FROM ledger_state WHERE doc IS NOT NULL AND ",
        );
        push_selector(&mut builder, &selector);
        builder.push(" ORDER BY key ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        Self::entries_stream(rows)
    }

    #[tracing::instrument(skip(self, batch), fields(tx_ref = %batch.tx_ref(), writes = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt> {
        batch.validate()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(COMMIT_LOCK)
            .execute(&mut *tx)
            .await?;

        // Validate the read set
        let read_keys: Vec<String> = batch.reads().map(|(k, _)| k.to_string()).collect();
        if !read_keys.is_empty() {
            let rows = sqlx::query("SELECT key, version FROM ledger_state WHERE key = ANY($1)")
                .bind(&read_keys)
                .fetch_all(&mut *tx)
                .await?;

            let mut current = HashMap::with_capacity(rows.len());
            for row in rows {
                let key: String = row.try_get("key")?;
                let version: i64 = row.try_get("version")?;
                current.insert(key, Version::new(version));
            }

            for (key, expected) in batch.reads() {
                let actual = current.get(key).copied();
                if actual != expected {
                    metrics::counter!("ledger_commit_conflicts_total").increment(1);
                    tracing::debug!(key, ?expected, ?actual, "Read set invalidated");
                    return Err(LedgerError::Conflict {
                        key: key.to_string(),
                        expected,
                        actual,
                    });
                }
            }
        }

        let row = sqlx::query(
            r#"
            INSERT INTO ledger_commits (height, tx_ref, keys_written)
            SELECT COALESCE(MAX(height), 0) + 1, $1, $2 FROM ledger_commits
            RETURNING height, committed_at
            "#,
        )
        .bind(batch.tx_ref().as_uuid())
        .bind(batch.len() as i32)
        .fetch_one(&mut *tx)
        .await?;
        let height = Version::new(row.try_get("height")?);
        let committed_at: DateTime<Utc> = row.try_get("committed_at")?;

        for (key, write) in batch.writes() {
            match write {
                BatchWrite::Put(value) => {
                    let doc = serde_json::from_slice::<Value>(value)
                        .ok()
                        .filter(Value::is_object);
                    sqlx::query(
                        r#"
                        INSERT INTO ledger_state (key, value, doc, version)
                        VALUES ($1, $2, $3, $4)
                        ON CONFLICT (key) DO UPDATE SET
                            value = EXCLUDED.value,
                            doc = EXCLUDED.doc,
                            version = EXCLUDED.version
                        "#,
                    )
                    .bind(key)
                    .bind(value)
                    .bind(doc)
                    .bind(height.as_i64())
                    .execute(&mut *tx)
                    .await?;
                }
                BatchWrite::Delete => {
                    sqlx::query("DELETE FROM ledger_state WHERE key = $1")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;

        metrics::counter!("ledger_commits_total").increment(1);
        metrics::counter!("ledger_keys_written_total").increment(batch.len() as u64);

        Ok(CommitReceipt {
            tx_ref: batch.tx_ref(),
            height,
            keys_written: batch.len(),
            committed_at,
        })
    }

    async fn height(&self) -> Result<Version> {
        let height: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(height), 0) FROM ledger_commits")
            .fetch_one(&self.pool)
            .await?;
        Ok(Version::new(height))
    }
}

/// Translates a selector into a boolean SQL expression over `doc`.
fn push_selector(builder: &mut QueryBuilder<'_, Postgres>, selector: &Selector) {
    if selector.clauses().is_empty() {
        builder.push("TRUE");
        return;
    }

    builder.push("(");
    for (i, clause) in selector.clauses().iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        match clause {
            Clause::Field { path, conditions } => {
                push_conditions(builder, path, conditions);
            }
            Clause::Or(alternatives) => push_group(builder, alternatives, " OR ", "FALSE"),
            Clause::And(parts) => push_group(builder, parts, " AND ", "TRUE"),
        }
    }
    builder.push(")");
}

fn push_group(
    builder: &mut QueryBuilder<'_, Postgres>,
    selectors: &[Selector],
    joiner: &str,
    empty: &str,
) {
    if selectors.is_empty() {
        builder.push(empty);
        return;
    }
    builder.push("(");
    for (i, selector) in selectors.iter().enumerate() {
        if i > 0 {
            builder.push(joiner);
        }
        push_selector(builder, selector);
    }
    builder.push(")");
}

fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, path: &str, conditions: &[Condition]) {
    let segments: Vec<String> = path.split('.').map(str::to_string).collect();

    builder.push("(");
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        match condition {
            Condition::Eq(value) => {
                builder.push("doc #> ");
                builder.push_bind(segments.clone());
                builder.push(" = ");
                builder.push_bind(value.clone());
            }
            Condition::Gte(bound) => push_ordering(builder, &segments, ">=", bound),
            Condition::Lte(bound) => push_ordering(builder, &segments, "<=", bound),
            Condition::Regex(re) => {
                builder.push("(jsonb_typeof(doc #> ");
                builder.push_bind(segments.clone());
                builder.push(") = 'string' AND doc #>> ");
                builder.push_bind(segments.clone());
                builder.push(" ~ ");
                builder.push_bind(re.as_str().to_string());
                builder.push(")");
            }
        }
    }
    builder.push(")");
}

/// Range comparisons only hold between values of the same JSON type.
fn push_ordering(
    builder: &mut QueryBuilder<'_, Postgres>,
    segments: &[String],
    op: &str,
    bound: &Value,
) {
    let json_type = match bound {
        Value::Number(_) => "number",
        Value::String(_) => "string",
        _ => {
            builder.push("FALSE");
            return;
        }
    };

    builder.push("(jsonb_typeof(doc #> ");
    builder.push_bind(segments.to_vec());
    builder.push(") = ");
    builder.push_bind(json_type);
    builder.push(" AND doc #> ");
    builder.push_bind(segments.to_vec());
    builder.push(" ");
    builder.push(op);
    builder.push(" ");
    builder.push_bind(bound.clone());
    builder.push(")");
}
