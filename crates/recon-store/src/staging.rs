//! SQLite staging store
//!
//! Both sides of a job are bulk-loaded into a scratch SQLite database so
//! matching and aggregation run as SQL instead of in application memory.
//! The store is throwaway: WAL journaling with synchronous commits disabled,
//! one file per job, deleted with the scratch space.
//!
//! Rates are stored as TEXT so they round-trip exactly through `Decimal`;
//! SQLite coerces them to REAL inside the aggregate expressions, which only
//! feed 2-decimal totals.

use futures::stream::BoxStream;
use recon_core::models::CanonicalRow;
use recon_core::{ReconError, ReconResult};
use rust_decimal::Decimal;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Which side of the reconciliation a row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Staging table for this side
    pub fn table(&self) -> &'static str {
        match self {
            Side::A => "records_a",
            Side::B => "records_b",
        }
    }

    /// Matched-id table for this side
    pub fn match_table(&self) -> &'static str {
        match self {
            Side::A => "matched_a_ids",
            Side::B => "matched_b_ids",
        }
    }

    /// Short label used in logs and limit errors
    pub fn label(&self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

/// One staged row, as read back from the store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StagedRow {
    pub id: i64,
    pub a_number: String,
    pub b_number: String,
    pub seize_time: Option<i64>,
    pub answer_time: Option<i64>,
    pub end_time: Option<i64>,
    pub billed_duration: i64,
    pub rate: String,
    pub lrn: String,
    pub raw_index: i64,
}

impl StagedRow {
    /// Exact per-minute rate
    pub fn rate_value(&self) -> Decimal {
        parse_stored_rate(&self.rate)
    }
}

/// One candidate pair from the matcher's cursor
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CandidatePair {
    pub a_id: i64,
    pub b_id: i64,
    pub a_number: String,
    pub b_number: String,
    pub seize_a: Option<i64>,
    pub seize_b: Option<i64>,
    pub duration_a: i64,
    pub duration_b: i64,
    pub rate_a: String,
    pub rate_b: String,
    pub lrn_a: String,
    pub lrn_b: String,
    pub index_a: i64,
    pub index_b: i64,
}

impl CandidatePair {
    pub fn rate_a_value(&self) -> Decimal {
        parse_stored_rate(&self.rate_a)
    }

    pub fn rate_b_value(&self) -> Decimal {
        parse_stored_rate(&self.rate_b)
    }
}

/// One hung-call exemplar row with its cluster size
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HungExemplar {
    pub a_number: String,
    pub b_number: String,
    pub seize_time: Option<i64>,
    pub billed_duration: i64,
    pub rate: String,
    pub lrn: String,
    pub raw_index: i64,
    pub cluster_size: i64,
}

impl HungExemplar {
    pub fn rate_value(&self) -> Decimal {
        parse_stored_rate(&self.rate)
    }
}

/// SQL aggregates over one whole side
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SideTotals {
    pub total_records: i64,
    /// 6-second increment billing total, REAL from SQLite
    pub total_billed: f64,
    pub total_seconds: i64,
    pub zero_duration: i64,
}

/// Rates come back exactly as they were written
fn parse_stored_rate(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap_or(Decimal::ZERO)
}

const CREATE_RECORDS_TABLE: &str = r#"
    CREATE TABLE {table} (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        a_number TEXT NOT NULL,
        b_number TEXT NOT NULL,
        seize_time INTEGER,
        answer_time INTEGER,
        end_time INTEGER,
        billed_duration INTEGER NOT NULL,
        rate TEXT NOT NULL,
        lrn TEXT NOT NULL,
        raw_index INTEGER NOT NULL
    )
"#;

/// Candidate join: equal numbers on both legs, seize times within tolerance,
/// cheapest first. The trailing id pair makes ties deterministic.
const CANDIDATES_SQL: &str = r#"
    SELECT a.id AS a_id, b.id AS b_id,
           a.a_number AS a_number, a.b_number AS b_number,
           a.seize_time AS seize_a, b.seize_time AS seize_b,
           a.billed_duration AS duration_a, b.billed_duration AS duration_b,
           a.rate AS rate_a, b.rate AS rate_b,
           a.lrn AS lrn_a, b.lrn AS lrn_b,
           a.raw_index AS index_a, b.raw_index AS index_b
    FROM records_a a
    JOIN records_b b
      ON a.a_number = b.a_number AND a.b_number = b.b_number
    WHERE ABS(COALESCE(a.seize_time, 0) - COALESCE(b.seize_time, 0)) <= ?1
    ORDER BY ABS(COALESCE(a.seize_time, 0) - COALESCE(b.seize_time, 0)) ASC,
             ABS(a.billed_duration - b.billed_duration) ASC,
             a.id ASC, b.id ASC
"#;

const UNMATCHED_A_SQL: &str = r#"
    SELECT r.id, r.a_number, r.b_number, r.seize_time, r.answer_time, r.end_time,
           r.billed_duration, r.rate, r.lrn, r.raw_index
    FROM records_a r
    WHERE NOT EXISTS (SELECT 1 FROM matched_a_ids m WHERE m.id = r.id)
    ORDER BY r.id
"#;

const UNMATCHED_B_SQL: &str = r#"
    SELECT r.id, r.a_number, r.b_number, r.seize_time, r.answer_time, r.end_time,
           r.billed_duration, r.rate, r.lrn, r.raw_index
    FROM records_b r
    WHERE NOT EXISTS (SELECT 1 FROM matched_b_ids m WHERE m.id = r.id)
    ORDER BY r.id
"#;

/// The staging store for one job
pub struct StagingStore {
    pool: SqlitePool,
}

impl StagingStore {
    /// Open (create) the staging database and both record tables
    pub async fn open(path: &Path) -> ReconResult<StagingStore> {
        debug!("Opening staging store at {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Off);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| ReconError::Store(format!("failed to open staging store: {}", e)))?;

        let store = StagingStore { pool };
        for side in [Side::A, Side::B] {
            let sql = CREATE_RECORDS_TABLE.replace("{table}", side.table());
            sqlx::query(&sql)
                .execute(&store.pool)
                .await
                .map_err(|e| ReconError::Store(format!("failed to create {}: {}", side.table(), e)))?;
        }

        Ok(store)
    }

    /// Insert one batch of canonical rows inside a single transaction.
    ///
    /// Callers feed batches of at most the configured insert size.
    pub async fn insert_batch(&self, side: Side, rows: &[CanonicalRow]) -> ReconResult<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let sql = format!(
            r#"
            INSERT INTO {} (a_number, b_number, seize_time, answer_time, end_time,
                            billed_duration, rate, lrn, raw_index)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            side.table()
        );

        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(&sql)
                .bind(&row.a_number)
                .bind(&row.b_number)
                .bind(row.seize_time)
                .bind(row.answer_time)
                .bind(row.end_time)
                .bind(row.billed_duration)
                .bind(row.rate.to_string())
                .bind(&row.lrn)
                .bind(row.raw_index)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Build secondary indexes; call once, after both sides are loaded
    pub async fn create_indexes(&self) -> ReconResult<()> {
        info!("Building staging indexes");
        for side in [Side::A, Side::B] {
            let table = side.table();
            let composite = format!(
                "CREATE INDEX idx_{t}_numbers ON {t} (a_number, b_number)",
                t = table
            );
            let seize = format!("CREATE INDEX idx_{t}_seize ON {t} (seize_time)", t = table);
            sqlx::query(&composite).execute(&self.pool).await?;
            sqlx::query(&seize).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Create the matched-id tables that drive the anti-joins
    pub async fn create_match_tables(&self) -> ReconResult<()> {
        for side in [Side::A, Side::B] {
            let sql = format!("CREATE TABLE {} (id INTEGER PRIMARY KEY)", side.match_table());
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Record accepted pairs into both matched-id tables
    pub async fn insert_matched_ids(&self, pairs: &[(i64, i64)]) -> ReconResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for (a_id, b_id) in pairs {
            sqlx::query("INSERT INTO matched_a_ids (id) VALUES (?1)")
                .bind(a_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO matched_b_ids (id) VALUES (?1)")
                .bind(b_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Lazy cursor over match candidates, cheapest first.
    ///
    /// The join under equal number pairs can dwarf either input; consuming
    /// it through this cursor is what keeps memory flat.
    pub fn candidates(
        &self,
        tolerance_secs: i64,
    ) -> BoxStream<'_, Result<CandidatePair, sqlx::Error>> {
        sqlx::query_as::<_, CandidatePair>(CANDIDATES_SQL)
            .bind(tolerance_secs)
            .fetch(&self.pool)
    }

    /// Lazy cursor over one side's unmatched rows (anti-join)
    pub fn unmatched(&self, side: Side) -> BoxStream<'_, Result<StagedRow, sqlx::Error>> {
        let sql = match side {
            Side::A => UNMATCHED_A_SQL,
            Side::B => UNMATCHED_B_SQL,
        };
        sqlx::query_as::<_, StagedRow>(sql).fetch(&self.pool)
    }

    /// Row count for one side
    pub async fn count_records(&self, side: Side) -> ReconResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", side.table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Whole-side totals: record count, 6-second billing total, billed
    /// seconds, zero-duration count. The billing expression uses integer
    /// division on `duration + 5`, the SQL spelling of ceil(d / 6).
    pub async fn side_totals(&self, side: Side) -> ReconResult<SideTotals> {
        let sql = format!(
            r#"
            SELECT COUNT(*) AS total_records,
                   COALESCE(SUM(((billed_duration + 5) / 6) * rate / 10.0), 0.0) AS total_billed,
                   COALESCE(SUM(billed_duration), 0) AS total_seconds,
                   COALESCE(SUM(CASE WHEN billed_duration = 0 THEN 1 ELSE 0 END), 0) AS zero_duration
            FROM {}
            "#,
            side.table()
        );
        let totals = sqlx::query_as::<_, SideTotals>(&sql)
            .fetch_one(&self.pool)
            .await?;
        Ok(totals)
    }

    /// Unmatched rows for one side, split by zero vs billed duration
    pub async fn unmatched_split(&self, side: Side) -> ReconResult<(i64, i64)> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(CASE WHEN r.billed_duration = 0 THEN 1 ELSE 0 END), 0) AS zero_count,
                   COALESCE(SUM(CASE WHEN r.billed_duration > 0 THEN 1 ELSE 0 END), 0) AS billed_count
            FROM {t} r
            WHERE NOT EXISTS (SELECT 1 FROM {m} m WHERE m.id = r.id)
            "#,
            t = side.table(),
            m = side.match_table()
        );
        let (zero, billed): (i64, i64) = sqlx::query_as(&sql).fetch_one(&self.pool).await?;
        Ok((zero, billed))
    }

    /// Hung-call statistics for one side: (clustered row count, group count)
    pub async fn hung_stats(
        &self,
        side: Side,
        min_duration_secs: i64,
        min_cluster: i64,
    ) -> ReconResult<(i64, i64)> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(cnt), 0) AS calls, COUNT(*) AS groups
            FROM (
                SELECT COUNT(*) AS cnt
                FROM {t} r
                WHERE r.billed_duration > ?1
                  AND NOT EXISTS (SELECT 1 FROM {m} m WHERE m.id = r.id)
                GROUP BY r.billed_duration
                HAVING COUNT(*) >= ?2
            )
            "#,
            t = side.table(),
            m = side.match_table()
        );
        let (calls, groups): (i64, i64) = sqlx::query_as(&sql)
            .bind(min_duration_secs)
            .bind(min_cluster)
            .fetch_one(&self.pool)
            .await?;
        Ok((calls, groups))
    }

    /// Highest-revenue exemplars of each side's hung-call clusters
    pub async fn hung_exemplars(
        &self,
        side: Side,
        min_duration_secs: i64,
        min_cluster: i64,
        cap: i64,
    ) -> ReconResult<Vec<HungExemplar>> {
        let sql = format!(
            r#"
            SELECT r.a_number, r.b_number, r.seize_time, r.billed_duration,
                   r.rate, r.lrn, r.raw_index, g.cnt AS cluster_size
            FROM {t} r
            JOIN (
                SELECT r2.billed_duration AS dur, COUNT(*) AS cnt
                FROM {t} r2
                WHERE r2.billed_duration > ?1
                  AND NOT EXISTS (SELECT 1 FROM {m} m2 WHERE m2.id = r2.id)
                GROUP BY r2.billed_duration
                HAVING COUNT(*) >= ?2
            ) g ON r.billed_duration = g.dur
            WHERE NOT EXISTS (SELECT 1 FROM {m} m WHERE m.id = r.id)
            ORDER BY CAST(r.rate AS REAL) * r.billed_duration DESC
            LIMIT ?3
            "#,
            t = side.table(),
            m = side.match_table()
        );
        let exemplars = sqlx::query_as::<_, HungExemplar>(&sql)
            .bind(min_duration_secs)
            .bind(min_cluster)
            .bind(cap)
            .fetch_all(&self.pool)
            .await?;
        Ok(exemplars)
    }

    /// Close the pool; the database file is removed with the scratch space
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
