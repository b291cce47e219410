//! SQLite history of completed searches.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::service::SearchOutcome;

/// Rows returned by [`Db::recent_searches`] when no limit is given.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

/// Summary of one search, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub query: String,
    pub country: String,
    pub currency_symbol: String,
    pub results_count: usize,
    pub min_price: Option<f64>,
    pub median_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sources: Vec<String>,
    pub ai_model: String,
    pub searched_at: DateTime<Utc>,
}

impl SearchRecord {
    pub fn from_outcome(outcome: &SearchOutcome, ai_model: &str) -> Self {
        Self {
            query: outcome.query.clone(),
            country: outcome.location.country.clone(),
            currency_symbol: outcome.currency.symbol.clone(),
            results_count: outcome.results_count,
            min_price: outcome.aggregate.min_price(),
            median_price: outcome.aggregate.median_price(),
            max_price: outcome.aggregate.max_price(),
            sources: outcome.aggregate.all_sources.clone(),
            ai_model: ai_model.to_string(),
            searched_at: Utc::now(),
        }
    }
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        if version < 1 {
            self.conn.pragma_update(None, "user_version", 1)?;
        }
        Ok(())
    }

    pub fn record_search(&self, record: &SearchRecord) -> Result<i64, DbError> {
        let sources = serde_json::to_string(&record.sources)?;
        self.conn.execute(
            "INSERT INTO searches (
                query, country, currency_symbol, results_count,
                min_price, median_price, max_price, sources, ai_model, searched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.query,
                record.country,
                record.currency_symbol,
                record.results_count as i64,
                record.min_price,
                record.median_price,
                record.max_price,
                sources,
                record.ai_model,
                record.searched_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// The latest `limit` searches, newest first.
    pub fn recent_searches(&self, limit: usize) -> Result<Vec<SearchRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT query, country, currency_symbol, results_count,
                    min_price, median_price, max_price, sources, ai_model, searched_at
             FROM searches
             ORDER BY searched_at DESC, search_id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (
                query,
                country,
                currency_symbol,
                results_count,
                min_price,
                median_price,
                max_price,
                sources,
                ai_model,
                searched_at,
            ) = row?;
            records.push(SearchRecord {
                query,
                country,
                currency_symbol,
                results_count: results_count.max(0) as usize,
                min_price,
                median_price,
                max_price,
                sources: serde_json::from_str(&sources)?,
                ai_model,
                searched_at: DateTime::parse_from_rfc3339(&searched_at)?.with_timezone(&Utc),
            });
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_test_db() -> Db {
        let db = Db::open_in_memory().expect("open in-memory db");
        db.init().expect("init schema");
        db
    }

    fn record(query: &str, hour: u32) -> SearchRecord {
        SearchRecord {
            query: query.to_string(),
            country: "india".to_string(),
            currency_symbol: "₹".to_string(),
            results_count: 3,
            min_price: Some(60_000.0),
            median_price: Some(62_000.0),
            max_price: None,
            sources: vec!["Amazon.in".to_string(), "Flipkart".to_string()],
            ai_model: "rules".to_string(),
            searched_at: Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap(),
        }
    }

    fn get_user_version(db: &Db) -> i32 {
        db.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .expect("read user_version")
    }

    #[test]
    fn init_sets_user_version_and_is_idempotent() {
        let db = open_test_db();
        assert_eq!(get_user_version(&db), 1);
        db.init().expect("second init");
        assert_eq!(get_user_version(&db), 1);
    }

    #[test]
    fn record_round_trips() {
        let db = open_test_db();
        let rec = record("samsung galaxy s24", 9);
        db.record_search(&rec).unwrap();
        let back = db.recent_searches(DEFAULT_HISTORY_LIMIT).unwrap();
        assert_eq!(back, vec![rec]);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let db = open_test_db();
        db.record_search(&record("first", 8)).unwrap();
        db.record_search(&record("third", 10)).unwrap();
        db.record_search(&record("second", 9)).unwrap();
        let recent = db.recent_searches(2).unwrap();
        let queries: Vec<&str> = recent.iter().map(|r| r.query.as_str()).collect();
        assert_eq!(queries, vec!["third", "second"]);
    }

    #[test]
    fn empty_history() {
        let db = open_test_db();
        assert!(db.recent_searches(5).unwrap().is_empty());
    }
}
