use crate::model::{MarketAnalysis, RecommendedAction, StorageError};
use crate::utils::parse_datetime;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Keeps every returned report verbatim as JSON, with a few summary columns
/// for lookups.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database (`":memory:"` works too) and creates the schema.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                created_at TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                recommended_action TEXT NOT NULL,
                confidence REAL NOT NULL,
                report TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_symbol
                ON analyses (symbol, id);
            "
        )?;

        Ok(Self { conn })
    }

    /// Stores a report and returns its row id.
    pub fn save_report(&self, report: &MarketAnalysis) -> Result<i64, StorageError> {
        let json = serde_json::to_string(report)?;
        self.conn.execute(
            "INSERT INTO analyses (symbol, created_at, risk_level, recommended_action, confidence, report)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &report.symbol,
                &report.timestamp.to_rfc3339(),
                report.risk_level.as_str(),
                report.recommended_action.as_str(),
                &report.confidence,
                &json,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recently stored report for `symbol`.
    pub fn latest_report(&self, symbol: &str) -> Result<Option<MarketAnalysis>, StorageError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT report FROM analyses WHERE symbol = ?1 ORDER BY id DESC LIMIT 1",
                params![symbol],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Up to `limit` reports for `symbol`, newest first.
    pub fn history(&self, symbol: &str, limit: usize) -> Result<Vec<MarketAnalysis>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT report FROM analyses WHERE symbol = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![symbol, limit as i64], |row| row.get::<_, String>(0))?;
        let mut reports = Vec::new();
        for json in rows {
            reports.push(serde_json::from_str(&json?)?);
        }

        Ok(reports)
    }

    /// Deletes all but the newest `keep` reports for `symbol`. Returns the number removed.
    pub fn prune_history(&self, symbol: &str, keep: usize) -> Result<usize, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM analyses WHERE symbol = ?1 AND id NOT IN (
                SELECT id FROM analyses WHERE symbol = ?1 ORDER BY id DESC LIMIT ?2
            )",
            params![symbol, keep as i64],
        )?;
        Ok(removed)
    }

    /// Latest recommended action per symbol, ordered by symbol.
    pub fn latest_actions(&self) -> Result<Vec<(String, RecommendedAction, DateTime<Utc>)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, recommended_action, created_at FROM analyses
             WHERE id IN (SELECT MAX(id) FROM analyses GROUP BY symbol)
             ORDER BY symbol ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let symbol: String = row.get(0)?;
            let action: String = row.get(1)?;
            let created_at: String = row.get(2)?;
            Ok((symbol, action, created_at))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (symbol, action, created_at) = row?;
            let action = RecommendedAction::parse(&action)
                .ok_or_else(|| StorageError::InvalidValue(format!("action {:?}", action)))?;
            let created_at = parse_datetime(&created_at)
                .ok_or_else(|| StorageError::InvalidValue(format!("timestamp {:?}", created_at)))?;
            results.push((symbol, action, created_at));
        }

        Ok(results)
    }
}
