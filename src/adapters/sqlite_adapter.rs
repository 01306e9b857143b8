//! SQLite bar store adapter.
//!
//! Connections come from an r2d2 pool owned by the adapter; a dropped
//! connection is replaced by the pool on the next checkout rather than
//! being nursed back by callers.

use crate::domain::bar::Bar;
use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesimError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| TradesimError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| TradesimError::Database {
                    reason: e.to_string(),
                })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, TradesimError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| TradesimError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, TradesimError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| TradesimError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), TradesimError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS historical (
                symbol TEXT NOT NULL,
                datetime TEXT NOT NULL,
                trade_date TEXT NOT NULL,
                trade_time TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                PRIMARY KEY (symbol, datetime)
            );
            CREATE INDEX IF NOT EXISTS idx_historical_symbol ON historical(symbol);
            CREATE INDEX IF NOT EXISTS idx_historical_datetime ON historical(datetime);",
        )
        .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    pub fn insert_bars(&self, bars: &[Bar]) -> Result<(), TradesimError> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO historical
                     (symbol, datetime, trade_date, trade_time, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    bar.symbol,
                    bar.datetime.format(DATETIME_FORMAT).to_string(),
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.time.format("%H:%M:%S").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

fn bar_from_row(row: &rusqlite::Row<'_>) -> Result<Bar, rusqlite::Error> {
    let datetime_str: String = row.get(1)?;
    let datetime = NaiveDateTime::parse_from_str(&datetime_str, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            datetime_str.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    Ok(Bar::from_datetime(
        row.get(0)?,
        datetime,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

impl DataPort for SqliteAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError> {
        let conn = self.conn()?;

        let start_str = start.format(DATETIME_FORMAT).to_string();
        let end_str = end.format(DATETIME_FORMAT).to_string();

        let query = "SELECT symbol, datetime, trade_date, trade_time,
                            open, high, low, close, volume
                     FROM historical
                     WHERE symbol = ?1 AND datetime >= ?2 AND datetime <= ?3
                     ORDER BY datetime ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], bar_from_row)
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(
                row.map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let conn = self.conn()?;

        let query = "SELECT DISTINCT symbol FROM historical ORDER BY symbol ASC";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(
                row.map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(symbols)
    }

    fn latest_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, TradesimError> {
        let conn = self.conn()?;

        let query = "SELECT symbol, datetime, trade_date, trade_time,
                            open, high, low, close, volume
                     FROM historical
                     WHERE symbol = ?1
                     ORDER BY datetime DESC
                     LIMIT ?2";

        let mut stmt =
            conn.prepare(query)
                .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                    reason: e.to_string(),
                })?;

        let rows = stmt
            .query_map(params![symbol, limit as i64], bar_from_row)
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(
                row.map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(bars)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        let conn = self.conn()?;

        let query =
            "SELECT MIN(datetime), MAX(datetime), COUNT(*) FROM historical WHERE symbol = ?1";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![symbol], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(|e: rusqlite::Error| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let min = NaiveDateTime::parse_from_str(&min_str, DATETIME_FORMAT).map_err(
                    |e: chrono::ParseError| TradesimError::Database {
                        reason: e.to_string(),
                    },
                )?;
                let max = NaiveDateTime::parse_from_str(&max_str, DATETIME_FORMAT).map_err(
                    |e: chrono::ParseError| TradesimError::Database {
                        reason: e.to_string(),
                    },
                )?;
                Ok(Some((min, max, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
