//! PostgreSQL bar store adapter.

use crate::domain::bar::Bar;
use crate::domain::error::TradesimError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::cell::RefCell;

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradesimError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| TradesimError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| TradesimError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }
}

fn bar_from_row(row: &postgres::Row) -> Bar {
    let datetime: NaiveDateTime = row.get(1);
    Bar::from_datetime(
        row.get(0),
        datetime,
        row.get(2),
        row.get(3),
        row.get(4),
        row.get(5),
        row.get(6),
    )
}

impl DataPort for PostgresAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TradesimError> {
        let query = "SELECT symbol, datetime, \
                            open::double precision, high::double precision, \
                            low::double precision, close::double precision, \
                            volume::bigint \
                     FROM public.historical \
                     WHERE symbol = $1 AND datetime >= $2 AND datetime <= $3 \
                     ORDER BY datetime ASC";

        let params: &[&(dyn ToSql + Sync)] = &[&symbol, &start, &end];
        let rows = self
            .client
            .borrow_mut()
            .query(query, params)
            .map_err(|e| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(rows.iter().map(bar_from_row).collect())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradesimError> {
        let query = "SELECT DISTINCT symbol FROM public.historical ORDER BY symbol";

        let rows = self
            .client
            .borrow_mut()
            .query(query, &[])
            .map_err(|e| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn latest_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Bar>, TradesimError> {
        let query = "SELECT symbol, datetime, \
                            open::double precision, high::double precision, \
                            low::double precision, close::double precision, \
                            volume::bigint \
                     FROM public.historical \
                     WHERE symbol = $1 \
                     ORDER BY datetime DESC \
                     LIMIT $2";

        let limit = limit as i64;
        let params: &[&(dyn ToSql + Sync)] = &[&symbol, &limit];
        let rows = self
            .client
            .borrow_mut()
            .query(query, params)
            .map_err(|e| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        Ok(rows.iter().map(bar_from_row).collect())
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, TradesimError> {
        let query =
            "SELECT MIN(datetime), MAX(datetime), COUNT(*) FROM public.historical WHERE symbol = $1";

        let rows = self
            .client
            .borrow_mut()
            .query(query, &[&symbol])
            .map_err(|e| TradesimError::DatabaseQuery {
                reason: e.to_string(),
            })?;

        if rows.is_empty() {
            return Ok(None);
        }

        let row = &rows[0];
        let min: Option<NaiveDateTime> = row.get(0);
        let max: Option<NaiveDateTime> = row.get(1);
        let count: i64 = row.get(2);

        match (min, max) {
            (Some(min), Some(max)) if count > 0 => Ok(Some((min, max, count as usize))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    #[test]
    fn from_config_missing_connection_string() {
        let result = PostgresAdapter::from_config(&EmptyConfig);
        match result {
            Err(TradesimError::ConfigMissing { section, key }) => {
                assert_eq!(section, "postgres");
                assert_eq!(key, "connection_string");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }
}
