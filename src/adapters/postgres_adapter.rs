//! PostgreSQL event sink for the hosted `public.breakout_failures` table.

use crate::domain::error::BreakoutError;
use crate::domain::failure::FailureEvent;
use crate::ports::config_port::ConfigPort;
use crate::ports::event_port::EventSink;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::cell::RefCell;

pub struct PostgresAdapter {
    client: RefCell<Client>,
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BreakoutError> {
        let connection_string = config
            .get_string("postgres", "connection_string")
            .ok_or_else(|| BreakoutError::ConfigMissing {
                section: "postgres".into(),
                key: "connection_string".into(),
            })?;

        let client =
            Client::connect(&connection_string, NoTls).map_err(|e| BreakoutError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client: RefCell::new(client),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), BreakoutError> {
        self.client
            .borrow_mut()
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS public.breakout_failures (
                    id BIGSERIAL PRIMARY KEY,
                    company TEXT NOT NULL,
                    ticker TEXT NOT NULL,
                    location TEXT NOT NULL,
                    failure_time TIMESTAMP NOT NULL,
                    break_time TIMESTAMP,
                    close_at_failure DOUBLE PRECISION
                );
                CREATE UNIQUE INDEX IF NOT EXISTS breakout_failures_event_key
                    ON public.breakout_failures
                    (ticker, location, failure_time, COALESCE(break_time, 'epoch'::timestamp));",
            )
            .map_err(|e| BreakoutError::DatabaseQuery {
                reason: e.to_string(),
            })
    }
}

impl EventSink for PostgresAdapter {
    fn insert_failures(&self, events: &[FailureEvent]) -> Result<usize, BreakoutError> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction().map_err(|e| BreakoutError::Database {
            reason: e.to_string(),
        })?;

        let query = "INSERT INTO public.breakout_failures \
                        (company, ticker, location, failure_time, break_time, close_at_failure) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     ON CONFLICT DO NOTHING";

        let mut inserted = 0;
        for event in events {
            let location = event.location.as_str();
            let params: &[&(dyn ToSql + Sync)] = &[
                &event.company,
                &event.ticker,
                &location,
                &event.failure_time,
                &event.break_time,
                &event.close_at_failure,
            ];
            inserted += tx
                .execute(query, params)
                .map_err(|e| BreakoutError::DatabaseQuery {
                    reason: e.to_string(),
                })?;
        }

        tx.commit().map_err(|e| BreakoutError::DatabaseQuery {
            reason: e.to_string(),
        })?;

        Ok(inserted as usize)
    }
}
