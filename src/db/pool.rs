//! SQLite connection wrapper (lightweight, one connection per process).

use crate::db::migrate::run_pending_migrations;
use crate::db::watch::{ChangeBus, LiveQuery, Table};
use crate::errors::AppResult;
use rusqlite::{Connection, Transaction};
use std::path::Path;

pub struct DbPool {
    pub conn: Connection,
    bus: ChangeBus,
}

impl DbPool {
    /// Open (or create) the database file and bring the schema up to date.
    pub fn new(path: &str) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        Self::from_conn(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> AppResult<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        run_pending_migrations(&conn)?;
        Ok(Self {
            conn,
            bus: ChangeBus::default(),
        })
    }

    /// Run `func` inside a transaction; on commit, subscribers of `table`
    /// are notified.
    pub fn write<F, T>(&mut self, table: Table, func: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction) -> AppResult<T>,
    {
        let tx = self.conn.transaction()?;
        let out = func(&tx)?;
        tx.commit()?;
        self.bus.publish(table);
        Ok(out)
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Subscribe `query` to changes of `table`.
    pub fn watch<T, F>(&self, table: Table, query: F) -> LiveQuery<T>
    where
        F: Fn(&Connection) -> AppResult<T> + 'static,
    {
        let rx = self.bus.subscribe(table);
        LiveQuery::new(table, rx, Box::new(query))
    }
}
