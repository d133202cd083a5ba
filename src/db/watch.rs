//! Live queries: change notifications keyed by table.
//!
//! Repositories publish the affected [`Table`] after every committed write.
//! A [`LiveQuery`] re-runs its query only when its table changed and hands
//! back the full snapshot; there is no diffing.

use crate::db::pool::DbPool;
use crate::errors::AppResult;
use rusqlite::Connection;
use std::cell::RefCell;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    TimeBlocks,
    Categories,
    Achievements,
    UserSettings,
}

#[derive(Default)]
pub struct ChangeBus {
    subscribers: RefCell<Vec<(Table, Sender<Table>)>>,
}

impl ChangeBus {
    pub fn subscribe(&self, table: Table) -> Receiver<Table> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push((table, tx));
        rx
    }

    /// Notify every live subscriber of `table`; hung-up ones are dropped.
    pub fn publish(&self, table: Table) {
        self.subscribers
            .borrow_mut()
            .retain(|(t, tx)| *t != table || tx.send(table).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

type QueryFn<T> = Box<dyn Fn(&Connection) -> AppResult<T>>;

pub struct LiveQuery<T> {
    table: Table,
    rx: Receiver<Table>,
    query: QueryFn<T>,
}

impl<T> LiveQuery<T> {
    pub(crate) fn new(table: Table, rx: Receiver<Table>, query: QueryFn<T>) -> Self {
        Self { table, rx, query }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Run the query now, regardless of pending notifications.
    pub fn current(&self, pool: &DbPool) -> AppResult<T> {
        (self.query)(&pool.conn)
    }

    /// Snapshot if the table changed since the last poll, `None` otherwise.
    /// Several writes in between collapse into a single snapshot.
    pub fn poll(&self, pool: &DbPool) -> AppResult<Option<T>> {
        let mut changed = false;
        loop {
            match self.rx.try_recv() {
                Ok(_) => changed = true,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if changed {
            Ok(Some(self.current(pool)?))
        } else {
            Ok(None)
        }
    }
}
