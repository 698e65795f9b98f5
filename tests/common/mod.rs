//! Scripted in-memory driver used to observe what the executor asks of a connection

#![allow(dead_code)]

use std::cell::RefCell;

use sqlite_rowmap::{
    Connection, Cursor, Error, GeneratedKeys, MemoryCursor, PreparedStatement, Result, Value,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What every statement prepared on a [`MockConnection`] does when executed
#[derive(Debug, Clone)]
pub enum Outcome {
    Rows(Vec<&'static str>, Vec<Vec<Value>>),
    Updated(u64),
    Fail(&'static str),
}

pub struct MockConnection {
    outcome: Outcome,
    generated_key: Option<i64>,
    fail_close: bool,
    events: RefCell<Vec<String>>,
}

impl MockConnection {
    pub fn new(outcome: Outcome) -> Self {
        init_logging();
        MockConnection {
            outcome,
            generated_key: None,
            fail_close: false,
            events: RefCell::new(Vec::new()),
        }
    }

    pub fn rows(columns: &[&'static str], rows: Vec<Vec<Value>>) -> Self {
        MockConnection::new(Outcome::Rows(columns.to_vec(), rows))
    }

    pub fn with_generated_key(mut self, key: i64) -> Self {
        self.generated_key = Some(key);
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }
}

impl Connection for MockConnection {
    type Statement<'c> = MockStatement<'c>;

    fn prepare(&self, sql: &str, keys: GeneratedKeys) -> Result<MockStatement<'_>> {
        self.record(format!("prepare {} {:?}", sql, keys));
        Ok(MockStatement { conn: self })
    }

    fn prepare_call(&self, sql: &str) -> Result<MockStatement<'_>> {
        self.record(format!("prepare_call {}", sql));
        Ok(MockStatement { conn: self })
    }
}

pub struct MockStatement<'c> {
    conn: &'c MockConnection,
}

impl MockStatement<'_> {
    fn cursor(&self, columns: &[&'static str], rows: &[Vec<Value>]) -> MockCursor<'_> {
        MockCursor {
            conn: self.conn,
            inner: MemoryCursor::new(columns.to_vec(), rows.to_vec()),
        }
    }
}

impl<'c> PreparedStatement for MockStatement<'c> {
    type Cursor<'s>
        = MockCursor<'s>
    where
        Self: 's;

    fn bind(&mut self, position: usize, value: &Value) -> Result<()> {
        self.conn.record(format!("bind {} {:?}", position, value));
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64> {
        self.conn.record("execute_update");
        match &self.conn.outcome {
            Outcome::Updated(count) => Ok(*count),
            Outcome::Rows(..) => Err(Error::statement("statement returned rows")),
            Outcome::Fail(message) => Err(Error::statement(*message)),
        }
    }

    fn execute_query(&mut self) -> Result<MockCursor<'_>> {
        self.conn.record("execute_query");
        match &self.conn.outcome {
            Outcome::Rows(columns, rows) => Ok(self.cursor(columns, rows)),
            Outcome::Updated(_) => Err(Error::statement("statement does not return rows")),
            Outcome::Fail(message) => Err(Error::statement(*message)),
        }
    }

    fn execute(&mut self) -> Result<Option<MockCursor<'_>>> {
        self.conn.record("execute");
        match &self.conn.outcome {
            Outcome::Rows(columns, rows) => Ok(Some(self.cursor(columns, rows))),
            Outcome::Updated(_) => Ok(None),
            Outcome::Fail(message) => Err(Error::statement(*message)),
        }
    }

    fn generated_key(&mut self) -> Result<Option<i64>> {
        self.conn.record("generated_key");
        Ok(self.conn.generated_key)
    }

    fn close(self) -> Result<()> {
        self.conn.record("close statement");
        if self.conn.fail_close {
            return Err(Error::statement("close failed"));
        }
        Ok(())
    }
}

pub struct MockCursor<'s> {
    conn: &'s MockConnection,
    inner: MemoryCursor,
}

impl Cursor for MockCursor<'_> {
    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_name(&self, position: usize) -> Result<&str> {
        self.inner.column_name(position)
    }

    fn advance(&mut self) -> Result<bool> {
        self.inner.advance()
    }

    fn value(&self, position: usize) -> Result<Value> {
        self.inner.value(position)
    }

    fn close(self) -> Result<()> {
        self.conn.record("close cursor");
        Ok(())
    }
}
