//! In-memory backend
//!
//! A deterministic, scriptable backend: queued canned responses are played
//! back in FIFO order, every executed statement and command is recorded for
//! verification, and result handles count their native fetches so tests can
//! observe cursor behavior precisely.
//!
//! # Example
//!
//! ```
//! use unidriver::backends::memory::{CannedResponse, MemoryConnectionHandle};
//! use unidriver::core::{ConnectionSource, Value};
//! use unidriver::MemoryDriver;
//!
//! let handle = MemoryConnectionHandle::new();
//! handle.push_response(
//!     CannedResponse::new()
//!         .columns(["id", "name"])
//!         .row([Value::Long(1), Value::from("Alice")]),
//! );
//!
//! let driver = MemoryDriver::with_defaults(ConnectionSource::Handle(handle.clone()));
//! let mut statement = driver.create_statement("SELECT id, name FROM users").unwrap();
//! let mut result = statement.execute(&[]).unwrap();
//!
//! let row = result.advance().unwrap().unwrap();
//! assert_eq!(row.get("name"), Some(&Value::from("Alice")));
//! ```

use crate::core::backend::{Backend, ParameterStyle};
use crate::core::connection::ConnectionParams;
use crate::core::driver::DriverOptions;
use crate::core::error::{DriverError, Result};
use crate::core::value::{Row, Value};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// A recorded statement execution, kept for verification
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// One scripted response, played back by the next execution
#[derive(Clone, Default)]
pub struct CannedResponse {
    columns: Vec<String>,
    rows: Vec<Row>,
    affected: u64,
    generated: Option<Value>,
    fetches: Rc<Cell<usize>>,
}

impl CannedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column names for the response
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a row of values, in column order
    pub fn row<I: IntoIterator<Item = Value>>(mut self, values: I) -> Self {
        let row: Row = self.columns.iter().cloned().zip(values).collect();
        self.rows.push(row);
        self
    }

    /// Set the affected-row count the native layer reports
    pub fn affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    /// Set the generated key this execution produces
    pub fn generated(mut self, value: Value) -> Self {
        self.generated = Some(value);
        self
    }

    /// Probe counting native fetches against the produced result handle
    pub fn fetch_probe(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.fetches)
    }

    /// Turn the response into a standalone result handle
    pub fn into_result_handle(self) -> MemoryResultHandle {
        MemoryResultHandle {
            field_count: self.columns.len(),
            rows: self.rows.into(),
            affected: self.affected,
            fetches: self.fetches,
        }
    }
}

struct MemoryStore {
    responses: VecDeque<CannedResponse>,
    default_response: CannedResponse,
    executed: Vec<ExecutedStatement>,
    commands: Vec<String>,
    last_generated: Option<Value>,
    trace: bool,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            responses: VecDeque::new(),
            default_response: CannedResponse::new(),
            executed: Vec::new(),
            commands: Vec::new(),
            last_generated: None,
            trace: false,
        }
    }
}

/// Native connection handle of the in-memory backend
///
/// Clones share the same store, so a test can keep a handle to script
/// responses and inspect recordings while a driver owns the connection.
#[derive(Clone)]
pub struct MemoryConnectionHandle {
    store: Rc<RefCell<MemoryStore>>,
}

impl MemoryConnectionHandle {
    pub fn new() -> Self {
        Self {
            store: Rc::new(RefCell::new(MemoryStore::new())),
        }
    }

    /// Queue a response for the next execution (FIFO)
    pub fn push_response(&self, response: CannedResponse) {
        self.store.borrow_mut().responses.push_back(response);
    }

    /// Response used when the queue is empty
    pub fn set_default_response(&self, response: CannedResponse) {
        self.store.borrow_mut().default_response = response;
    }

    /// Seed the generated key the connection reports
    pub fn set_last_generated(&self, value: Value) {
        self.store.borrow_mut().last_generated = Some(value);
    }

    /// Every statement executed so far
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.store.borrow().executed.clone()
    }

    /// Every row-less command executed so far (transaction boundaries)
    pub fn commands(&self) -> Vec<String> {
        self.store.borrow().commands.clone()
    }

    /// Build a statement-kind handle, as `prepare` would
    pub fn statement_handle(&self, sql: &str) -> MemoryStatementHandle {
        MemoryStatementHandle {
            kind: HandleKind::Statement,
            sql: sql.to_string(),
            store: Rc::clone(&self.store),
        }
    }

    /// Build a cursor-kind handle, which no statement factory accepts
    pub fn cursor_handle(&self) -> MemoryStatementHandle {
        MemoryStatementHandle {
            kind: HandleKind::Cursor,
            sql: String::new(),
            store: Rc::clone(&self.store),
        }
    }
}

impl Default for MemoryConnectionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Resource kind carried by a native handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Statement,
    Cursor,
}

/// Native statement handle of the in-memory backend
pub struct MemoryStatementHandle {
    kind: HandleKind,
    sql: String,
    store: Rc<RefCell<MemoryStore>>,
}

impl MemoryStatementHandle {
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Native result handle of the in-memory backend
pub struct MemoryResultHandle {
    rows: VecDeque<Row>,
    affected: u64,
    field_count: usize,
    fetches: Rc<Cell<usize>>,
}

/// Scriptable in-memory backend
pub enum MemoryBackend {}

impl Backend for MemoryBackend {
    type ConnectionHandle = MemoryConnectionHandle;
    type StatementHandle = MemoryStatementHandle;
    type ResultHandle = MemoryResultHandle;

    const PLATFORM_NAME: &'static str = "Memory";
    const PREPARE_TYPE: ParameterStyle = ParameterStyle::Named;
    const RECOGNIZED_OPTIONS: &'static [&'static str] = &["trace"];

    fn check_environment() -> Result<()> {
        Ok(())
    }

    fn connect(
        _params: &ConnectionParams,
        options: &DriverOptions,
    ) -> Result<Self::ConnectionHandle> {
        let handle = MemoryConnectionHandle::new();
        handle.store.borrow_mut().trace = options
            .get("trace")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(handle)
    }

    fn execute_command(conn: &mut Self::ConnectionHandle, sql: &str) -> Result<()> {
        let mut store = conn.store.borrow_mut();
        if store.trace {
            log::debug!(target: "unidriver::memory", "command: {}", sql);
        }
        store.commands.push(sql.to_string());
        Ok(())
    }

    fn prepare(conn: &mut Self::ConnectionHandle, sql: &str) -> Result<Self::StatementHandle> {
        Ok(conn.statement_handle(sql))
    }

    fn statement_handle_usable(handle: &Self::StatementHandle) -> bool {
        handle.kind == HandleKind::Statement
    }

    fn execute(handle: &mut Self::StatementHandle, params: &[Value]) -> Result<Self::ResultHandle> {
        if handle.kind != HandleKind::Statement {
            return Err(DriverError::invalid_argument(
                "handle is not of the statement kind",
            ));
        }

        let mut store = handle.store.borrow_mut();
        if store.trace {
            log::debug!(target: "unidriver::memory", "execute: {}", handle.sql);
        }
        store.executed.push(ExecutedStatement {
            sql: handle.sql.clone(),
            params: params.to_vec(),
        });

        let response = match store.responses.pop_front() {
            Some(response) => response,
            None => store.default_response.clone(),
        };
        if let Some(generated) = &response.generated {
            store.last_generated = Some(generated.clone());
        }
        Ok(response.into_result_handle())
    }

    fn fetch(handle: &mut Self::ResultHandle) -> Result<Option<Row>> {
        handle.fetches.set(handle.fetches.get() + 1);
        Ok(handle.rows.pop_front())
    }

    fn field_count(handle: &Self::ResultHandle) -> usize {
        handle.field_count
    }

    fn affected_rows(handle: &Self::ResultHandle) -> u64 {
        handle.affected
    }

    fn last_generated_value(conn: &Self::ConnectionHandle) -> Option<Value> {
        conn.store.borrow().last_generated.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responses_play_back_in_fifo_order() {
        let conn = MemoryConnectionHandle::new();
        conn.push_response(CannedResponse::new().affected(1));
        conn.push_response(CannedResponse::new().affected(2));

        let mut first = conn.statement_handle("UPDATE a");
        let mut second = conn.statement_handle("UPDATE b");
        let first = MemoryBackend::execute(&mut first, &[]).unwrap();
        let second = MemoryBackend::execute(&mut second, &[]).unwrap();

        assert_eq!(MemoryBackend::affected_rows(&first), 1);
        assert_eq!(MemoryBackend::affected_rows(&second), 2);
    }

    #[test]
    fn test_executions_are_recorded_with_params() {
        let conn = MemoryConnectionHandle::new();
        let mut handle = conn.statement_handle("INSERT INTO t (a) VALUES (:a)");
        MemoryBackend::execute(&mut handle, &[Value::Int(7)]).unwrap();

        let executed = conn.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].sql, "INSERT INTO t (a) VALUES (:a)");
        assert_eq!(executed[0].params, vec![Value::Int(7)]);
    }

    #[test]
    fn test_cursor_kind_handle_is_not_usable() {
        let conn = MemoryConnectionHandle::new();
        assert!(!MemoryBackend::statement_handle_usable(
            &conn.cursor_handle()
        ));
        assert!(MemoryBackend::statement_handle_usable(
            &conn.statement_handle("SELECT 1")
        ));
    }

    #[test]
    fn test_generated_key_updates_on_execution() {
        let conn = MemoryConnectionHandle::new();
        assert_eq!(MemoryBackend::last_generated_value(&conn), None);

        conn.push_response(CannedResponse::new().affected(1).generated(Value::Long(42)));
        let mut handle = conn.statement_handle("INSERT INTO t DEFAULT VALUES");
        MemoryBackend::execute(&mut handle, &[]).unwrap();

        assert_eq!(
            MemoryBackend::last_generated_value(&conn),
            Some(Value::Long(42))
        );
    }

    #[test]
    fn test_fetch_probe_counts_native_fetches() {
        let response = CannedResponse::new().columns(["id"]).row([Value::Long(1)]);
        let probe = response.fetch_probe();
        let mut handle = response.into_result_handle();

        assert_eq!(probe.get(), 0);
        assert!(MemoryBackend::fetch(&mut handle).unwrap().is_some());
        assert!(MemoryBackend::fetch(&mut handle).unwrap().is_none());
        assert_eq!(probe.get(), 2);
    }
}
