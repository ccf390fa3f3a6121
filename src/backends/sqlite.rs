//! SQLite backend
//!
//! Backend over the bundled SQLite C library. Handles wrap the raw
//! `sqlite3` / `sqlite3_stmt` pointers; each wrapper releases its native
//! resource exactly once when dropped. `sqlite3_close_v2` defers the
//! actual close until every statement derived from the connection has been
//! finalized, so result sets may safely outlive the connection wrapper.
//!
//! Statements without result columns run to completion at execute time;
//! statements with result columns are stepped lazily, one row per fetch,
//! which makes the native cursor strictly forward-only.

use crate::core::backend::{Backend, ParameterStyle};
use crate::core::connection::ConnectionParams;
use crate::core::driver::DriverOptions;
use crate::core::error::{DriverError, Result};
use crate::core::value::{Row, Value};
use libsqlite3_sys as ffi;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::rc::Rc;

// `libsqlite3-sys`'s bundled bindings do not expose a Rust declaration for
// `sqlite3_close_v2`, though the statically-linked SQLite library exports it.
// Declare the binding directly so the deferred-close semantics this backend
// relies on remain available.
extern "C" {
    fn sqlite3_close_v2(db: *mut ffi::sqlite3) -> c_int;
}

/// Oldest SQLite runtime the backend accepts
const MIN_SQLITE_VERSION_NUMBER: c_int = 3_008_000;

/// Native connection handle, exclusively owning one `sqlite3` pointer
pub struct SqliteConnectionHandle {
    db: *mut ffi::sqlite3,
}

impl Drop for SqliteConnectionHandle {
    fn drop(&mut self) {
        // close_v2 never fails for a valid handle; outstanding statements
        // keep the database alive until they are finalized.
        unsafe {
            sqlite3_close_v2(self.db);
        }
    }
}

struct RawStatement {
    stmt: *mut ffi::sqlite3_stmt,
}

impl Drop for RawStatement {
    fn drop(&mut self) {
        unsafe {
            ffi::sqlite3_finalize(self.stmt);
        }
    }
}

/// Native statement handle
///
/// The prepared statement is shared with the result handles produced from
/// it; the native resource is finalized when the last holder drops.
pub struct SqliteStatementHandle {
    raw: Rc<RawStatement>,
}

/// Native result handle
pub struct SqliteResultHandle {
    raw: Rc<RawStatement>,
    done: bool,
}

fn errmsg(db: *mut ffi::sqlite3) -> String {
    if db.is_null() {
        return "unknown sqlite error".to_string();
    }
    unsafe {
        let msg = ffi::sqlite3_errmsg(db);
        if msg.is_null() {
            "unknown sqlite error".to_string()
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    }
}

fn prepare_raw(db: *mut ffi::sqlite3, sql: &str) -> Result<RawStatement> {
    let c_sql = CString::new(sql)
        .map_err(|_| DriverError::invalid_argument("sql contains an interior nul byte"))?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
    let rc =
        unsafe { ffi::sqlite3_prepare_v2(db, c_sql.as_ptr(), -1, &mut stmt, ptr::null_mut()) };
    if rc != ffi::SQLITE_OK {
        return Err(DriverError::native(rc, errmsg(db)));
    }
    if stmt.is_null() {
        // Whitespace or comment-only input compiles to no statement
        return Err(DriverError::statement("sql contains no statement"));
    }
    Ok(RawStatement { stmt })
}

fn step_to_completion(stmt: *mut ffi::sqlite3_stmt) -> Result<()> {
    loop {
        match unsafe { ffi::sqlite3_step(stmt) } {
            ffi::SQLITE_ROW => continue,
            ffi::SQLITE_DONE => return Ok(()),
            code => {
                let db = unsafe { ffi::sqlite3_db_handle(stmt) };
                return Err(DriverError::native(code, errmsg(db)));
            }
        }
    }
}

fn read_row(stmt: *mut ffi::sqlite3_stmt) -> Row {
    let count = unsafe { ffi::sqlite3_column_count(stmt) };
    let mut row = Row::new();
    for i in 0..count {
        let name = unsafe {
            let name = ffi::sqlite3_column_name(stmt, i);
            if name.is_null() {
                format!("column{}", i)
            } else {
                CStr::from_ptr(name).to_string_lossy().into_owned()
            }
        };
        let value = unsafe {
            match ffi::sqlite3_column_type(stmt, i) {
                ffi::SQLITE_INTEGER => Value::Long(ffi::sqlite3_column_int64(stmt, i)),
                ffi::SQLITE_FLOAT => Value::Double(ffi::sqlite3_column_double(stmt, i)),
                ffi::SQLITE_TEXT => {
                    let text = ffi::sqlite3_column_text(stmt, i);
                    let len = ffi::sqlite3_column_bytes(stmt, i) as usize;
                    if text.is_null() {
                        Value::String(String::new())
                    } else {
                        let bytes = std::slice::from_raw_parts(text, len);
                        Value::String(String::from_utf8_lossy(bytes).into_owned())
                    }
                }
                ffi::SQLITE_BLOB => {
                    let blob = ffi::sqlite3_column_blob(stmt, i);
                    let len = ffi::sqlite3_column_bytes(stmt, i) as usize;
                    if blob.is_null() || len == 0 {
                        Value::Bytes(Vec::new())
                    } else {
                        Value::Bytes(std::slice::from_raw_parts(blob as *const u8, len).to_vec())
                    }
                }
                _ => Value::Null,
            }
        };
        row.insert(name, value);
    }
    row
}

/// Backend over the bundled SQLite library
pub enum SqliteBackend {}

impl Backend for SqliteBackend {
    type ConnectionHandle = SqliteConnectionHandle;
    type StatementHandle = SqliteStatementHandle;
    type ResultHandle = SqliteResultHandle;

    const PLATFORM_NAME: &'static str = "SQLite";
    const PREPARE_TYPE: ParameterStyle = ParameterStyle::Positional;
    const RECOGNIZED_OPTIONS: &'static [&'static str] =
        &["foreign_keys", "busy_timeout_ms", "read_only"];

    fn check_environment() -> Result<()> {
        let version = unsafe { ffi::sqlite3_libversion_number() };
        if version < MIN_SQLITE_VERSION_NUMBER {
            return Err(DriverError::environment(format!(
                "SQLite runtime {} is older than the required {}",
                version, MIN_SQLITE_VERSION_NUMBER
            )));
        }
        Ok(())
    }

    fn connect(
        params: &ConnectionParams,
        options: &DriverOptions,
    ) -> Result<Self::ConnectionHandle> {
        let path = params.get_database().unwrap_or(":memory:");
        let c_path = CString::new(path).map_err(|_| {
            DriverError::invalid_argument("database path contains an interior nul byte")
        })?;

        let read_only = options
            .get("read_only")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let flags = ffi::SQLITE_OPEN_URI
            | if read_only {
                ffi::SQLITE_OPEN_READONLY
            } else {
                ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE
            };

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
        if rc != ffi::SQLITE_OK {
            let message = errmsg(db);
            if !db.is_null() {
                unsafe {
                    sqlite3_close_v2(db);
                }
            }
            return Err(DriverError::native(rc, message));
        }
        let mut handle = SqliteConnectionHandle { db };

        if let Some(timeout) = options.get("busy_timeout_ms").and_then(Value::as_long) {
            unsafe {
                ffi::sqlite3_busy_timeout(db, timeout as c_int);
            }
        }
        let foreign_keys = options
            .get("foreign_keys")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        if foreign_keys {
            Self::execute_command(&mut handle, "PRAGMA foreign_keys = ON")?;
        }
        Ok(handle)
    }

    fn execute_command(conn: &mut Self::ConnectionHandle, sql: &str) -> Result<()> {
        let raw = prepare_raw(conn.db, sql)?;
        step_to_completion(raw.stmt)
    }

    fn prepare(conn: &mut Self::ConnectionHandle, sql: &str) -> Result<Self::StatementHandle> {
        Ok(SqliteStatementHandle {
            raw: Rc::new(prepare_raw(conn.db, sql)?),
        })
    }

    fn statement_handle_usable(handle: &Self::StatementHandle) -> bool {
        !handle.raw.stmt.is_null()
    }

    fn execute(handle: &mut Self::StatementHandle, params: &[Value]) -> Result<Self::ResultHandle> {
        let stmt = handle.raw.stmt;
        let db = unsafe { ffi::sqlite3_db_handle(stmt) };

        // Re-executing a prepared statement starts from a clean cursor
        unsafe {
            ffi::sqlite3_reset(stmt);
            ffi::sqlite3_clear_bindings(stmt);
        }

        let expected = unsafe { ffi::sqlite3_bind_parameter_count(stmt) } as usize;
        if params.len() != expected {
            return Err(DriverError::invalid_argument(format!(
                "statement expects {} parameters, {} supplied",
                expected,
                params.len()
            )));
        }

        for (i, value) in params.iter().enumerate() {
            let index = (i + 1) as c_int;
            let rc = unsafe {
                match value {
                    Value::Null => ffi::sqlite3_bind_null(stmt, index),
                    Value::Bool(v) => ffi::sqlite3_bind_int(stmt, index, *v as c_int),
                    Value::Int(v) => ffi::sqlite3_bind_int(stmt, index, *v),
                    Value::Long(v) | Value::Timestamp(v) => {
                        ffi::sqlite3_bind_int64(stmt, index, *v)
                    }
                    Value::Float(v) => ffi::sqlite3_bind_double(stmt, index, *v as f64),
                    Value::Double(v) => ffi::sqlite3_bind_double(stmt, index, *v),
                    Value::String(v) => ffi::sqlite3_bind_text(
                        stmt,
                        index,
                        v.as_ptr() as *const c_char,
                        v.len() as c_int,
                        ffi::SQLITE_TRANSIENT(),
                    ),
                    Value::Bytes(v) => ffi::sqlite3_bind_blob(
                        stmt,
                        index,
                        v.as_ptr() as *const c_void,
                        v.len() as c_int,
                        ffi::SQLITE_TRANSIENT(),
                    ),
                }
            };
            if rc != ffi::SQLITE_OK {
                return Err(DriverError::native(rc, errmsg(db)));
            }
        }

        // Row-less statements run to completion now; row-producing ones
        // are stepped lazily by fetch
        let field_count = unsafe { ffi::sqlite3_column_count(stmt) };
        let done = if field_count == 0 {
            step_to_completion(stmt)?;
            true
        } else {
            false
        };

        Ok(SqliteResultHandle {
            raw: Rc::clone(&handle.raw),
            done,
        })
    }

    fn fetch(handle: &mut Self::ResultHandle) -> Result<Option<Row>> {
        if handle.done {
            return Ok(None);
        }
        let stmt = handle.raw.stmt;
        match unsafe { ffi::sqlite3_step(stmt) } {
            ffi::SQLITE_ROW => Ok(Some(read_row(stmt))),
            ffi::SQLITE_DONE => {
                handle.done = true;
                Ok(None)
            }
            code => {
                let db = unsafe { ffi::sqlite3_db_handle(stmt) };
                Err(DriverError::native(code, errmsg(db)))
            }
        }
    }

    fn field_count(handle: &Self::ResultHandle) -> usize {
        unsafe { ffi::sqlite3_column_count(handle.raw.stmt) as usize }
    }

    fn affected_rows(handle: &Self::ResultHandle) -> u64 {
        let db = unsafe { ffi::sqlite3_db_handle(handle.raw.stmt) };
        unsafe { ffi::sqlite3_changes(db) }.max(0) as u64
    }

    fn last_generated_value(conn: &Self::ConnectionHandle) -> Option<Value> {
        let id = unsafe { ffi::sqlite3_last_insert_rowid(conn.db) };
        if id == 0 {
            None
        } else {
            Some(Value::Long(id))
        }
    }
}
