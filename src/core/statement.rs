//! Statement handling
//!
//! A [`Statement`] carries either SQL text (prepared lazily against the
//! driver's connection on first execution) or a pre-existing native
//! statement handle. Statements are produced by cloning the driver's
//! [`StatementPrototype`]; they hold a non-owning reference back to the
//! driver so that execution can wrap the native result handle through
//! [`Driver::create_result`](super::driver::Driver::create_result).

use super::backend::Backend;
use super::driver::{Driver, DriverInner};
use super::error::{DriverError, Result};
use super::profiler::{Profiler, ProfilerAware};
use super::result::ResultSet;
use super::value::Value;
use std::rc::{Rc, Weak};

/// Input accepted by [`Driver::create_statement`](super::driver::Driver::create_statement)
pub enum StatementSource<B: Backend> {
    /// SQL text, prepared lazily on execution
    Sql(String),
    /// A native statement handle prepared elsewhere
    Native(B::StatementHandle),
    /// No SQL yet
    Empty,
}

impl<B: Backend> From<&str> for StatementSource<B> {
    fn from(sql: &str) -> Self {
        StatementSource::Sql(sql.to_string())
    }
}

impl<B: Backend> From<String> for StatementSource<B> {
    fn from(sql: String) -> Self {
        StatementSource::Sql(sql)
    }
}

/// Configured template cloned for every created statement
#[derive(Clone, Default)]
pub struct StatementPrototype {
    profiler: Option<Rc<dyn Profiler>>,
}

impl StatementPrototype {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn instantiate<B: Backend>(&self, driver: Weak<DriverInner<B>>) -> Statement<B> {
        Statement {
            driver,
            sql: None,
            handle: None,
            profiler: self.profiler.clone(),
        }
    }
}

impl ProfilerAware for StatementPrototype {
    fn set_profiler(&mut self, profiler: Rc<dyn Profiler>) {
        self.profiler = Some(profiler);
    }
}

/// A preparable, executable unit of SQL
pub struct Statement<B: Backend> {
    driver: Weak<DriverInner<B>>,
    sql: Option<String>,
    handle: Option<B::StatementHandle>,
    profiler: Option<Rc<dyn Profiler>>,
}

impl<B: Backend> Statement<B> {
    /// The SQL text, if any
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    /// Replace the SQL text; preparation stays deferred
    pub fn set_sql<S: Into<String>>(&mut self, sql: S) {
        self.sql = Some(sql.into());
    }

    /// Attach a native statement handle directly
    pub fn set_resource(&mut self, handle: B::StatementHandle) {
        self.handle = Some(handle);
    }

    /// Borrow the native statement handle, if prepared
    pub fn resource(&self) -> Option<&B::StatementHandle> {
        self.handle.as_ref()
    }

    /// Check whether a native handle is attached
    pub fn is_prepared(&self) -> bool {
        self.handle.is_some()
    }

    /// Compile the stored SQL against the driver's connection
    ///
    /// Preparing twice is an error; so is preparing a statement that has
    /// no SQL.
    pub fn prepare(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(DriverError::statement("statement is already prepared"));
        }
        let sql = self
            .sql
            .clone()
            .ok_or_else(|| DriverError::statement("statement has no sql to prepare"))?;

        let inner = self.driver_inner()?;
        let mut connection = inner.connection.borrow_mut();
        connection.connect()?;
        let conn_handle = connection
            .resource_mut()
            .ok_or_else(|| DriverError::connection("not connected"))?;
        self.handle = Some(B::prepare(conn_handle, &sql)?);
        Ok(())
    }

    /// Execute with the given parameters, wrapping the native result
    /// handle into a [`ResultSet`] through the owning driver
    pub fn execute(&mut self, params: &[Value]) -> Result<ResultSet<B>> {
        let inner = self.driver_inner()?;
        if self.handle.is_none() {
            self.prepare()?;
        }
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| DriverError::statement("statement is not prepared"))?;

        if let Some(profiler) = &self.profiler {
            profiler.start(self.sql.as_deref().unwrap_or("<prepared statement>"));
        }
        let outcome = B::execute(handle, params);
        if let Some(profiler) = &self.profiler {
            profiler.finish();
        }
        let result_handle = outcome?;

        let driver = Driver::from_inner(inner);
        Ok(driver.create_result(result_handle, self.sql.as_deref()))
    }

    fn driver_inner(&self) -> Result<Rc<DriverInner<B>>> {
        self.driver
            .upgrade()
            .ok_or_else(|| DriverError::statement("statement is detached from its driver"))
    }
}

impl<B: Backend> ProfilerAware for Statement<B> {
    fn set_profiler(&mut self, profiler: Rc<dyn Profiler>) {
        self.profiler = Some(profiler);
    }
}

impl<B: Backend> std::fmt::Debug for Statement<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql)
            .field("prepared", &self.is_prepared())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::MemoryBackend;
    use crate::core::connection::ConnectionParams;

    fn driver() -> Driver<MemoryBackend> {
        Driver::with_defaults(ConnectionParams::new())
    }

    #[test]
    fn test_empty_statement_has_no_sql_and_no_handle() {
        let driver = driver();
        let statement = driver.create_statement(StatementSource::Empty).unwrap();
        assert_eq!(statement.sql(), None);
        assert!(!statement.is_prepared());
    }

    #[test]
    fn test_executing_statement_without_sql_fails() {
        let driver = driver();
        let mut statement = driver.create_statement(StatementSource::Empty).unwrap();
        let err = statement.execute(&[]).unwrap_err();
        assert!(matches!(err, DriverError::Statement(_)));
    }

    #[test]
    fn test_statement_does_not_keep_driver_alive() {
        let driver = driver();
        let mut statement = driver.create_statement("SELECT 1").unwrap();
        drop(driver);

        let err = statement.execute(&[]).unwrap_err();
        assert!(matches!(err, DriverError::Statement(_)));
    }

    #[test]
    fn test_double_prepare_fails() {
        let driver = driver();
        let mut statement = driver.create_statement("SELECT 1").unwrap();
        statement.prepare().unwrap();
        let err = statement.prepare().unwrap_err();
        assert!(matches!(err, DriverError::Statement(_)));
    }
}
