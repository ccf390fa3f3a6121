//! # Unidriver
//!
//! A portable database driver abstraction layer: one contract over
//! heterogeneous native database APIs, covering connection lifecycle,
//! statement preparation, forward-only result iteration, generated-key
//! retrieval and named feature extensions.
//!
//! ## Design
//!
//! - **One contract**: every native library is described by the
//!   [`Backend`](core::Backend) trait — three opaque handle types plus the
//!   blocking primitives over them. The driver, connection, statement and
//!   result logic is implemented once, generic over the backend.
//! - **Prototype cloning**: a [`Driver`](core::Driver) holds a configured
//!   statement template and result template; every created statement or
//!   result set is a clone of its template initialized with the call's
//!   native resources.
//! - **Forward-only results**: a [`ResultSet`](core::ResultSet) drives its
//!   native handle strictly forward; rewinding after any forward movement
//!   is refused.
//! - **Scoped ownership**: each native handle is wrapped in a type that
//!   releases the resource exactly once when dropped.
//! - **Single logical flow**: everything is synchronous and blocking, and
//!   no type claims to be thread-safe; one flow owns one native handle at
//!   a time.
//!
//! ## Supported backends
//!
//! | Backend | Status | Notes |
//! |---------|--------|-------|
//! | SQLite | Implemented | Bundled native library, feature `sqlite` |
//! | Memory | Implemented | Scriptable, for tests and prototyping |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unidriver::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let driver = SqliteDriver::with_defaults(ConnectionParams::new().database("app.db"));
//!
//!     let mut statement =
//!         driver.create_statement("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!     statement.execute(&[])?;
//!
//!     let mut statement = driver.create_statement("INSERT INTO users (name) VALUES (?)")?;
//!     let result = statement.execute(&[Value::from("Alice")])?;
//!     println!("generated key: {:?}", result.generated_value());
//!
//!     let mut statement = driver.create_statement("SELECT id, name FROM users")?;
//!     let mut result = statement.execute(&[])?;
//!     while let Some(row) = result.advance()? {
//!         println!("user: {}", row["name"].as_string());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Scripted backend
//!
//! ```rust
//! use unidriver::backends::memory::{CannedResponse, MemoryConnectionHandle};
//! use unidriver::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let handle = MemoryConnectionHandle::new();
//!     handle.push_response(
//!         CannedResponse::new()
//!             .columns(["id", "name"])
//!             .row([Value::Long(1), Value::from("Alice")]),
//!     );
//!
//!     let driver = MemoryDriver::with_defaults(ConnectionSource::Handle(handle));
//!     let mut statement = driver.create_statement("SELECT id, name FROM users")?;
//!     let mut result = statement.execute(&[])?;
//!     assert!(result.advance()?.is_some());
//!     Ok(())
//! }
//! ```

/// Core driver abstraction types and traits
pub mod core;

/// Database backend implementations
pub mod backends;

/// Driver over the scriptable in-memory backend
pub type MemoryDriver = core::Driver<backends::MemoryBackend>;

/// Driver over the bundled SQLite library
#[cfg(feature = "sqlite")]
pub type SqliteDriver = core::Driver<backends::SqliteBackend>;

/// Prelude for convenient imports
///
/// ```rust
/// use unidriver::prelude::*;
///
/// fn main() -> Result<()> {
///     let driver = MemoryDriver::with_defaults(ConnectionParams::new());
///     driver.create_statement(StatementSource::Empty)?;
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::core::{
        Backend, Connection, ConnectionParams, ConnectionSource, Driver, DriverError,
        DriverOptions, Feature, FeatureSetup, LogProfiler, ParameterStyle, Profiler,
        ProfilerAware, Result, ResultSet, Row, RowCounter, Statement, StatementSource,
        TransactionGuard, Value,
    };

    pub use crate::MemoryDriver;

    #[cfg(feature = "sqlite")]
    pub use crate::SqliteDriver;
}

// Re-export at root level for convenience
pub use core::{
    Backend, Connection, ConnectionParams, ConnectionSource, Driver, DriverError, DriverOptions,
    Feature, FeatureSetup, ParameterStyle, Profiler, Result, ResultSet, Row, Statement,
    StatementSource, TransactionGuard, Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        use prelude::*;

        let driver = MemoryDriver::with_defaults(ConnectionParams::new());
        assert_eq!(MemoryDriver::platform_name(), "Memory");
        assert!(driver.get_feature("RowCounter").is_some());
    }

    #[test]
    fn test_value_conversions() {
        let val: Value = 42.into();
        assert_eq!(val.as_int(), Some(42));

        let val: Value = "test".into();
        assert_eq!(val.as_string(), "test");

        let val: Value = true.into();
        assert_eq!(val.as_bool(), Some(true));
    }
}
