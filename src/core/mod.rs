//! Core driver abstraction types
//!
//! This module provides the backend-independent building blocks of the
//! driver layer: the native-library contract, the driver façade, connection
//! and statement handling, forward-only result sets, the feature registry,
//! profiling and error types.

pub mod backend;
pub mod connection;
pub mod driver;
pub mod error;
pub mod feature;
pub mod profiler;
pub mod result;
pub mod statement;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use backend::{Backend, ParameterStyle};
pub use connection::{Connection, ConnectionParams, ConnectionSource};
pub use driver::{Driver, DriverOptions};
pub use error::{DriverError, Result};
pub use feature::{Feature, FeatureSet, FeatureSetup, RowCountFn, RowCounter};
pub use profiler::{LogProfiler, Profiler, ProfilerAware};
pub use result::{ResultPrototype, ResultSet};
pub use statement::{Statement, StatementPrototype, StatementSource};
pub use transaction::TransactionGuard;
pub use value::{Row, Value};
