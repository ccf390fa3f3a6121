//! Native database library contract
//!
//! This module defines the trait every native backend must implement. The
//! rest of the crate treats backend handles as opaque resources: it never
//! inspects them, only threads them between the primitives declared here.
//! Handle types are expected to release their native resource exactly once
//! when dropped, on every exit path.

use super::connection::ConnectionParams;
use super::driver::DriverOptions;
use super::error::Result;
use super::value::{Row, Value};

/// Parameter placeholder convention of a database platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    /// Named placeholders, e.g. `:name`
    Named,
    /// Positional placeholders, e.g. `?`
    Positional,
}

impl ParameterStyle {
    /// Apply the platform's bind-marker convention to a parameter name
    pub fn format_parameter_name(&self, name: &str) -> String {
        match self {
            ParameterStyle::Named => format!(":{}", name),
            ParameterStyle::Positional => "?".to_string(),
        }
    }
}

/// Contract between the driver layer and one native database library.
///
/// A backend is a set of stateless primitives over three opaque handle
/// types. Every call blocks the calling thread until the native library
/// returns; handles are not presumed safe to share between threads.
pub trait Backend: Sized + 'static {
    /// Opaque native connection handle, exclusively owned by a `Connection`
    type ConnectionHandle;
    /// Opaque native statement handle, owned by a `Statement` once prepared
    type StatementHandle;
    /// Opaque native result handle, owned by a `ResultSet`
    type ResultHandle;

    /// Human-readable platform name, e.g. `"SQLite"`
    const PLATFORM_NAME: &'static str;

    /// Parameter placeholder convention of this platform
    const PREPARE_TYPE: ParameterStyle;

    /// Option keys this backend recognizes; anything else supplied at
    /// driver construction is silently dropped
    const RECOGNIZED_OPTIONS: &'static [&'static str];

    /// Verify the native capability is present and usable, without opening
    /// a connection
    fn check_environment() -> Result<()>;

    /// Open a native connection
    fn connect(
        params: &ConnectionParams,
        options: &DriverOptions,
    ) -> Result<Self::ConnectionHandle>;

    /// Run a complete command that produces no rows (transaction
    /// boundaries, pragmas)
    fn execute_command(conn: &mut Self::ConnectionHandle, sql: &str) -> Result<()>;

    /// Compile SQL into a native statement handle
    fn prepare(conn: &mut Self::ConnectionHandle, sql: &str) -> Result<Self::StatementHandle>;

    /// Runtime check that a handle is of the statement kind and usable;
    /// factory methods reject handles failing this with `InvalidArgument`
    fn statement_handle_usable(handle: &Self::StatementHandle) -> bool;

    /// Bind parameters and execute, producing a native result handle
    fn execute(handle: &mut Self::StatementHandle, params: &[Value]) -> Result<Self::ResultHandle>;

    /// Fetch the next row from a result handle; `None` is the end of the
    /// stream. The native cursor only moves forward.
    fn fetch(handle: &mut Self::ResultHandle) -> Result<Option<Row>>;

    /// Number of fields the result handle carries; zero for row-less
    /// statements
    fn field_count(handle: &Self::ResultHandle) -> usize;

    /// The native "rows affected" count for the handle
    fn affected_rows(handle: &Self::ResultHandle) -> u64;

    /// Last generated key reported by the connection, if this platform
    /// supports generated keys
    fn last_generated_value(conn: &Self::ConnectionHandle) -> Option<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_formatting() {
        assert_eq!(ParameterStyle::Named.format_parameter_name("id"), ":id");
        assert_eq!(ParameterStyle::Positional.format_parameter_name("id"), "?");
    }
}
