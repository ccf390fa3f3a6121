//! Connection lifecycle management
//!
//! A [`Connection`] exclusively owns one native connection handle. It is
//! created unconnected from parameters, or already-connected from an
//! existing native handle, and connects idempotently on first use.

use super::backend::Backend;
use super::driver::DriverOptions;
use super::error::{DriverError, Result};
use super::profiler::{Profiler, ProfilerAware};
use super::value::Value;
use std::rc::Rc;

/// Connection parameters
///
/// Carries whatever subset of fields the target backend consumes; backends
/// ignore fields that do not apply to them.
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    database: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
}

impl ConnectionParams {
    /// Create empty connection parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database name or path
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the database host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the database port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username
    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Get the database name or path
    pub fn get_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Get the host
    pub fn get_host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Get the port
    pub fn get_port(&self) -> Option<u16> {
        self.port
    }

    /// Get the username
    pub fn get_username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Get the password
    pub fn get_password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

/// What a [`Driver`](super::driver::Driver) is constructed from
pub enum ConnectionSource<B: Backend> {
    /// Parameters for a connection to be opened lazily
    Params(ConnectionParams),
    /// A connection built elsewhere
    Established(Connection<B>),
    /// An already-open native handle
    Handle(B::ConnectionHandle),
}

impl<B: Backend> From<ConnectionParams> for ConnectionSource<B> {
    fn from(params: ConnectionParams) -> Self {
        ConnectionSource::Params(params)
    }
}

impl<B: Backend> From<Connection<B>> for ConnectionSource<B> {
    fn from(connection: Connection<B>) -> Self {
        ConnectionSource::Established(connection)
    }
}

/// A connection to one database, owning the native handle exclusively
pub struct Connection<B: Backend> {
    params: ConnectionParams,
    options: DriverOptions,
    handle: Option<B::ConnectionHandle>,
    in_transaction: bool,
    profiler: Option<Rc<dyn Profiler>>,
}

impl<B: Backend> Connection<B> {
    /// Create an unconnected connection from parameters
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            params,
            options: DriverOptions::default(),
            handle: None,
            in_transaction: false,
            profiler: None,
        }
    }

    /// Wrap an existing native handle; the connection is considered
    /// connected immediately
    pub fn from_handle(handle: B::ConnectionHandle) -> Self {
        Self {
            params: ConnectionParams::default(),
            options: DriverOptions::default(),
            handle: Some(handle),
            in_transaction: false,
            profiler: None,
        }
    }

    /// Replace the effective options used when connecting
    pub fn set_options(&mut self, options: DriverOptions) {
        self.options = options;
    }

    /// Check whether a native handle is held
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Open the native connection; repeated calls are no-ops
    pub fn connect(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }
        self.handle = Some(B::connect(&self.params, &self.options)?);
        log::debug!("connected ({} backend)", B::PLATFORM_NAME);
        Ok(())
    }

    /// Release the native handle
    ///
    /// An open transaction is rolled back best-effort before the handle is
    /// dropped.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.in_transaction {
            log::warn!("disconnecting with an open transaction, rolling back");
            if let Some(handle) = self.handle.as_mut() {
                let _ = B::execute_command(handle, "ROLLBACK");
            }
            self.in_transaction = false;
        }
        self.handle = None;
        Ok(())
    }

    /// Borrow the native handle, if connected
    pub fn resource(&self) -> Option<&B::ConnectionHandle> {
        self.handle.as_ref()
    }

    /// Mutably borrow the native handle, if connected
    pub fn resource_mut(&mut self) -> Option<&mut B::ConnectionHandle> {
        self.handle.as_mut()
    }

    /// Last generated key reported by the native library, if any
    pub fn last_generated_value(&self) -> Option<Value> {
        self.handle.as_ref().and_then(B::last_generated_value)
    }

    /// Begin a transaction; connects first if necessary
    pub fn begin(&mut self) -> Result<()> {
        self.connect()?;
        if self.in_transaction {
            return Err(DriverError::transaction("already in a transaction"));
        }
        self.run_command("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit the current transaction
    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(DriverError::transaction("not in a transaction"));
        }
        self.run_command("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    /// Roll back the current transaction
    pub fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(DriverError::transaction("not in a transaction"));
        }
        self.run_command("ROLLBACK")?;
        self.in_transaction = false;
        Ok(())
    }

    /// Check whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn run_command(&mut self, sql: &str) -> Result<()> {
        let handle = self
            .handle
            .as_mut()
            .ok_or_else(|| DriverError::connection("not connected"))?;
        if let Some(profiler) = &self.profiler {
            profiler.start(sql);
        }
        let outcome = B::execute_command(handle, sql);
        if let Some(profiler) = &self.profiler {
            profiler.finish();
        }
        outcome
    }
}

impl<B: Backend> ProfilerAware for Connection<B> {
    fn set_profiler(&mut self, profiler: Rc<dyn Profiler>) {
        self.profiler = Some(profiler);
    }
}

impl<B: Backend> Drop for Connection<B> {
    fn drop(&mut self) {
        // Best-effort rollback; the handle's own Drop releases the native
        // resource.
        if self.in_transaction {
            log::warn!("connection dropped with an open transaction, rolling back");
            if let Some(handle) = self.handle.as_mut() {
                let _ = B::execute_command(handle, "ROLLBACK");
            }
        }
    }
}
