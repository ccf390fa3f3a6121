//! Transaction guard for automatic rollback on drop
//!
//! RAII wrapper over the connection's transaction boundary primitives. If
//! the guard is dropped without `commit()`, the transaction is rolled back.

use super::backend::Backend;
use super::driver::Driver;
use super::error::Result;
use super::result::ResultSet;
use super::value::Value;

/// Transaction guard that rolls back on drop unless committed
///
/// # Example
///
/// ```ignore
/// let tx = TransactionGuard::begin(&driver)?;
/// tx.execute("UPDATE accounts SET balance = balance - 100 WHERE id = 1", &[])?;
/// tx.execute("UPDATE accounts SET balance = balance + 100 WHERE id = 2", &[])?;
/// tx.commit()?;
/// ```
pub struct TransactionGuard<B: Backend> {
    driver: Driver<B>,
    committed: bool,
    rolled_back: bool,
}

impl<B: Backend> TransactionGuard<B> {
    /// Begin a transaction on the driver's connection
    pub fn begin(driver: &Driver<B>) -> Result<Self> {
        driver.connection_mut().begin()?;
        Ok(Self {
            driver: driver.clone(),
            committed: false,
            rolled_back: false,
        })
    }

    /// Prepare and execute a statement within the transaction
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<ResultSet<B>> {
        let mut statement = self.driver.create_statement(sql)?;
        statement.execute(params)
    }

    /// Commit the transaction; the guard will not roll back afterwards
    pub fn commit(mut self) -> Result<()> {
        self.driver.connection_mut().commit()?;
        self.committed = true;
        Ok(())
    }

    /// Explicitly roll back the transaction
    ///
    /// Rarely needed, as rollback happens automatically on drop.
    pub fn rollback(mut self) -> Result<()> {
        self.driver.connection_mut().rollback()?;
        self.rolled_back = true;
        Ok(())
    }
}

impl<B: Backend> Drop for TransactionGuard<B> {
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            log::warn!("transaction guard dropped without commit, rolling back");
            if let Err(err) = self.driver.connection_mut().rollback() {
                log::warn!("automatic rollback failed: {}", err);
            }
        }
    }
}
