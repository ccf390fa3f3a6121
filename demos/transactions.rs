//! Transaction handling example
//!
//! This example demonstrates transaction boundaries through the driver:
//! - Explicit begin/commit/rollback on the connection
//! - RAII transaction guard with automatic rollback
//!
//! Run with: cargo run --example transactions

use unidriver::prelude::*;

fn main() -> Result<()> {
    println!("=== Unidriver - Transactions Example ===\n");

    let driver = SqliteDriver::with_defaults(ConnectionParams::new().database(":memory:"));

    driver
        .create_statement("CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance REAL)")?
        .execute(&[])?;
    driver
        .create_statement("INSERT INTO accounts (id, balance) VALUES (1, 500.0), (2, 500.0)")?
        .execute(&[])?;
    println!("1. Two accounts created with $500.00 each\n");

    // Explicit transaction boundaries on the connection
    println!("2. Transferring $100 inside an explicit transaction...");
    driver.connection_mut().begin()?;
    driver
        .create_statement("UPDATE accounts SET balance = balance - 100.0 WHERE id = 1")?
        .execute(&[])?;
    driver
        .create_statement("UPDATE accounts SET balance = balance + 100.0 WHERE id = 2")?
        .execute(&[])?;
    driver.connection_mut().commit()?;
    println!("   ✓ Committed\n");

    print_balances(&driver)?;

    // Guard-based transaction that is dropped without commit
    println!("3. Attempting a transfer that is abandoned...");
    {
        let tx = TransactionGuard::begin(&driver)?;
        tx.execute(
            "UPDATE accounts SET balance = balance - 9999.0 WHERE id = 1",
            &[],
        )?;
        // The guard goes out of scope here without commit(): rollback
    }
    println!("   ✓ Guard dropped, transaction rolled back\n");

    print_balances(&driver)?;

    // Guard-based transaction that commits
    println!("4. Transferring $50 through a transaction guard...");
    let tx = TransactionGuard::begin(&driver)?;
    tx.execute(
        "UPDATE accounts SET balance = balance - 50.0 WHERE id = 2",
        &[],
    )?;
    tx.execute(
        "UPDATE accounts SET balance = balance + 50.0 WHERE id = 1",
        &[],
    )?;
    tx.commit()?;
    println!("   ✓ Committed\n");

    print_balances(&driver)?;

    println!("=== Example completed successfully! ===");

    Ok(())
}

fn print_balances(driver: &SqliteDriver) -> Result<()> {
    let mut statement = driver.create_statement("SELECT id, balance FROM accounts ORDER BY id")?;
    let result = statement.execute(&[])?;
    for row in result {
        let row = row?;
        let id = row.get("id").and_then(Value::as_long).unwrap_or(0);
        let balance = row.get("balance").and_then(Value::as_double).unwrap_or(0.0);
        println!("   Account #{}: ${:.2}", id, balance);
    }
    println!();
    Ok(())
}
