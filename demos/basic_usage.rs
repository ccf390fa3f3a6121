//! Basic driver usage example
//!
//! This example demonstrates the driver façade end to end:
//! - Creating a driver over the SQLite backend
//! - Creating and executing statements
//! - Iterating a forward-only result set
//! - Generated keys and affected-row counts
//!
//! Run with: cargo run --example basic_usage

use unidriver::prelude::*;

fn main() -> Result<()> {
    println!("=== Unidriver - Basic Usage Example ===\n");

    println!("1. Checking the environment...");
    SqliteDriver::check_environment()?;
    println!("   ✓ SQLite runtime available\n");

    // The connection opens lazily on first use
    let driver = SqliteDriver::with_defaults(ConnectionParams::new().database(":memory:"));

    println!("2. Creating table...");
    driver
        .create_statement(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                balance REAL
            )",
        )?
        .execute(&[])?;
    println!("   ✓ Table created\n");

    println!("3. Inserting data...");
    let users = vec![("alice", 1500.50), ("bob", 2300.75), ("charlie", 980.25)];

    let mut insert =
        driver.create_statement("INSERT INTO users (username, balance) VALUES (?, ?)")?;
    for (username, balance) in users {
        let mut result = insert.execute(&[Value::from(username), Value::from(balance)])?;
        println!(
            "   ✓ Inserted {} row(s), generated key {:?}",
            result.affected_rows()?,
            result.generated_value()
        );
    }
    println!();

    println!("4. Querying all users...");
    let mut select = driver.create_statement("SELECT * FROM users ORDER BY id")?;
    let mut result = select.execute(&[])?;
    println!("   Query returned {} row(s):", result.affected_rows()?);

    while let Some(row) = result.advance()? {
        let id = row.get("id").and_then(Value::as_long).unwrap_or(0);
        let username = row
            .get("username")
            .map(Value::as_string)
            .unwrap_or_default();
        let balance = row.get("balance").and_then(Value::as_double).unwrap_or(0.0);
        println!("   - User #{}: {} - Balance: ${:.2}", id, username, balance);
    }
    println!();

    println!("5. Querying with a parameter...");
    let mut select =
        driver.create_statement("SELECT username FROM users WHERE balance > ? ORDER BY balance")?;
    let result = select.execute(&[Value::Double(1000.0)])?;
    for row in result {
        let row = row?;
        let username = row
            .get("username")
            .map(Value::as_string)
            .unwrap_or_default();
        println!("   - {}", username);
    }
    println!();

    println!("6. Updating data...");
    let mut update = driver.create_statement("UPDATE users SET balance = balance + 100.0")?;
    let mut result = update.execute(&[])?;
    println!("   ✓ Updated {} row(s)\n", result.affected_rows()?);

    println!("=== Example completed successfully! ===");

    Ok(())
}
