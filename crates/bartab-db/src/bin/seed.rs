//! # Demo Seeder
//!
//! Writes the demo catalog and the two demo tabs as the latest snapshot.
//!
//! ```bash
//! cargo run -p bartab-db --bin seed
//! cargo run -p bartab-db --bin seed -- --db ./data/bartab.db
//! cargo run -p bartab-db --bin seed -- --force
//! ```
//!
//! Without `--force` an existing snapshot is left alone.

use bartab_core::seed::demo_state;
use bartab_db::{Database, DbConfig};
use chrono::Utc;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bartab_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("bartab demo seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bartab_dev.db)");
                println!("  -f, --force        Seed even if snapshots already exist");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("bartab demo seeder");
    println!("==================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.snapshots().count().await?;
    if existing > 0 && !force {
        println!("⚠ Database already has {} snapshot(s)", existing);
        println!("  Pass --force to write the demo data on top.");
        return Ok(());
    }

    let state = demo_state(Utc::now());
    let id = db.snapshots().save(&state).await?;

    println!(
        "✓ Snapshot {} written: {} categories, {} products, {} open tabs",
        id,
        state.categories.len(),
        state.products.len(),
        state.orders.len()
    );

    db.close().await;
    Ok(())
}
