//! # Seed Data Generator
//!
//! Populates a database with the default menu and a few sample vouchers.
//!
//! ## Usage
//! ```bash
//! # Seed ./menu_dev.db
//! cargo run -p menu-db --bin seed
//!
//! # Specify database path, skip the vouchers
//! cargo run -p menu-db --bin seed -- --db ./data/menu.db --no-vouchers
//! ```
//!
//! Seeding is idempotent: a non-empty catalog is left alone, and voucher
//! codes that already exist are skipped.

use chrono::{Duration, Utc};
use std::env;

use menu_core::catalog::default_menu;
use menu_core::voucher::VoucherDraft;
use menu_core::{Discount, Money, Percent};
use menu_db::repository::voucher::generate_voucher_id;
use menu_db::{Database, DbConfig, DbError, SeedOutcome};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = "./menu_dev.db".to_string();
    let mut with_vouchers = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-vouchers" => with_vouchers = false,
            "--help" | "-h" => {
                println!("Menu Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./menu_dev.db)");
                println!("      --no-vouchers  Only seed the menu");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Menu Seed Data Generator");
    println!("========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let now = Utc::now();
    match db.products().seed_defaults(&default_menu(now)).await? {
        SeedOutcome::Inserted(n) => println!("✓ Inserted {} menu items", n),
        SeedOutcome::AlreadySeeded(n) => {
            println!("⚠ Catalog already has {} products, left unchanged", n)
        }
    }

    if with_vouchers {
        for draft in sample_vouchers(now) {
            let code = draft.code.clone();
            let voucher = draft.into_voucher(generate_voucher_id(), now)?;
            match db.vouchers().insert(&voucher).await {
                Ok(_) => println!("✓ Voucher {}", code),
                Err(DbError::UniqueViolation { .. }) => {
                    println!("⚠ Voucher {} already exists, skipped", code)
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn sample_vouchers(now: chrono::DateTime<Utc>) -> Vec<VoucherDraft> {
    vec![
        VoucherDraft {
            code: "WELCOME10".to_string(),
            discount: Discount::Percentage(Percent::from_whole(10)),
            min_order_value_cents: 5_000,
            category: None,
            start_date: Some(now),
            expiry_date: now + Duration::days(90),
            max_uses: None,
            is_active: true,
        },
        VoucherDraft {
            code: "SAVE20".to_string(),
            discount: Discount::Fixed(Money::from_cents(2_000)),
            min_order_value_cents: 10_000,
            category: None,
            start_date: Some(now),
            expiry_date: now + Duration::days(30),
            max_uses: Some(100),
            is_active: true,
        },
    ]
}
