//! # Seed Data Generator
//!
//! Populates a ledger database with a demo catalog and some history.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p stockledger-db --bin seed
//!
//! # Custom amount
//! cargo run -p stockledger-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p stockledger-db --bin seed -- --db ./data/stock.db
//! ```
//!
//! ## What Gets Written
//! Everything goes through `StockLedger`, so the seeded database has the
//! same shape as a real one:
//! - Products: code `{CATEGORY}-{NAME}-{INDEX}`, opening stock logged as
//!   `INITIAL_STOCK`
//! - A handful of sale batches, one return and one adjustment
//!
//! The run ends with a reconciliation check.

use std::env;

use stockledger_core::{
    BatchKind, BatchRequest, LedgerConfig, LineItem, NewProduct, PaymentMethod, Product,
};
use stockledger_db::{init_tracing, Database, DbConfig, StockLedger};

/// Catalog categories for demo data
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "BEV",
        "Beverages",
        &[
            "Cola",
            "Lemonade",
            "Iced Tea",
            "Orange Juice",
            "Sparkling Water",
            "Energy Drink",
            "Cold Brew",
            "Ginger Ale",
        ],
    ),
    (
        "SNK",
        "Snacks",
        &[
            "Potato Chips",
            "Pretzels",
            "Trail Mix",
            "Chocolate Bar",
            "Gummy Bears",
            "Popcorn",
            "Granola Bar",
            "Crackers",
        ],
    ),
    (
        "HWR",
        "Hardware",
        &[
            "Hammer",
            "Screwdriver Set",
            "Tape Measure",
            "Wood Screws",
            "Utility Knife",
            "Duct Tape",
            "Pliers",
            "Level",
        ],
    ),
    (
        "STA",
        "Stationery",
        &[
            "Ballpoint Pens",
            "Notebook",
            "Sticky Notes",
            "Stapler",
            "Highlighters",
            "Binder Clips",
            "Envelopes",
            "Printer Paper",
        ],
    ),
];

/// Size variants and their price add-on in cents
const SIZES: &[(&str, i64)] = &[("Small", 0), ("Regular", 75), ("Large", 150), ("Bulk", 900)];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Cash,
    PaymentMethod::ExternalCard,
    PaymentMethod::BankTransfer,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockledger_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stock Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockledger_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stock Ledger Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let ledger = StockLedger::new(db, LedgerConfig::from_env());

    // Catalog
    println!();
    println!("Adding products...");

    let start = std::time::Instant::now();
    let mut products: Vec<Product> = Vec::with_capacity(count);

    'catalog: for (category_idx, (prefix, category, names)) in CATEGORIES.iter().enumerate() {
        for (name_idx, name) in names.iter().enumerate() {
            for (size_idx, (size, addon)) in SIZES.iter().enumerate() {
                if products.len() >= count {
                    break 'catalog;
                }

                let seed = category_idx * 1000 + name_idx * 10 + size_idx;
                let new = generate_product(prefix, category, name, size, *addon, seed);

                match ledger.add_product(new).await {
                    Ok(product) => products.push(product),
                    Err(e) => eprintln!("Failed to add product: {}", e),
                }

                if products.len() % 50 == 0 && !products.is_empty() {
                    println!("  Added {} products...", products.len());
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!("✓ Added {} products in {:?}", products.len(), elapsed);

    // History
    println!();
    println!("Recording history...");

    let in_stock: Vec<&Product> = products.iter().filter(|p| p.quantity >= 4).collect();
    let mut sales = 0;

    for (n, pair) in in_stock.chunks(2).take(10).enumerate() {
        let lines = pair
            .iter()
            .map(|p| LineItem::new(&p.code, 1 + (n as i64 % 3), p.price_cents))
            .collect();
        let request = BatchRequest::new(BatchKind::Sale, lines)
            .paid_with(PAYMENT_METHODS[n % PAYMENT_METHODS.len()]);

        match ledger.submit(request).await {
            Ok(_) => sales += 1,
            Err(e) => eprintln!("Sale {} rejected: {}", n + 1, e.report().message),
        }
    }
    println!("  {} sale batches", sales);

    if let Some(first) = in_stock.first() {
        let ret = ledger
            .apply_batch(
                vec![LineItem::new(&first.code, 1, first.price_cents).with_note("Damaged box")],
                BatchKind::Return,
            )
            .await?;
        println!("  Return {}", ret);

        let adj = ledger
            .apply_batch(
                vec![LineItem::new(&first.code, -1, 0).with_note("Shrinkage")],
                BatchKind::Adjustment,
            )
            .await?;
        println!("  Adjustment {}", adj);
    }

    // Verify
    println!();
    println!("Verifying ledger...");

    let reports = ledger.reports();
    let drifted = reports
        .reconcile()
        .await?
        .into_iter()
        .filter(|row| !row.is_balanced())
        .count();
    let summary = reports.inventory_summary().await?;
    let low = reports.low_stock(None).await?;

    println!("  Units on hand: {}", summary.total_units);
    println!("  Stock value:   {} cents", summary.stock_value_cents);
    println!("  Low stock:     {} products", low.len());

    if drifted > 0 {
        println!("⚠ {} products do not reconcile with their movements", drifted);
    } else {
        println!("✓ Every product reconciles with its movements");
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one catalog entry with deterministic demo values.
fn generate_product(
    prefix: &str,
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewProduct {
    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let code = format!("{}-{}-{:04}", prefix, short, seed);

    // $0.99 - $24.99 plus size add-on
    let price_cents = 99 + ((seed * 37) % 2400) as i64 + price_addon;

    // 0 - 60 units
    let quantity = (seed % 61) as i64;

    NewProduct::new(code, format!("{} {}", name, size), price_cents, quantity, category)
}
