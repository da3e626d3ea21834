//! # Seed Data Generator
//!
//! Populates the database with a hardware-store catalog, delivery zones and
//! a few clients for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p cotiza-db --bin seed
//! cargo run -p cotiza-db --bin seed -- --db ./data/cotiza.db --seller seller-1
//! ```

use chrono::Utc;
use cotiza_core::{Client, DeliveryZone, Product};
use cotiza_db::{Database, DbConfig};
use std::env;
use uuid::Uuid;

/// (reference prefix, product family, base price in COP)
const FAMILIES: &[(&str, &str, i64)] = &[
    ("TUB", "Tubería PVC", 18_500),
    ("COD", "Codo galvanizado", 4_200),
    ("LLP", "Llave de paso", 32_000),
    ("TAL", "Taladro percutor", 289_000),
    ("DIS", "Disco de corte", 9_800),
    ("PIN", "Pintura vinilo", 64_000),
    ("CAB", "Cable eléctrico", 2_300),
    ("BRO", "Broca para concreto", 7_500),
];

const SIZES: &[(&str, i64)] = &[("1/2\"", 0), ("3/4\"", 2_500), ("1\"", 6_000), ("2\"", 14_000)];

/// (neighborhood, fee in COP)
const ZONES: &[(&str, i64)] = &[
    ("Centro", 6_000),
    ("El Rodadero", 12_000),
    ("Bastidas", 8_000),
    ("Gaira", 10_000),
    ("Mamatoco", 9_000),
];

const CLIENTS: &[(&str, &str, &str)] = &[
    ("Ferretería El Tornillo", "3001234567", "900123456-1"),
    ("Constructora Caribe SAS", "3157654321", "901987654-3"),
    ("María José Gómez", "3209876543", "1082345678"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./cotiza_dev.db");
    let mut seller_id = String::from("seller-dev");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--seller" | "-s" => {
                if i + 1 < args.len() {
                    seller_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cotiza Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: ./cotiza_dev.db)");
                println!("  -s, --seller <ID>    Seller owning the clients (default: seller-dev)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Cotiza Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Seller:   {}", seller_id);
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

    let now = Utc::now();
    let mut generated = 0;

    for (prefix, family, base_price) in FAMILIES {
        for (idx, (size, addon)) in SIZES.iter().enumerate() {
            let product = Product {
                id: Uuid::new_v4().to_string(),
                reference: format!("{}-{:02}", prefix, idx + 1),
                name: format!("{} {}", family, size),
                brand: None,
                sale_price: base_price + addon,
                stock: 20 + (idx as i64) * 5,
                image_url: None,
                created_at: now,
                updated_at: now,
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.reference, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Generated {} products", generated);

    for (neighborhood, price) in ZONES {
        db.zones()
            .insert(&DeliveryZone {
                id: Uuid::new_v4().to_string(),
                neighborhood: neighborhood.to_string(),
                price: *price,
                created_at: now,
            })
            .await?;
    }
    println!("✓ Generated {} delivery zones", ZONES.len());

    for (name, phone, tax_id) in CLIENTS {
        db.clients()
            .insert(&Client {
                id: Uuid::new_v4().to_string(),
                seller_id: seller_id.clone(),
                name: name.to_string(),
                phone: Some(phone.to_string()),
                tax_id: Some(tax_id.to_string()),
                email: None,
                address: None,
                city: Some("Santa Marta".to_string()),
                created_at: now,
            })
            .await?;
    }
    println!("✓ Generated {} clients", CLIENTS.len());

    db.close().await;
    Ok(())
}
