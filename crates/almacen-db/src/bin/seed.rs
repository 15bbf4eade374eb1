//! Fills a store with a small grocery inventory for trying the report.
//!
//! ```bash
//! cargo run -p almacen-db --bin seed                        # 3 tags per product
//! cargo run -p almacen-db --bin seed -- --tags 10 --db ./data/almacen.db
//! ```
//!
//! Every NFC tag is created bound to its product, so each one books an
//! entrada. Every third product also gets one salida.

use almacen_core::{MovementType, NewCategory, NewNfcTag, NewProduct, NewStockMovement};
use almacen_db::{Database, DbConfig};
use chrono::Utc;
use std::env;

/// Demo catalog: (category, [(product, price in cents)])
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Bebidas",
        &[
            ("Agua natural 1L", 1_500),
            ("Refresco de cola 600ml", 1_800),
            ("Jugo de naranja 1L", 3_200),
            ("Café molido 500g", 9_900),
        ],
    ),
    (
        "Abarrotes",
        &[
            ("Arroz 1kg", 2_900),
            ("Frijol negro 1kg", 3_400),
            ("Aceite vegetal 1L", 4_200),
            ("Azúcar morena 1kg", 2_700),
        ],
    ),
    (
        "Lácteos",
        &[
            ("Leche entera 1L", 2_600),
            ("Queso fresco 400g", 6_500),
            ("Yogur natural 1kg", 4_800),
        ],
    ),
    (
        "Limpieza",
        &[
            ("Detergente 1kg", 5_500),
            ("Cloro 1L", 1_900),
            ("Jabón de barra", 1_200),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut tags_per_product: usize = 3;
    let mut db_path = String::from("./almacen_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tags" | "-t" => {
                if i + 1 < args.len() {
                    tags_per_product = args[i + 1].parse().unwrap_or(3);
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
                println!("Almacen Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -t, --tags <N>     NFC tags per product (default: 3)");
                println!("  -d, --db <PATH>    Database file path (default: ./almacen_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Almacen Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("NFC tags per product: {}", tags_per_product);
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

    let start = std::time::Instant::now();
    let today = Utc::now().date_naive();
    let mut products_created = 0usize;
    let mut tags_created = 0usize;
    let mut salidas = 0usize;

    for (category_idx, (category_name, products)) in CATALOG.iter().enumerate() {
        let category = db
            .categories()
            .create(&NewCategory {
                name: category_name.to_string(),
                image_path: None,
            })
            .await?;

        for (product_idx, (product_name, price_cents)) in products.iter().enumerate() {
            let product = db
                .products()
                .create(&NewProduct {
                    name: product_name.to_string(),
                    image_path: None,
                    price_cents: *price_cents,
                    description: format!("{} de demostración", product_name),
                    category_id: category.id.clone(),
                })
                .await?;
            products_created += 1;

            for tag_idx in 0..tags_per_product {
                let tag = NewNfcTag {
                    tag_id: format!("04:{:02X}:{:02X}:{:02X}", category_idx, product_idx, tag_idx),
                    status: "activa".to_string(),
                    assigned_on: today,
                    product_id: Some(product.id.clone()),
                };

                if let Err(e) = db.nfc_tags().create(&tag).await {
                    eprintln!("Failed to create tag {}: {}", tag.tag_id, e);
                    continue;
                }
                tags_created += 1;
            }

            if products_created % 3 == 0 {
                db.stock()
                    .record_movement(&NewStockMovement {
                        product_id: product.id.clone(),
                        nfc_tag_id: None,
                        quantity: 1,
                        movement_type: MovementType::Salida,
                        description: Some("Venta de mostrador".to_string()),
                    })
                    .await?;
                salidas += 1;
            }
        }
    }

    println!();
    println!(
        "✓ Created {} categories, {} products, {} NFC tags, {} salidas in {:?}",
        CATALOG.len(),
        products_created,
        tags_created,
        salidas,
        start.elapsed()
    );

    println!();
    println!("Stock report:");
    for row in db.stock().stock_report().await? {
        println!("  {:<28} {:>4}", row.product_name, row.stock());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
