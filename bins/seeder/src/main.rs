//! Database seeder for Facturo development and testing.
//!
//! Seeds a demo workspace, contacts, products with opening stock, and the
//! standard NCF subtypes for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use facturo_db::entities::{contacts, document_subtypes, product_stock, products, workspaces};

/// Demo workspace ID (consistent for all seeds)
const DEMO_WORKSPACE_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = facturo_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding workspace...");
    seed_workspace(&db).await;

    println!("Seeding document subtypes...");
    seed_subtypes(&db).await;

    println!("Seeding contacts...");
    seed_contacts(&db).await;

    println!("Seeding products and stock...");
    seed_products(&db).await;

    println!("Seeding complete!");
}

fn demo_workspace_id() -> Uuid {
    Uuid::parse_str(DEMO_WORKSPACE_ID).unwrap()
}

async fn seed_workspace(db: &DatabaseConnection) {
    if workspaces::Entity::find_by_id(demo_workspace_id())
        .one(db)
        .await
        .expect("Failed to query workspaces")
        .is_some()
    {
        println!("  Workspace already seeded, skipping");
        return;
    }

    let now = Utc::now().into();
    workspaces::ActiveModel {
        id: Set(demo_workspace_id()),
        name: Set("Almacén Principal".to_string()),
        slug: Set("almacen-principal".to_string()),
        address: Set(Some("Av. 27 de Febrero 100, Santo Domingo".to_string())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to seed workspace");
}

async fn seed_subtypes(db: &DatabaseConnection) {
    let subtypes = [
        ("B01", "Factura de Crédito Fiscal", true),
        ("B02", "Factura de Consumo", false),
        ("B04", "Nota de Crédito", false),
    ];

    let now = Utc::now().into();
    for (prefix, name, is_default) in subtypes {
        let existing = document_subtypes::Entity::find()
            .filter(document_subtypes::Column::Prefix.eq(prefix))
            .one(db)
            .await
            .expect("Failed to query subtypes");
        if existing.is_some() {
            println!("  Subtype {prefix} already seeded, skipping");
            continue;
        }

        document_subtypes::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(format!("{prefix} - {name}")),
            prefix: Set(prefix.to_string()),
            start_number: Set(1),
            end_number: Set(Some(10_000_000)),
            next_number: Set(1),
            valid_until_date: Set(None),
            is_default: Set(is_default),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to seed subtype");
    }
}

async fn seed_contacts(db: &DatabaseConnection) {
    let demo_contacts = [
        ("Comercial Rodríguez SRL", Some("131456789")),
        ("Ferretería El Progreso", Some("101234567")),
        ("Juan Pérez", None),
    ];

    let now = Utc::now().into();
    for (name, rnc) in demo_contacts {
        contacts::ActiveModel {
            id: Set(Uuid::new_v4()),
            workspace_id: Set(demo_workspace_id()),
            name: Set(name.to_string()),
            rnc: Set(rnc.map(String::from)),
            email: Set(None),
            phone: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to seed contact");
    }
}

async fn seed_products(db: &DatabaseConnection) {
    let demo_products: [(&str, &str, i64, bool, i64); 4] = [
        ("Cemento Gris 42.5kg", "CEM-425", 545, true, 200),
        ("Varilla 3/8 x 20'", "VAR-38", 285, true, 500),
        ("Pintura Blanca 1gl", "PIN-BL1", 1250, true, 48),
        ("Servicio de Entrega", "SRV-ENT", 800, false, 0),
    ];

    let now = Utc::now().into();
    for (name, sku, price, track_stock, stock) in demo_products {
        let product_id = Uuid::new_v4();
        products::ActiveModel {
            id: Set(product_id),
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            description: Set(None),
            unit_price: Set(Decimal::from(price)),
            track_stock: Set(track_stock),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to seed product");

        if track_stock {
            product_stock::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                workspace_id: Set(demo_workspace_id()),
                quantity: Set(Decimal::from(stock)),
                minimum_quantity: Set(Decimal::from(stock / 10)),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(db)
            .await
            .expect("Failed to seed stock");
        }
    }
}
