use bcrypt::{hash, DEFAULT_COST};
use chrono::Utc;
use portfolio_cms::db::{self, models::User, DbConfig};
use portfolio_cms::store::{PgStore, Store};
use std::env;
use uuid::Uuid;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin create-admin <USERNAME> <PASSWORD>");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let mut args = env::args().skip(1);
    let (Some(username), Some(password)) = (args.next(), args.next()) else {
        usage();
    };

    let url = env::var("DATABASE_URL").unwrap_or_else(|_| {
        eprintln!("DATABASE_URL must be set to create an admin account");
        std::process::exit(1);
    });

    let password_hash = match hash(&password, DEFAULT_COST) {
        Ok(hashed) => hashed,
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match db::init_pool(DbConfig {
        url,
        ..DbConfig::default()
    })
    .await
    {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Could not connect to the database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::run_migrations(&pool).await {
        eprintln!("Migrations failed: {}", e);
        std::process::exit(1);
    }

    let store = PgStore::new(pool);
    let user = User {
        id: Uuid::new_v4(),
        username: username.clone(),
        password_hash,
        is_admin: true,
        created_at: Utc::now(),
    };

    match store.insert_user(user).await {
        Ok(()) => println!("\nAdmin '{}' created (cost {}).\n", username, DEFAULT_COST),
        Err(e) => {
            eprintln!("Error creating admin: {}", e);
            std::process::exit(1);
        }
    }
}
