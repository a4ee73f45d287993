//! Agora - conversation backend for persona agents

use bson::doc;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agora::db::schemas::{Metadata, PersonDoc, Role};
use agora::db::{Database, MongoClient};
use agora::{server, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("agora={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // Print startup banner
    info!("==================================");
    info!("  Agora - conversation backend");
    info!("==================================");
    info!("Listen: {}", args.listen);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("Database: {}", args.mongodb_db);
    info!("Model catalog: {}", args.catalog_base_url());
    info!("==================================");

    // Connect to MongoDB
    let mongo = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => {
            info!("MongoDB connected successfully");
            client
        }
        Err(e) => {
            error!("MongoDB connection failed: {}", e);
            std::process::exit(1);
        }
    };

    // Open collections, applying schema indexes
    let db = Database::open(&mongo).await?;

    // Seed a bootstrap admin so the authenticated surface is reachable
    // on a fresh database
    if let Some(token) = &args.bootstrap_admin_token {
        bootstrap_admin(&db, token).await;
    }

    let state = Arc::new(server::AppState::new(args, db));
    server::run(state).await?;

    Ok(())
}

/// Create an admin person with the given token when no live admin exists
async fn bootstrap_admin(db: &Database, token: &str) {
    match db.persons.find_one(doc! { "role": "admin" }).await {
        Ok(Some(_)) => {
            info!("Admin person already present, skipping bootstrap");
        }
        Ok(None) => {
            let mut admin = PersonDoc {
                _id: None,
                metadata: Metadata::new(),
                name: Some("administrator".to_string()),
                gender: None,
                birthday: None,
                email: None,
                phone: None,
                access_token: Some(token.to_string()),
                role: Role::Admin,
                language_preference: agora::db::schemas::LanguagePreference::English,
                address: None,
                description: Some("bootstrap admin".to_string()),
                avatar_url: None,
            };
            match db.persons.insert_one(&mut admin).await {
                Ok(id) => info!("Bootstrap admin created: {}", id.to_hex()),
                Err(e) => warn!("Failed to create bootstrap admin: {}", e),
            }
        }
        Err(e) => {
            warn!("Bootstrap admin check failed: {}", e);
        }
    }
}
