//! Create an admin account.
//!
//! Usage: `cargo run --bin seed-admin -- [email] [password] [name]`
//!
//! Defaults to admin@example.com / admin123 when arguments are omitted.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogdesk::{
    config::Config,
    db::{self, repositories::SqlxAdminRepository},
    services::{AuthService, AuthServiceError, TokenCodec},
};

const DEFAULT_EMAIL: &str = "admin@example.com";
const DEFAULT_PASSWORD: &str = "admin123";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blogdesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let email = args.next().unwrap_or_else(|| DEFAULT_EMAIL.to_string());
    let password = args.next().unwrap_or_else(|| DEFAULT_PASSWORD.to_string());
    let name = args.next();

    let config_path = std::env::var("BLOGDESK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yml"));
    let config = Config::load_with_env(&config_path)?;
    config.validate()?;

    let pool = db::create_pool(&config.database).await?;
    db::migrations::run_migrations(&pool).await?;

    let auth_service = AuthService::new(
        SqlxAdminRepository::boxed(pool.clone()),
        TokenCodec::new(&config.auth.jwt_secret, config.auth.token_ttl_seconds()),
    );

    let result = auth_service
        .create_admin(&email, &password, name.as_deref())
        .await;
    pool.close().await;

    match result {
        Ok(admin) => {
            println!("Admin {} created (id {})", admin.email, admin.id);
            Ok(())
        }
        Err(AuthServiceError::AdminExists(existing)) => {
            println!("Admin {} already exists", existing);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
