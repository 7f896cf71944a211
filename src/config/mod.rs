// Configuration: environment, database pool, logging, seed data

pub mod app;
pub mod database;
pub mod seeding;

pub use app::AppConfig;
pub use database::{run_migrations, DatabaseConfig};
pub use seeding::DatabaseSeeder;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global fmt subscriber. `RUST_LOG` wins over `log_level` when set.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coachdesk={0},tower_http={0},sqlx=warn", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
