use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use coachdesk::config::{init_tracing, run_migrations, DatabaseConfig, DatabaseSeeder};

/// Load reference and demo data into a coachdesk database
#[derive(Debug, Parser)]
#[command(name = "seed", version)]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert the exercise catalog, keeping exercises that already exist
    Catalog,
    /// Wipe every table, then load the catalog plus demo accounts, workouts and assignments
    Demo {
        /// Anchor date for demo assignments (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let db_config = match cli.database_url {
        Some(url) => DatabaseConfig::with_url(url),
        None => DatabaseConfig::from_env()?,
    };
    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    let seeder = DatabaseSeeder::new(pool);
    match cli.command {
        Command::Catalog => {
            let created = seeder.seed_catalog().await?;
            println!("Catalog seeded: {} new exercises", created);
        }
        Command::Demo { today } => {
            seeder
                .seed_demo(today.unwrap_or_else(|| Utc::now().date_naive()))
                .await?;
            println!("Demo data loaded");
        }
    }

    Ok(())
}
