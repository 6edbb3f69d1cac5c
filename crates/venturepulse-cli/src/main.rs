mod commands;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "venturepulse-cli")]
#[command(about = "VenturePulse command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Insert the default trend sources if none exist.
    SeedSources,
    /// Create a user with an API token.
    SeedUser {
        email: String,
        token: String,
        #[arg(long)]
        display_name: Option<String>,
    },
    /// Run a refresh cycle for every active trend source, or one source.
    RefreshSources {
        #[arg(long)]
        source: Option<Uuid>,
        /// Print what would be refreshed without touching anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the market validation pipeline for a project.
    Validate {
        project_id: Uuid,
        /// Explicit search keywords; omitted means stored or derived terms.
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = venturepulse_core::load_app_config()?;
    let pool_config = venturepulse_db::PoolConfig::from_app_config(&config);
    let pool = venturepulse_db::connect_pool(&config.database_url, pool_config).await?;
    venturepulse_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::SeedSources => commands::seed_sources(&pool).await,
        Commands::SeedUser {
            email,
            token,
            display_name,
        } => commands::seed_user(&pool, &email, &token, display_name.as_deref()).await,
        Commands::RefreshSources { source, dry_run } => {
            commands::refresh_sources(&pool, &config, source, dry_run).await
        }
        Commands::Validate {
            project_id,
            keywords,
        } => commands::validate(&pool, &config, project_id, keywords).await,
    }
}
