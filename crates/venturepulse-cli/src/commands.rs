//! Command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-source failures during a refresh run are logged and
//! skipped rather than propagated so one broken feed does not abort the
//! full run.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use venturepulse_ai::OpenAiClient;
use venturepulse_core::{AppConfig, SourceType};
use venturepulse_pipeline::{
    refresh_source, validate_project, PgStore, RefreshLocks, RefreshTarget, ValidationOptions,
};
use venturepulse_signals::{FeedClient, RedditClient, SearchOptions};

/// Insert the default trend sources: the Hacker News API source and the
/// Reddit insights RSS feed. A no-op when any source already exists.
pub(crate) async fn seed_sources(pool: &PgPool) -> anyhow::Result<()> {
    let existing = venturepulse_db::sources::list_sources(pool).await?;
    if !existing.is_empty() {
        println!("{} trend sources already present; nothing to seed", existing.len());
        return Ok(());
    }

    venturepulse_db::sources::create_source(pool, "Hacker News", SourceType::HackerNews, None)
        .await?;
    venturepulse_db::sources::create_source(
        pool,
        "Reddit Insights",
        SourceType::Reddit,
        Some("https://www.reddit-insights.com/topic/marketing-opportunities/rss.xml"),
    )
    .await?;

    println!("seeded 2 trend sources");
    Ok(())
}

/// Create a user row with the given API token.
pub(crate) async fn seed_user(
    pool: &PgPool,
    email: &str,
    token: &str,
    display_name: Option<&str>,
) -> anyhow::Result<()> {
    let id = venturepulse_db::users::create_user(pool, email, token, display_name).await?;
    println!("created user {id} ({email})");
    Ok(())
}

/// Run a refresh cycle for one source or every active source.
pub(crate) async fn refresh_sources(
    pool: &PgPool,
    config: &AppConfig,
    source_filter: Option<Uuid>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let sources = match source_filter {
        Some(id) => {
            let source = venturepulse_db::sources::get_source(pool, id).await?;
            if !source.is_active {
                anyhow::bail!(
                    "source {} is inactive; activate it before refreshing",
                    source.name
                );
            }
            vec![source]
        }
        None => venturepulse_db::sources::list_active_sources(pool).await?,
    };

    if sources.is_empty() {
        println!("no active trend sources");
        return Ok(());
    }

    if dry_run {
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        println!(
            "dry-run: would refresh {} sources: [{}]",
            sources.len(),
            names.join(", ")
        );
        return Ok(());
    }

    let feed = FeedClient::new(config.fetch_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build feed client: {e}"))?;
    let store = PgStore::new(pool.clone());
    let locks = RefreshLocks::new();

    for source in &sources {
        let target = RefreshTarget {
            id: source.id,
            source_type: source.source_type,
            feed_url: source.feed_url.clone(),
        };
        match refresh_source(
            &store,
            &feed,
            &locks,
            &target,
            config.refresh_item_limit,
            Utc::now(),
        )
        .await
        {
            Ok(report) => println!(
                "{}: fetched {}, inserted {}, pruned {}",
                source.name,
                report.fetched,
                report.inserted,
                report.pruned_old + report.pruned_today
            ),
            Err(e) => eprintln!("error: refresh of {} failed: {e}", source.name),
        }
    }

    Ok(())
}

/// Run the full validation pipeline for one project.
pub(crate) async fn validate(
    pool: &PgPool,
    config: &AppConfig,
    project_id: Uuid,
    keywords: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let (Some(client_id), Some(client_secret)) = (
        config.reddit_client_id.clone(),
        config.reddit_client_secret.clone(),
    ) else {
        anyhow::bail!("REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET are required for validation");
    };

    let search = RedditClient::connect(&venturepulse_signals::sources::RedditCredentials {
        client_id,
        client_secret,
        user_agent: config.reddit_user_agent.clone(),
    })
    .await
    .map_err(|e| anyhow::anyhow!("reddit authentication failed: {e}"))?;

    let analyst = OpenAiClient::new(
        config.openai_api_key.as_deref().unwrap_or_default(),
        &config.openai_model,
        config.fetch_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build analysis client: {e}"))?;

    let store = PgStore::new(pool.clone());
    let opts = ValidationOptions {
        search: SearchOptions {
            limit: config.search_result_limit,
            ..SearchOptions::default()
        },
        ..ValidationOptions::default()
    };

    match validate_project(&store, &search, &analyst, project_id, keywords, &opts).await {
        Ok(report) => {
            println!("keywords: [{}]", report.keywords.join(", "));
            println!(
                "signals: {} found, {} newly stored",
                report.signals_found, report.newly_stored
            );
            match (report.score, report.summary) {
                (Some(score), Some(summary)) => {
                    println!("score: {score}/100");
                    println!("summary: {summary}");
                }
                _ => println!("no signals found; project scored without an assessment"),
            }
            Ok(())
        }
        Err(failure) => {
            if failure.rollback_error.is_some() {
                eprintln!("warning: project could not be reverted to the idea state");
            }
            Err(anyhow::anyhow!("validation failed: {}", failure.primary))
        }
    }
}
