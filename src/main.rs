use anyhow::Result;
use chrono::DateTime;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dockless_loader::config::AppConfig;
use dockless_loader::db::{self, PgFeedSink};
use dockless_loader::loader::{FeedLoader, LoadRequest};
use dockless_loader::models::feed::{EventLocationShape, Feed};
use dockless_loader::storage::S3ObjectStore;

#[derive(Parser)]
#[command(name = "dockless-loader")]
#[command(about = "Loads a dockless mobility provider feed dump into the database", long_about = None)]
struct Cli {
    /// Mobility provider name, e.g. "lemon"
    #[arg(short, long)]
    provider: String,

    /// Which provider feed to load
    #[arg(short, long, value_enum)]
    feed: FeedArg,

    /// Window start as epoch seconds or an RFC 3339 timestamp
    #[arg(short, long)]
    window_start: String,

    /// Shape of `event_location` in the status_changes feed
    #[arg(long, value_enum, default_value_t = LocationShapeArg::Bare)]
    event_location_shape: LocationShapeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeedArg {
    Trips,
    StatusChanges,
}

impl From<FeedArg> for Feed {
    fn from(arg: FeedArg) -> Self {
        match arg {
            FeedArg::Trips => Self::Trips,
            FeedArg::StatusChanges => Self::StatusChanges,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LocationShapeArg {
    Bare,
    Feature,
}

impl From<LocationShapeArg> for EventLocationShape {
    fn from(arg: LocationShapeArg) -> Self {
        match arg {
            LocationShapeArg::Bare => Self::Bare,
            LocationShapeArg::Feature => Self::Feature,
        }
    }
}

fn parse_window_start(raw: &str) -> Result<i64> {
    if let Ok(epoch) = raw.parse::<i64>() {
        return Ok(epoch);
    }
    Ok(DateTime::parse_from_rfc3339(raw)?.timestamp())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    let cli = Cli::parse();
    let window_start = parse_window_start(&cli.window_start)?;

    info!("Starting dockless feed load...");

    // Init DB
    let pool = db::init_pool(&config.database_url).await?;
    info!("Connected to database");

    let store = S3ObjectStore::from_env(&config.s3_bucket).await;
    let loader = FeedLoader::new(store, PgFeedSink::new(pool));

    let request = LoadRequest {
        provider_name: cli.provider,
        feed: cli.feed.into(),
        window_start,
        event_location_shape: cli.event_location_shape.into(),
    };

    let summary = loader.run(&request).await?;

    info!(
        key = %summary.key,
        records = summary.records_in,
        skipped = summary.records_skipped,
        dropped_short_routes = summary.trips_dropped_short_route,
        trips = summary.trips_written,
        route_points = summary.route_points_written,
        status_changes = summary.status_changes_written,
        "Load finished"
    );

    Ok(())
}
