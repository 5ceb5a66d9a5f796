//! Build the zone dataset once and write it to disk, without starting the server

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zone_atlas_service::app::{build_dataset_service, load_catalog};
use zone_atlas_service::config::Config;
use zone_atlas_service::merge::AlignmentPolicy;

#[derive(Parser, Debug)]
#[command(name = "build-dataset")]
#[command(about = "Fetch survey sheets, join zone boundaries and write GeoJSON", long_about = None)]
struct Args {
    /// Output file (defaults to OUTPUT_PATH or data2.geojson)
    #[arg(short, long)]
    output: Option<String>,

    /// Boundary source, URL or local file (defaults to GEOMETRY_SOURCE)
    #[arg(short, long)]
    geometry: Option<String>,

    /// JSON subject catalog replacing the built-in one
    #[arg(short, long, env = "CATALOG_PATH")]
    catalog: Option<String>,

    /// strict or lenient handling of misaligned rows and unmatched zones
    #[arg(short, long)]
    policy: Option<AlignmentPolicy>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(geometry) = args.geometry {
        config.geometry_source = geometry;
    }
    if args.catalog.is_some() {
        config.catalog_path = args.catalog;
    }
    if let Some(policy) = args.policy {
        config.alignment_policy = policy;
    }

    let catalog = load_catalog(&config)?;
    let subjects: Vec<String> = catalog.subject_names().map(str::to_string).collect();
    let service = build_dataset_service(&config, catalog);

    println!("Building dataset ({} policy)...", config.alignment_policy);
    let collection = service.rebuild().await?;

    println!("Wrote {} features to {}", collection.len(), config.output_path);
    for subject in &subjects {
        let filled = collection
            .features
            .iter()
            .filter(|f| f.property(subject).is_some_and(|v| !v.is_null()))
            .count();
        println!("  {subject}: {filled} zones with data");
    }
    let with_geometry = collection
        .features
        .iter()
        .filter(|f| f.geometry.is_some())
        .count();
    println!("  geometry: {with_geometry} zones");

    Ok(())
}
