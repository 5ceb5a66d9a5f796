use std::sync::Arc;

use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::geometry::{GeometryLoader, GeometrySource};
use crate::services::DatasetService;
use crate::sheet_fetcher::SheetFetcher;
use crate::store::GeoJsonStore;

/// Load the subject catalog named by the config, or the built-in one
pub fn load_catalog(config: &Config) -> Result<Catalog, Box<dyn std::error::Error>> {
    match &config.catalog_path {
        Some(path) => {
            info!("Loading subject catalog from {}", path);
            Ok(Catalog::from_json_file(path)?)
        }
        None => Ok(Catalog::default()),
    }
}

/// Wire fetchers, store and catalog into a [`DatasetService`]
pub fn build_dataset_service(config: &Config, catalog: Catalog) -> DatasetService {
    DatasetService::new(
        SheetFetcher::new(config.sheets_base_url.clone()),
        GeometryLoader::new(GeometrySource::parse(&config.geometry_source)),
        Arc::new(catalog),
        GeoJsonStore::new(&config.output_path),
        config.alignment_policy,
    )
}

/// Running HTTP server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let catalog = load_catalog(&config)?;
        info!(
            "Catalog has {} subjects: {:?}",
            catalog.subjects.len(),
            catalog.subject_names().collect::<Vec<_>>()
        );

        let dataset_service = build_dataset_service(&config, catalog);
        let app = create_router(AppState { dataset_service }).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
