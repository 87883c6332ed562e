pub mod config;
pub mod error;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;

use config::Config;
use error::StoreError;
use service::SolverService;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{MemoryStore, SolutionStore};

/// Build the service described by `config`, loading the snapshot file if one is configured.
pub fn build_service(config: &Config) -> Result<SolverService, StoreError> {
    let store: Arc<dyn SolutionStore> = match &config.data_file {
        Some(path) => Arc::new(MemoryStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    Ok(SolverService::new(store, config.search_mode()))
}

/// Serve the solution API on `bind` until the process is stopped.
pub async fn start_server(bind: SocketAddr, service: SolverService) -> std::io::Result<()> {
    let app = routes::router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("listening on {} under {}", listener.local_addr()?, routes::BASE_PATH);
    axum::serve(listener, app).await
}
