//! 📦 osl: bulk-load documents into an OpenSearch index, then ask it questions.
//!
//! 🧠 Knowledge graph:
//! - [`transport`]: the only place bytes leave the process.
//! - [`encoder`] → [`loader`]: documents become NDJSON pages, pages go to `/_bulk` one at a time.
//! - [`settings`] + [`orchestrator`]: refresh off, load, refresh back on. Always back on.
//! - [`query`]: one filtered, sorted search.
//! - [`lifecycle`]: create / delete / list indices.
//! - [`app_config`]: figment layering of env vars and TOML.
//!
//! 🦆 The duck has no module. The duck is everywhere.

pub mod app_config;
pub mod document;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod lifecycle;
pub mod loader;
pub mod orchestrator;
pub mod progress;
pub mod query;
pub mod settings;
pub mod transport;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

pub use crate::app_config::AppConfig;
pub use crate::document::Document;
pub use crate::encoder::BulkEncoder;
pub use crate::error::{Error, Result};
pub use crate::generator::{DocumentSource, FakeDocumentSource, IterDocumentSource};
pub use crate::lifecycle::{IndexCreateSettings, IndexLifecycle};
pub use crate::loader::{BulkLoader, LoadSummary, PagePlan};
pub use crate::orchestrator::{IngestOptions, IngestReport, IngestState, IngestionOrchestrator};
pub use crate::progress::{LoadProgress, NoProgress, ProgressMetrics, ProgressObserver};
pub use crate::query::{QueryClient, QuerySpec, SortKey, SortOrder};
pub use crate::settings::IndexSettingsController;
pub use crate::transport::{ClusterConfig, EngineRequest, HttpTransport, InMemoryTransport, Transport};

/// 🎯 What the caller wants done. Every knob lives in [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ingest,
    Search,
    CreateIndex,
    DeleteIndex,
    ListIndices,
}

/// 🚀 Run one command against the configured cluster.
///
/// Returns whatever should be printed: the raw engine body for searches and lifecycle calls,
/// a one-line summary for ingest.
pub async fn run(app_config: AppConfig, command: Command) -> anyhow::Result<Option<String>> {
    let transport: Arc<dyn Transport> = Arc::new(
        HttpTransport::new(app_config.cluster.clone())
            .context("💀 Could not build the HTTP client for the cluster. Check [cluster] url.")?,
    );
    run_with_transport(transport, &app_config, command).await
}

/// 🔌 Same as [`run`], with the transport supplied by the caller.
pub async fn run_with_transport(
    transport: Arc<dyn Transport>,
    app_config: &AppConfig,
    command: Command,
) -> anyhow::Result<Option<String>> {
    let index = app_config.index.as_str();
    match command {
        Command::Ingest => {
            let ingest = &app_config.ingest;
            info!(
                "🚀 ingesting {} documents into '{}' in pages of {}",
                ingest.total_count, index, ingest.page_size
            );
            let mut orchestrator = IngestionOrchestrator::new(
                IndexSettingsController::new(transport.clone(), ingest.refresh_interval.clone()),
                BulkLoader::new(transport, BulkEncoder::new(index)),
                IngestOptions {
                    toggle_refresh: ingest.toggle_refresh,
                },
            );
            let mut source = FakeDocumentSource::new(ingest.seed, ingest.max_tags);
            let mut progress = ProgressMetrics::new(index, ingest.total_count);

            let report = orchestrator
                .ingest(ingest.total_count, ingest.page_size, &mut source, &mut progress)
                .await
                .with_context(|| format!("💀 Ingest into '{}' did not finish cleanly", index))?;
            let summary = if report.documents_rejected > 0 {
                format!(
                    "⚠️ {} documents loaded into '{}', {} rejected by the engine",
                    report.documents_loaded, report.index, report.documents_rejected
                )
            } else {
                format!(
                    "✅ {} documents loaded into '{}'",
                    report.documents_loaded, report.index
                )
            };
            Ok(Some(summary))
        }
        Command::Search => {
            let spec = app_config.query.to_query_spec()?;
            let body = QueryClient::new(transport)
                .search(index, &spec)
                .await
                .with_context(|| format!("💀 Search against '{}' failed", index))?;
            Ok(Some(body))
        }
        Command::CreateIndex => {
            let ack = IndexLifecycle::new(transport)
                .create_index(index, &app_config.create_index)
                .await
                .with_context(|| format!("💀 Could not create index '{}'", index))?;
            Ok(Some(ack))
        }
        Command::DeleteIndex => {
            let ack = IndexLifecycle::new(transport)
                .delete_index(index)
                .await
                .with_context(|| format!("💀 Could not delete index '{}'", index))?;
            Ok(Some(ack))
        }
        Command::ListIndices => {
            let listing = IndexLifecycle::new(transport)
                .list_indices()
                .await
                .context("💀 Could not list indices")?;
            Ok(Some(listing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::IngestConfig;

    fn small_config() -> AppConfig {
        AppConfig {
            ingest: IngestConfig {
                total_count: 750,
                page_size: 500,
                seed: Some(42),
                max_tags: 2,
                ..IngestConfig::default()
            },
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn the_one_where_ingest_runs_end_to_end_in_memory() -> anyhow::Result<()> {
        let transport = InMemoryTransport::new();
        let output = run_with_transport(Arc::new(transport.clone()), &small_config(), Command::Ingest)
            .await?;

        assert_eq!(
            output.as_deref(),
            Some("✅ 750 documents loaded into 'go-test-1'")
        );
        let paths: Vec<String> = transport
            .requests()
            .await
            .into_iter()
            .map(|request| request.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "/go-test-1/_settings",
                "/_bulk",
                "/_bulk",
                "/go-test-1/_settings"
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_page_size_zero_never_touches_refresh() {
        let transport = InMemoryTransport::new();
        let mut app_config = small_config();
        app_config.ingest.page_size = 0;

        let result = run_with_transport(Arc::new(transport.clone()), &app_config, Command::Ingest).await;

        let err = result.expect_err("💀 page size zero must be rejected");
        let config_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .expect("💀 the library error should be in the chain");
        assert!(matches!(config_error, Error::Configuration(_)));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn the_one_where_search_hands_back_the_raw_body() -> anyhow::Result<()> {
        let transport = InMemoryTransport::new();
        transport.script("_search", 200, "{\"hits\":{}}").await;

        let output =
            run_with_transport(Arc::new(transport.clone()), &small_config(), Command::Search).await?;

        assert_eq!(output.as_deref(), Some("{\"hits\":{}}"));
        let the_requests = transport.requests().await;
        assert_eq!(the_requests.len(), 1);
        assert_eq!(the_requests[0].query_value("sort"), Some("Age:asc"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_error_chain_keeps_the_server_receipt() {
        let transport = InMemoryTransport::new();
        transport.script("/_cat/indices", 401, "Unauthorized").await;

        let err = run_with_transport(Arc::new(transport), &small_config(), Command::ListIndices)
            .await
            .expect_err("💀 a 401 should bubble up");

        let server_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .expect("💀 the library error should be in the chain");
        assert_eq!(server_error.status(), Some(401));
        assert_eq!(server_error.body(), Some("Unauthorized"));
    }

    #[tokio::test]
    async fn the_one_where_a_missing_url_is_a_configuration_problem() {
        let err = run(AppConfig::default(), Command::ListIndices)
            .await
            .expect_err("💀 no url, no cluster");
        let config_error = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .expect("💀 the library error should be in the chain");
        assert!(matches!(config_error, Error::Configuration(_)));
    }
}
