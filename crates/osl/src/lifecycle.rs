//! 🏗️ IndexLifecycle: create it, delete it, list what's there.
//!
//! New indices start with refresh off and zero replicas, because they're born to be bulk loaded.
//! Refresh gets turned back on by the ingest run, not here.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::settings::REFRESH_DISABLED;
use crate::transport::{EngineRequest, Transport};

/// 📐 The settings block sent with `PUT /<index>`.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IndexCreateSettings {
    #[serde(default = "default_create_refresh_interval")]
    pub refresh_interval: String,
    #[serde(default = "default_number_of_shards")]
    pub number_of_shards: u32,
    #[serde(default)]
    pub number_of_replicas: u32,
}

fn default_create_refresh_interval() -> String {
    REFRESH_DISABLED.to_string()
}

fn default_number_of_shards() -> u32 {
    1
}

impl Default for IndexCreateSettings {
    fn default() -> Self {
        Self {
            refresh_interval: default_create_refresh_interval(),
            number_of_shards: default_number_of_shards(),
            number_of_replicas: 0,
        }
    }
}

impl IndexCreateSettings {
    fn to_body(&self) -> String {
        json!({
            "settings": {
                "index": {
                    "refresh_interval": self.refresh_interval,
                    "number_of_shards": self.number_of_shards,
                    "number_of_replicas": self.number_of_replicas,
                }
            }
        })
        .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct IndexLifecycle {
    transport: Arc<dyn Transport>,
}

impl IndexLifecycle {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// 🐣 `PUT /<index>`. Already exists → the engine says 400 and we pass it along.
    pub async fn create_index(&self, index: &str, settings: &IndexCreateSettings) -> Result<String> {
        info!("🐣 creating index '{}' ({:?})", index, settings);
        self.transport
            .execute(EngineRequest::put(format!("/{}", index)).with_json(settings.to_body()))
            .await
    }

    /// 🗑️ `DELETE /<index>`. No confirmation prompt. You asked for it.
    pub async fn delete_index(&self, index: &str) -> Result<String> {
        info!("🗑️ deleting index '{}'", index);
        self.transport
            .execute(EngineRequest::delete(format!("/{}", index)))
            .await
    }

    pub async fn list_indices(&self) -> Result<String> {
        self.transport
            .execute(EngineRequest::get("/_cat/indices").with_query("format", "json"))
            .await
    }
}
