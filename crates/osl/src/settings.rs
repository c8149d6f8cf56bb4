//! 🔧 IndexSettingsController: flips `refresh_interval` on and off.
//!
//! 🧠 Knowledge graph:
//! - Disabled (`"-1"`): the engine stops making new segments searchable every second. Bulk loads
//!   go faster because nobody is refreshing underneath them.
//! - Enabled (`"1s"` by default): writes become visible to searches again.
//! - Both calls are idempotent and work in any lifecycle phase. They return the raw ack body.
//!
//! ⚠️ Leaving refresh off is a silent failure mode: no errors, just searches that never see new
//! documents. The orchestrator owns making sure that never happens.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::transport::{EngineRequest, Transport};

/// 🚫 The magic value that means "refresh: never".
pub const REFRESH_DISABLED: &str = "-1";

/// ⏱️ What "refresh: on" means unless configured otherwise.
pub const DEFAULT_REFRESH_INTERVAL: &str = "1s";

#[derive(Debug, Clone)]
pub struct IndexSettingsController {
    transport: Arc<dyn Transport>,
    enabled_interval: String,
}

impl IndexSettingsController {
    pub fn new(transport: Arc<dyn Transport>, enabled_interval: impl Into<String>) -> Self {
        Self {
            transport,
            enabled_interval: enabled_interval.into(),
        }
    }

    pub fn enabled_interval(&self) -> &str {
        &self.enabled_interval
    }

    /// 🚫 `refresh_interval = "-1"`.
    pub async fn disable_refresh(&self, index: &str) -> Result<String> {
        self.set_refresh_interval(index, REFRESH_DISABLED).await
    }

    /// ✅ `refresh_interval = <enabled interval>`.
    pub async fn enable_refresh(&self, index: &str) -> Result<String> {
        self.set_refresh_interval(index, &self.enabled_interval).await
    }

    /// 📡 `PUT /<index>/_settings` with `{"index":{"refresh_interval":"<value>"}}`.
    pub async fn set_refresh_interval(&self, index: &str, value: &str) -> Result<String> {
        debug!("🔧 setting refresh_interval={} on '{}'", value, index);
        let body = json!({ "index": { "refresh_interval": value } }).to_string();
        self.transport
            .execute(EngineRequest::put(format!("/{}/_settings", index)).with_json(body))
            .await
    }
}
