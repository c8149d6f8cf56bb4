//! 🚚 BulkLoader: chops a big number of documents into pages and feeds them to `/_bulk`, one
//! at a time, in order, no exceptions.
//!
//! 🧠 Knowledge graph:
//! - [`PagePlan`]: `floor(total / page_size)` full pages, then one remainder page if there is one.
//! - Per page: [`DocumentSource`] → [`BulkEncoder`] → [`Transport`] → [`ProgressObserver`].
//! - Strictly sequential. A failure on page k means pages 1..k-1 are in, page k is not, and
//!   nothing after k was attempted. The count we report is exact, never a guess.
//! - No retries. No skip-and-continue. The first bad page ends the load.
//!
//! 🦆 The duck carries one page at a time. The duck has a bad back.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::encoder::BulkEncoder;
use crate::error::{Error, Result};
use crate::generator::DocumentSource;
use crate::progress::{LoadProgress, ProgressObserver};
use crate::transport::{EngineRequest, Transport};

/// 📐 How `total` documents split into pages of `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    total: u64,
    page_size: usize,
}

impl PagePlan {
    /// 🔧 `page_size == 0` is a configuration error, raised before anything touches the network.
    pub fn new(total: u64, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::configuration(
                "page size must be greater than zero",
            ));
        }
        Ok(Self { total, page_size })
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn full_pages(&self) -> u64 {
        self.total / self.page_size as u64
    }

    /// 📦 Size of the trailing short page. Zero means there isn't one.
    pub fn remainder(&self) -> usize {
        (self.total % self.page_size as u64) as usize
    }

    /// 🔢 `ceil(total / page_size)`.
    pub fn page_count(&self) -> u64 {
        self.full_pages() + u64::from(self.remainder() > 0)
    }

    /// 🔄 Page sizes, in submission order.
    pub fn pages(&self) -> impl Iterator<Item = usize> {
        let page_size = self.page_size;
        let remainder = self.remainder();
        (0..self.full_pages())
            .map(move |_| page_size)
            .chain((remainder > 0).then_some(remainder))
    }
}

/// 📬 The bits of a `/_bulk` response we peek at. A 200 can still carry per-item failures.
#[derive(Debug, Deserialize)]
struct BulkSummary {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// 📊 How a finished load went. `submitted` counts every document in a page the engine
/// accepted with a 200; `rejected` is how many of those it then refused item by item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub submitted: u64,
    pub rejected: u64,
}

/// 🚚 Drives pages through the encoder and into the bulk endpoint.
#[derive(Debug, Clone)]
pub struct BulkLoader {
    transport: Arc<dyn Transport>,
    encoder: BulkEncoder,
}

impl BulkLoader {
    pub fn new(transport: Arc<dyn Transport>, encoder: BulkEncoder) -> Self {
        Self { transport, encoder }
    }

    pub fn index(&self) -> &str {
        self.encoder.index()
    }

    /// 🚀 Load `total_count` documents from `source` in pages of `page_size`.
    ///
    /// Validates the page size, then runs [`BulkLoader::load_plan`].
    pub async fn load<S: DocumentSource>(
        &self,
        total_count: u64,
        page_size: usize,
        source: &mut S,
        progress: &mut dyn ProgressObserver,
    ) -> Result<LoadSummary> {
        let plan = PagePlan::new(total_count, page_size)?;
        self.load_plan(plan, source, progress).await
    }

    /// 🚚 Run an already validated [`PagePlan`].
    ///
    /// On failure returns [`Error::Load`] with the 1-based page number and the exact count of
    /// documents committed by the pages before it.
    pub async fn load_plan<S: DocumentSource>(
        &self,
        plan: PagePlan,
        source: &mut S,
        progress: &mut dyn ProgressObserver,
    ) -> Result<LoadSummary> {
        let total_count = plan.total();
        info!(
            "🚀 Inserting {} documents into '{}': {} full pages of {} plus a remainder of {}",
            total_count,
            self.encoder.index(),
            plan.full_pages(),
            plan.page_size(),
            plan.remainder()
        );

        let mut summary = LoadSummary::default();
        for (page_number, page_len) in (1usize..).zip(plan.pages()) {
            match self.submit_page(page_number, page_len, source).await {
                Ok(rejected) => summary.rejected += rejected,
                Err(page_error) => {
                    warn!(
                        "💀 page {} of {} failed after {} documents were committed",
                        page_number,
                        plan.page_count(),
                        summary.submitted
                    );
                    progress.finish();
                    return Err(Error::Load {
                        page: page_number,
                        documents_committed: summary.submitted,
                        source: Box::new(page_error),
                    });
                }
            }
            summary.submitted += page_len as u64;
            info!("📦 Inserted: {}/{}", summary.submitted, total_count);
            progress.on_progress(LoadProgress {
                loaded: summary.submitted,
                total: total_count,
            });
        }

        progress.finish();
        if summary.rejected > 0 {
            warn!(
                "⚠️ Insert completed: {} documents submitted, {} rejected by the engine",
                summary.submitted, summary.rejected
            );
        } else {
            info!("✅ Insert completed: {} documents", summary.submitted);
        }
        Ok(summary)
    }

    /// 📡 Produce, encode, ship. One page, one request. Returns how many items the engine rejected.
    async fn submit_page<S: DocumentSource>(
        &self,
        page_number: usize,
        page_len: usize,
        source: &mut S,
    ) -> Result<u64> {
        let documents = source.next_documents(page_len)?;
        let payload = self.encoder.encode(&documents)?;
        // -- the documents are serialized, the originals can go
        drop(documents);
        debug!(
            "📡 page {}: {} documents, {} bytes",
            page_number,
            page_len,
            payload.len()
        );

        let body = self
            .transport
            .execute(EngineRequest::post("/_bulk").with_ndjson(payload))
            .await?;
        Ok(count_item_failures(page_number, &body))
    }
}

/// ⚠️ A 200 with `"errors": true` means some items were rejected inside an accepted request.
/// The request still counts as submitted; the rejected items are counted and logged.
fn count_item_failures(page_number: usize, body: &str) -> u64 {
    let Ok(summary) = serde_json::from_str::<BulkSummary>(body) else {
        return 0;
    };
    if !summary.errors {
        return 0;
    }
    let rejected: Vec<&serde_json::Value> = summary
        .items
        .iter()
        .filter_map(|item| item.get("create"))
        .filter(|action| action.get("error").is_some())
        .collect();
    warn!(
        "⚠️ page {}: the engine accepted the request but rejected {} item(s); first error: {}",
        page_number,
        rejected.len(),
        rejected
            .first()
            .and_then(|action| action.get("error"))
            .map(|error| error.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    rejected.len() as u64
}
