use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{EngineRequest, Transport, ensure_ok};
use crate::error::Result;

/// 📦 A transport that never leaves the building. Unlike my dad, who left for milk in 1998.
///
/// `InMemoryTransport` records every [`EngineRequest`] it is handed and answers from a script.
/// Scripts are keyed by a path fragment: a request whose path contains the fragment pops the
/// next scripted `(status, body)` from that queue; fragments whose queue has run dry are skipped.
/// Unscripted requests get a cheerful 200.
///
/// 🔒 Clone-able because tests need to peek inside after handing a copy off to the loader.
/// The `Arc` means everyone shares the same ledger. Communist data, but in a good way.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTransport {
    /// 🔒 The evidence locker. Every request, in the order it arrived.
    received: Arc<Mutex<Vec<EngineRequest>>>,
    /// 🎭 path fragment -> queued answers. First matching fragment wins.
    scripts: Arc<Mutex<Vec<(String, VecDeque<(u16, String)>)>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🎭 Queue an answer for the next request whose path contains `path_fragment`.
    pub async fn script(&self, path_fragment: &str, status: u16, body: impl Into<String>) {
        let mut scripts = self.scripts.lock().await;
        let answer = (status, body.into());
        match scripts
            .iter_mut()
            .find(|(fragment, _)| fragment == path_fragment)
        {
            Some((_, queue)) => queue.push_back(answer),
            None => scripts.push((path_fragment.to_string(), VecDeque::from([answer]))),
        }
    }

    /// 📜 Snapshot of everything received so far.
    pub async fn requests(&self) -> Vec<EngineRequest> {
        self.received.lock().await.clone()
    }

    /// 🔢 How many received requests hit a path containing `path_fragment`.
    pub async fn count(&self, path_fragment: &str) -> usize {
        self.received
            .lock()
            .await
            .iter()
            .filter(|request| request.path.contains(path_fragment))
            .count()
    }

}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn execute(&self, request: EngineRequest) -> Result<String> {
        let scripted = {
            let mut scripts = self.scripts.lock().await;
            scripts
                .iter_mut()
                .find(|(fragment, queue)| {
                    !queue.is_empty() && request.path.contains(fragment.as_str())
                })
                .and_then(|(_, queue)| queue.pop_front())
        };
        self.received.lock().await.push(request);

        let (status, body) = scripted.unwrap_or_else(|| (200, "{\"acknowledged\":true}".to_string()));
        ensure_ok(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn the_one_where_scripts_play_in_order_then_go_quiet() -> Result<()> {
        let transport = InMemoryTransport::new();
        transport.script("_bulk", 200, "first").await;
        transport.script("_bulk", 500, "second").await;

        assert_eq!(transport.execute(EngineRequest::post("/_bulk")).await?, "first");
        let the_second = transport.execute(EngineRequest::post("/_bulk")).await;
        assert!(matches!(the_second, Err(Error::Server { status: 500, .. })));
        // -- script exhausted, back to the default cheerful 200
        assert_eq!(
            transport.execute(EngineRequest::post("/_bulk")).await?,
            "{\"acknowledged\":true}"
        );
        // -- other paths never touched the _bulk script
        transport.execute(EngineRequest::put("/i/_settings")).await?;

        assert_eq!(transport.count("_bulk").await, 3);
        assert_eq!(transport.count("_settings").await, 1);
        assert_eq!(transport.requests().await.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_used_up_broad_script_steps_aside() -> Result<()> {
        let transport = InMemoryTransport::new();
        transport.script("/go-test-1", 200, "created").await;
        transport.script("_settings", 403, "forbidden").await;

        // -- the broad fragment answers once, then stops hogging the path
        assert_eq!(transport.execute(EngineRequest::put("/go-test-1")).await?, "created");
        let the_settings = transport
            .execute(EngineRequest::put("/go-test-1/_settings"))
            .await;
        assert!(matches!(the_settings, Err(Error::Server { status: 403, .. })));
        Ok(())
    }
}
