//! Scheduled batch refresh.
//!
//! Each cycle fetches a full batch, swaps it into the store, and recomputes
//! every highlight view concurrently. A view is published only if its batch
//! is still current when it finishes.

use std::sync::Arc;
use std::time::Duration;

use campaign_ingest::BatchSource;
use campaign_reporting::highlight::HighlightReport;
use campaign_reporting::store::Published;
use campaign_reporting::{BatchStore, GroupBy, ViewSlot};
use tracing::{error, info, warn};

pub struct Refresher {
    source: Arc<dyn BatchSource>,
    store: Arc<BatchStore>,
    views: Vec<(GroupBy, Arc<ViewSlot<HighlightReport>>)>,
}

impl Refresher {
    pub fn new(source: Arc<dyn BatchSource>, store: Arc<BatchStore>, views: &[GroupBy]) -> Self {
        Self {
            source,
            store,
            views: views
                .iter()
                .map(|view| (*view, Arc::new(ViewSlot::new())))
                .collect(),
        }
    }

    pub fn latest(&self, view: GroupBy) -> Option<Arc<Published<HighlightReport>>> {
        self.views
            .iter()
            .find(|(v, _)| *v == view)
            .and_then(|(_, slot)| slot.latest())
    }

    /// Run one refresh cycle. Returns the number of views published.
    ///
    /// A failed fetch leaves the current batch in place.
    pub async fn refresh_once(&self) -> anyhow::Result<usize> {
        let source = self.source.clone();
        let records = tokio::task::spawn_blocking(move || source.fetch_batch()).await??;
        let batch = self.store.replace(records);

        let mut tasks = Vec::with_capacity(self.views.len());
        for (view, slot) in &self.views {
            let batch = batch.clone();
            let view = *view;
            let slot = slot.clone();
            let store = self.store.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                let report = HighlightReport::build(&batch.index, view);
                slot.publish(&store, batch.generation, report)
            }));
        }

        let mut published = 0usize;
        for task in tasks {
            match task.await {
                Ok(true) => published += 1,
                Ok(false) => {}
                Err(e) => error!(error = %e, "Highlight task panicked"),
            }
        }

        info!(
            generation = batch.generation,
            loaded_at = %batch.loaded_at,
            published,
            views = self.views.len(),
            "Refresh cycle complete"
        );
        Ok(published)
    }

    /// Refresh every `interval` until ctrl-c, calling `on_publish` with each
    /// view's latest report after a cycle.
    pub async fn run<F>(&self, interval: Duration, mut on_publish: F)
    where
        F: FnMut(GroupBy, &Published<HighlightReport>),
    {
        let mut ticker = tokio::time::interval(interval);
        info!(
            source = %self.source.describe(),
            interval_secs = interval.as_secs(),
            "Refresh loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.refresh_once().await {
                        Ok(_) => {
                            for (view, slot) in &self.views {
                                if let Some(latest) = slot.latest() {
                                    on_publish(*view, &latest);
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, "Refresh failed, keeping previous batch"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Refresh loop stopping");
                    break;
                }
            }
        }
    }
}
