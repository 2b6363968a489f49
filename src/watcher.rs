use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::plugins::traits::{CycleOutcome, CycleReport, NotifierPlugin, SourceAdapter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSummary {
    pub source: String,
    pub outcome: String,
    pub error: Option<String>,
    pub pages_fetched: usize,
    pub candidates: usize,
    pub skipped: usize,
    pub new_orders: usize,
}

impl From<&CycleReport> for SourceSummary {
    fn from(report: &CycleReport) -> Self {
        let (outcome, error) = match &report.outcome {
            CycleOutcome::Success => ("success", None),
            CycleOutcome::Empty => ("empty", None),
            CycleOutcome::Partial { error } => ("partial", Some(error.to_string())),
        };
        Self {
            source: report.source.clone(),
            outcome: outcome.to_string(),
            error,
            pages_fetched: report.pages_fetched,
            candidates: report.candidates,
            skipped: report.skipped,
            new_orders: report.new_orders.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleSummary {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub sources: Vec<SourceSummary>,
    /// Orders left after cross-source deduplication.
    pub merged: usize,
    pub delivered: usize,
    pub failed_deliveries: usize,
}

/// Runs whole cycles: every source, then the merge, then delivery.
pub struct OrderWatcher {
    sources: Vec<Box<dyn SourceAdapter>>,
    aggregator: Aggregator,
    notifier: Arc<dyn NotifierPlugin>,
    delivered_by_source: BTreeMap<String, u64>,
}

impl OrderWatcher {
    pub fn new(sources: Vec<Box<dyn SourceAdapter>>, notifier: Arc<dyn NotifierPlugin>) -> Self {
        let delivered_by_source = sources
            .iter()
            .map(|source| (source.name().to_string(), 0))
            .collect();
        Self {
            sources,
            aggregator: Aggregator::new(),
            notifier,
            delivered_by_source,
        }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    pub fn delivered_by_source(&self) -> &BTreeMap<String, u64> {
        &self.delivered_by_source
    }

    pub async fn run_cycle(&mut self) -> CycleSummary {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", id = %cycle_id);
        self.execute_cycle(cycle_id).instrument(span).await
    }

    async fn execute_cycle(&mut self, cycle_id: Uuid) -> CycleSummary {
        let started_at = Utc::now();
        let start_time = Instant::now();
        tracing::info!("Starting cycle over {} sources", self.sources.len());

        // Sources run one after another; each keeps its own cookies and seen set.
        let mut reports = Vec::with_capacity(self.sources.len());
        for source in self.sources.iter_mut() {
            reports.push(source.fetch_new_orders().await);
        }

        let sources: Vec<SourceSummary> = reports.iter().map(SourceSummary::from).collect();
        let batches = reports.into_iter().map(|report| report.new_orders).collect();
        let merged = self.aggregator.merge(batches);
        let merged_count = merged.len();

        let mut delivered = 0;
        let mut failed_deliveries = 0;
        for (position, order) in merged.iter().enumerate() {
            match self.notifier.deliver(order).await {
                Ok(result) if result.success => {
                    delivered += 1;
                    *self
                        .delivered_by_source
                        .entry(order.source().to_string())
                        .or_default() += 1;
                    tracing::debug!(
                        "Delivered {}/{}: {} ({})",
                        position + 1,
                        merged_count,
                        order.id(),
                        order.published()
                    );
                }
                Ok(result) => {
                    failed_deliveries += 1;
                    tracing::warn!(
                        "{} rejected order {}: {}",
                        self.notifier.name(),
                        order.id(),
                        result.error.unwrap_or_default()
                    );
                }
                Err(e) => {
                    failed_deliveries += 1;
                    tracing::warn!("Failed to deliver order {}: {}", order.id(), e);
                }
            }
        }

        let summary = CycleSummary {
            cycle_id,
            started_at,
            duration_ms: start_time.elapsed().as_millis() as u64,
            sources,
            merged: merged_count,
            delivered,
            failed_deliveries,
        };

        tracing::info!(
            "Cycle finished in {} ms: {} new orders, {} delivered, {} failed",
            summary.duration_ms,
            summary.merged,
            summary.delivered,
            summary.failed_deliveries
        );
        summary
    }
}
