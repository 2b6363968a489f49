use async_trait::async_trait;

use crate::models::{Order, SeenSet};
use crate::utils::error::FetchError;

/// How one source's cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every planned request succeeded and at least one order was extracted.
    Success,
    /// Every planned request succeeded but nothing was extracted.
    Empty,
    /// A request failed; orders extracted before it are still reported.
    Partial { error: FetchError },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    Fetching,
    Extracting,
    Done(CycleOutcome),
}

impl CycleState {
    pub fn transition(&mut self, source: &str, next: CycleState) {
        tracing::debug!("{}: {:?} -> {:?}", source, self, next);
        *self = next;
    }
}

#[derive(Debug)]
pub struct CycleReport {
    pub source: String,
    pub outcome: CycleOutcome,
    /// Orders not reported by this source before, in extraction order.
    pub new_orders: Vec<Order>,
    pub pages_fetched: usize,
    pub candidates: usize,
    pub skipped: usize,
}

/// Running totals while an adapter works through its pages.
#[derive(Debug, Default)]
pub struct CycleProgress {
    pub pages_fetched: usize,
    pub candidates: usize,
    pub skipped: usize,
    pub orders: Vec<Order>,
    pub error: Option<FetchError>,
}

impl CycleProgress {
    /// Filters the extracted orders through the source's seen set and closes the cycle.
    pub fn finish(self, source: &str, seen: &mut SeenSet, state: &mut CycleState) -> CycleReport {
        let extracted = self.orders.len();
        let outcome = match self.error {
            Some(error) => CycleOutcome::Partial { error },
            None if extracted == 0 => CycleOutcome::Empty,
            None => CycleOutcome::Success,
        };
        let new_orders = seen.retain_new(self.orders);

        match &outcome {
            CycleOutcome::Partial { error } => tracing::warn!(
                "{}: cycle aborted after {} pages ({}), {} extracted, {} new",
                source,
                self.pages_fetched,
                error,
                extracted,
                new_orders.len()
            ),
            _ => tracing::info!(
                "{}: {} pages, {} blocks, {} extracted, {} new",
                source,
                self.pages_fetched,
                self.candidates,
                extracted,
                new_orders.len()
            ),
        }
        state.transition(source, CycleState::Done(outcome.clone()));

        CycleReport {
            source: source.to_string(),
            outcome,
            new_orders,
            pages_fetched: self.pages_fetched,
            candidates: self.candidates,
            skipped: self.skipped,
        }
    }
}

/// One marketplace. Owns its fetcher and its seen set.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> &CycleState;

    /// Ids this source has reported so far.
    fn seen(&self) -> &SeenSet;

    /// Runs one cycle. Fetch failures end the cycle early but never escape it.
    async fn fetch_new_orders(&mut self) -> CycleReport;
}
