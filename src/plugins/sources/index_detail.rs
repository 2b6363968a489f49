use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::extract::{SourceProfile, extract_detail_page, listing_links};
use crate::fetcher::{FetchRequest, Fetcher};
use crate::models::SeenSet;
use crate::plugins::traits::{CycleProgress, CycleReport, CycleState, SourceAdapter};

/// A marketplace whose index page only links to listings; each listing is read
/// from its own detail page.
pub struct IndexDetailSource {
    profile: SourceProfile,
    fetcher: Arc<dyn Fetcher>,
    index_url: String,
    headers: HashMap<String, String>,
    max_items: usize,
    page_delay: Duration,
    seen: SeenSet,
    state: CycleState,
}

impl IndexDetailSource {
    pub fn new(profile: SourceProfile, fetcher: Arc<dyn Fetcher>, index_url: impl Into<String>) -> Self {
        Self {
            profile,
            fetcher,
            index_url: index_url.into(),
            headers: HashMap::new(),
            max_items: 5,
            page_delay: Duration::ZERO,
            seen: SeenSet::new(),
            state: CycleState::Idle,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    fn request(&self, url: &str) -> FetchRequest {
        FetchRequest::get(url).with_headers(self.headers.clone())
    }
}

#[async_trait]
impl SourceAdapter for IndexDetailSource {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn state(&self) -> &CycleState {
        &self.state
    }

    fn seen(&self) -> &SeenSet {
        &self.seen
    }

    async fn fetch_new_orders(&mut self) -> CycleReport {
        let name = self.profile.name.clone();
        let mut progress = CycleProgress::default();

        self.state.transition(&name, CycleState::Fetching);
        let index = match self.fetcher.fetch(self.request(&self.index_url)).await {
            Ok(body) => body,
            Err(e) => {
                progress.error = Some(e);
                return progress.finish(&name, &mut self.seen, &mut self.state);
            }
        };
        progress.pages_fetched += 1;

        self.state.transition(&name, CycleState::Extracting);
        let links = listing_links(&index, &self.profile, self.max_items);
        progress.candidates = links.len();
        tracing::debug!("{}: {} listing links on the index page", name, links.len());

        for (position, link) in links.iter().enumerate() {
            if position > 0 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            self.state.transition(&name, CycleState::Fetching);
            let detail = match self.fetcher.fetch(self.request(link.as_str())).await {
                Ok(body) => body,
                Err(e) => {
                    progress.error = Some(e);
                    break;
                }
            };
            progress.pages_fetched += 1;

            self.state.transition(&name, CycleState::Extracting);
            match extract_detail_page(&detail, link, &self.profile) {
                Ok(order) => progress.orders.push(order),
                Err(e) => {
                    tracing::warn!("{}: skipping {}: {}", name, link, e);
                    progress.skipped += 1;
                }
            }
        }

        progress.finish(&name, &mut self.seen, &mut self.state)
    }
}
