use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::extract::{SourceProfile, extract_listing_page};
use crate::fetcher::{FetchRequest, Fetcher};
use crate::models::SeenSet;
use crate::plugins::traits::{CycleProgress, CycleReport, CycleState, SourceAdapter};

/// A marketplace whose listing is served page by page from a form-POST endpoint.
pub struct PaginatedApiSource {
    profile: SourceProfile,
    fetcher: Arc<dyn Fetcher>,
    endpoint: String,
    search: String,
    headers: HashMap<String, String>,
    max_pages: u32,
    page_delay: Duration,
    seen: SeenSet,
    state: CycleState,
}

impl PaginatedApiSource {
    pub fn new(profile: SourceProfile, fetcher: Arc<dyn Fetcher>, endpoint: impl Into<String>) -> Self {
        Self {
            profile,
            fetcher,
            endpoint: endpoint.into(),
            search: String::new(),
            headers: HashMap::new(),
            max_pages: 5,
            page_delay: Duration::ZERO,
            seen: SeenSet::new(),
            state: CycleState::Idle,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    fn page_request(&self, page: u32) -> FetchRequest {
        FetchRequest::post_form(
            self.endpoint.clone(),
            vec![
                ("search".to_string(), self.search.clone()),
                ("page".to_string(), page.to_string()),
            ],
        )
        .with_headers(self.headers.clone())
    }
}

#[async_trait]
impl SourceAdapter for PaginatedApiSource {
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

        for page in 1..=self.max_pages {
            if page > 1 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            self.state.transition(&name, CycleState::Fetching);
            let body = match self.fetcher.fetch(self.page_request(page)).await {
                Ok(body) => body,
                Err(e) => {
                    progress.error = Some(e);
                    break;
                }
            };
            progress.pages_fetched += 1;

            self.state.transition(&name, CycleState::Extracting);
            let extraction = extract_listing_page(&body, &self.profile);
            if extraction.candidates == 0 {
                tracing::debug!("{}: page {} has no order blocks, stopping", name, page);
                break;
            }
            progress.candidates += extraction.candidates;
            progress.skipped += extraction.skipped;
            progress.orders.extend(extraction.orders);
        }

        progress.finish(&name, &mut self.seen, &mut self.state)
    }
}
