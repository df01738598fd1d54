//! The polling message feed.

use cmesh_domain::message::EncodedMessage;
use cmesh_events::EventBus;
use cmesh_registry::Registry;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Broadcast after every successful poll: the newest page of the feed, in
/// ascending chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagesFetched {
    pub messages: Vec<EncodedMessage>,
}

/// Mirrors the store's message table into the process by polling.
///
/// A failed poll logs a warning and leaves subscribers on the previous page;
/// freshness is bounded by the poll interval.
#[derive(Debug)]
pub struct MessageFeed {
    registry: Registry,
    events: EventBus,
    page_size: usize,
}

impl MessageFeed {
    /// Feed page size used by the chat surfaces.
    pub const DEFAULT_PAGE_SIZE: usize = 50;

    #[must_use]
    pub fn new(registry: Registry, events: EventBus) -> Self {
        Self { registry, events, page_size: Self::DEFAULT_PAGE_SIZE }
    }

    /// Overrides the page size.
    #[must_use]
    pub const fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetches one page immediately.
    ///
    /// # Errors
    /// Propagates [`Registry::recent_messages`] failures.
    pub async fn fetch(&self) -> Result<Vec<EncodedMessage>, cmesh_registry::RegistryError> {
        self.registry.recent_messages(self.page_size).await
    }

    /// Spawns the polling task.
    ///
    /// The first poll runs immediately, then every `interval`. Each
    /// successful pass publishes [`MessagesFetched`] on the bus.
    #[must_use]
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        info!(?interval, page_size = self.page_size, "Starting message feed");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match self.fetch().await {
                    Ok(messages) => {
                        if let Err(e) = self.events.publish(MessagesFetched { messages }) {
                            warn!(error = %e, "Failed to publish feed page");
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Feed poll failed; keeping the previous page");
                    },
                }
            }
        })
    }
}
