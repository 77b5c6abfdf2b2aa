//! Stream emitter
//!
//! Accepted reviews are pushed through a bounded channel. When the consumer
//! falls behind, `emit` waits, which holds the controller before its next
//! request. Dropping or cancelling the `ReviewStream` closes the channel; the
//! controller notices at its next suspension point and stops.

use crate::model::ReviewItem;
use crate::output::RunSummary;
use crate::state::RunStatus;
use crate::ScrapeError;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

/// The consumer is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("review stream consumer disconnected")]
pub struct Disconnected;

/// Producer half, owned by the pagination controller
#[derive(Debug)]
pub struct Emitter {
    tx: mpsc::Sender<ReviewItem>,
}

impl Emitter {
    /// Creates an emitter and the receiving end it feeds
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ReviewItem>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Hands one item to the consumer, waiting for buffer space
    pub async fn emit(&self, item: ReviewItem) -> Result<(), Disconnected> {
        self.tx.send(item).await.map_err(|_| Disconnected)
    }

    /// Resolves once the consumer has stopped reading
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Marks end-of-stream
    pub fn close(self) {
        drop(self.tx);
    }
}

/// Pull side of a running scrape
///
/// Items arrive in page order, then in order within each page. Once `next`
/// returns `None` the run is over and `finish` returns its summary.
///
/// # Example
///
/// ```no_run
/// use hotel_review_scraper::{Config, ReviewScraper};
///
/// # async fn example(config: Config) -> Result<(), Box<dyn std::error::Error>> {
/// let mut stream = ReviewScraper::new(config)?.stream();
/// while let Some(item) = stream.next().await {
///     println!("{}: {:?}", item.review.title, item.review.score);
/// }
/// let summary = stream.finish().await?;
/// println!("{} reviews, status {}", summary.emitted_count, summary.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ReviewStream {
    rx: mpsc::Receiver<ReviewItem>,
    handle: JoinHandle<RunSummary>,
    received: usize,
}

impl ReviewStream {
    pub(crate) fn new(rx: mpsc::Receiver<ReviewItem>, handle: JoinHandle<RunSummary>) -> Self {
        Self {
            rx,
            handle,
            received: 0,
        }
    }

    /// Next accepted review, or `None` at end of stream
    pub async fn next(&mut self) -> Option<ReviewItem> {
        let item = self.rx.recv().await;
        if item.is_some() {
            self.received += 1;
        }
        item
    }

    /// Number of items handed out by `next` so far
    pub fn received(&self) -> usize {
        self.received
    }

    /// Stops the run
    ///
    /// Items already buffered can still be read with `next`; the run itself
    /// ends with status `Cancelled` at its next suspension point.
    pub fn cancel(&mut self) {
        self.rx.close();
    }

    /// Waits for the run to end and returns its summary
    ///
    /// Unread items are discarded. A run still producing is cancelled. For a
    /// cancelled run `emitted_count` is the number of items read from this
    /// stream, not the number that reached its buffer.
    pub async fn finish(mut self) -> Result<RunSummary, ScrapeError> {
        self.rx.close();
        while self.rx.recv().await.is_some() {}
        let summary = (&mut self.handle).await?;
        Ok(self.settle(summary))
    }

    /// Drains the stream into memory
    pub async fn collect(mut self) -> Result<(Vec<ReviewItem>, RunSummary), ScrapeError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        let summary = (&mut self.handle).await?;
        Ok((items, self.settle(summary)))
    }

    fn settle(&self, mut summary: RunSummary) -> RunSummary {
        if summary.status == RunStatus::Cancelled {
            summary.emitted_count = self.received;
        }
        summary
    }

    /// Splits into a `Stream` of items and the handle yielding the summary
    pub fn into_parts(self) -> (ReceiverStream<ReviewItem>, JoinHandle<RunSummary>) {
        (ReceiverStream::new(self.rx), self.handle)
    }
}
