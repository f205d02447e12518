//! # Event Sink
//!
//! The single inbound queue between the fetch layer and the engine. Any
//! number of fetch workers hold clones of the sink; exactly one consumer
//! drains the stream. The stream ends once every sink clone is dropped.

use shared_types::{BlockRecord, LedgerEvent, TransactionRecord};
use tokio::sync::mpsc;

use crate::domain::errors::FetchError;

/// Receiving half of the event queue.
pub type EventStream = mpsc::Receiver<LedgerEvent>;

/// Create a bounded event queue.
pub fn event_channel(capacity: usize) -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSink { tx }, rx)
}

/// Sending half of the event queue, handed to the fetch collaborator.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<LedgerEvent>,
}

impl EventSink {
    /// A block record arrived.
    pub async fn on_block(&self, block: BlockRecord) -> Result<(), FetchError> {
        self.send(LedgerEvent::Block(block)).await
    }

    /// A transaction record arrived.
    pub async fn on_transaction(&self, tx: TransactionRecord) -> Result<(), FetchError> {
        self.send(LedgerEvent::Transaction(tx)).await
    }

    /// Enqueue an event, waiting for room.
    pub async fn send(&self, event: LedgerEvent) -> Result<(), FetchError> {
        self.tx.send(event).await.map_err(|_| FetchError::SinkClosed)
    }

    /// True once the consumer dropped the stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
