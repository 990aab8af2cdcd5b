//! Bounded record stream between a producer and a consumer task.
//!
//! The channel holds at most one record, so the producer can never run ahead
//! of the consumer by more than that. The end of the stream is an explicit
//! frame sent by [`RecordSender::close`]: a receiver that sees the sender
//! disappear without it reports [`DumpError::ProducerAborted`] instead of a
//! clean end, and a sender whose receiver is gone gets
//! [`DumpError::ConsumerGone`] from its next send.

use dynamodump_model::Item;
use tokio::sync::mpsc;

use crate::error::{DumpError, DumpResult};

/// Records buffered between producer and consumer.
pub const CHANNEL_CAPACITY: usize = 1;

#[derive(Debug)]
enum Frame {
    Record(Item),
    End,
}

/// Create a connected sender and receiver.
#[must_use]
pub fn record_channel() -> (RecordSender, RecordReceiver) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    (
        RecordSender { tx, sent: 0 },
        RecordReceiver {
            rx,
            received: 0,
            finished: false,
        },
    )
}

/// Producer side of the record stream.
#[derive(Debug)]
pub struct RecordSender {
    tx: mpsc::Sender<Frame>,
    sent: u64,
}

impl RecordSender {
    /// Send one record, waiting while the channel is full.
    pub async fn send(&mut self, item: Item) -> DumpResult<()> {
        self.tx
            .send(Frame::Record(item))
            .await
            .map_err(|_| DumpError::ConsumerGone)?;
        self.sent += 1;
        Ok(())
    }

    /// Signal the end of the stream. Returns the number of records sent.
    pub async fn close(self) -> DumpResult<u64> {
        self.tx
            .send(Frame::End)
            .await
            .map_err(|_| DumpError::ConsumerGone)?;
        Ok(self.sent)
    }

    /// Records sent so far.
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

/// Consumer side of the record stream.
#[derive(Debug)]
pub struct RecordReceiver {
    rx: mpsc::Receiver<Frame>,
    received: u64,
    finished: bool,
}

impl RecordReceiver {
    /// Receive the next record.
    ///
    /// Returns `Ok(None)` once the producer closed the stream, and keeps
    /// returning it afterwards.
    pub async fn recv(&mut self) -> DumpResult<Option<Item>> {
        if self.finished {
            return Ok(None);
        }
        match self.rx.recv().await {
            Some(Frame::Record(item)) => {
                self.received += 1;
                Ok(Some(item))
            }
            Some(Frame::End) => {
                self.finished = true;
                self.rx.close();
                Ok(None)
            }
            None => Err(DumpError::ProducerAborted),
        }
    }

    /// Records received so far.
    #[must_use]
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Whether the producer closed the stream.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
