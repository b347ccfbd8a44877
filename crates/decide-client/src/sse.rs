//! Background reader for server-sent event streams.
//!
//! The response body is read on a spawned task that decodes frames and
//! forwards them over a bounded channel. Dropping the [`StreamHandle`]
//! aborts the task and closes the connection.

use decide_core::{SseDecoder, SseFrame};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ClientError;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum StreamMessage {
    Frame(SseFrame),
    /// The body broke mid-stream. Nothing follows.
    Failed(ClientError),
    /// The server ended the body. Nothing follows.
    Closed,
}

#[derive(Debug)]
pub struct StreamHandle {
    rx: mpsc::Receiver<StreamMessage>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Next message, or `None` once the reader has stopped.
    pub async fn next(&mut self) -> Option<StreamMessage> {
        self.rx.recv().await
    }

    /// Stop reading. Messages already queued are discarded.
    pub fn cancel(&mut self) {
        self.task.abort();
        self.rx.close();
    }

    /// A handle that replays fixed messages, for offline runs and tests.
    pub fn from_messages(messages: Vec<StreamMessage>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            for message in messages {
                if tx.send(message).await.is_err() {
                    return;
                }
            }
        });
        StreamHandle { rx, task }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(crate) fn spawn_reader(response: reqwest::Response) -> StreamHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(async move {
        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for frame in decoder.feed(&bytes) {
                        if tx.send(StreamMessage::Frame(frame)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "event stream read failed");
                    let _ = tx
                        .send(StreamMessage::Failed(ClientError::StreamRead(err.to_string())))
                        .await;
                    return;
                }
            }
        }
        if decoder.has_pending() {
            tracing::debug!("event stream ended inside an event; discarding it");
        }
        let _ = tx.send(StreamMessage::Closed).await;
    });
    StreamHandle { rx, task }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replayed_messages_arrive_in_order() {
        let mut handle = StreamHandle::from_messages(vec![
            StreamMessage::Frame(SseFrame::new("a", "1")),
            StreamMessage::Frame(SseFrame::new("b", "2")),
            StreamMessage::Closed,
        ]);
        let mut names = Vec::new();
        while let Some(message) = handle.next().await {
            match message {
                StreamMessage::Frame(frame) => names.push(frame.event),
                StreamMessage::Closed => break,
                StreamMessage::Failed(err) => panic!("unexpected failure: {}", err),
            }
        }
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn cancel_stops_delivery() {
        let mut handle = StreamHandle::from_messages(vec![StreamMessage::Closed]);
        handle.cancel();
        assert!(handle.next().await.is_none());
    }
}
