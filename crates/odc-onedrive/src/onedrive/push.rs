//! Server-push change notifications.
//!
//! The backend streams notifications as Server-Sent Events on
//! `/events/sse`.  [`open`] spawns a reader task that decodes the stream
//! and forwards typed [`PushNotification`]s to a [`PushSubscription`].
//!
//! The subscription owns the reader task: closing or dropping it aborts
//! the task and releases the connection.  A connection that drops or
//! cannot be established is retried after the server's last `retry:`
//! delay ([`DEFAULT_RETRY`] until one is sent), resuming from the last
//! event ID.  Only a 4xx rejection of the stream ends the subscription.

use crate::onedrive::api_client::BackendClient;
use crate::onedrive::error::{ConsoleError, ConsoleResult};
use crate::onedrive::types::PushNotification;
use bytes::BytesMut;
use futures::{Stream, StreamExt};
use log::{debug, error, info, warn};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

pub const EVENTS_PATH: &str = "events/sse";

/// Notifications buffered between the reader task and the consumer.
const PUSH_BUFFER: usize = 64;

/// Reconnect delay until the server sends `retry:`.
pub const DEFAULT_RETRY: Duration = Duration::from_secs(1);

/// Longest line held while waiting for its terminator.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

// ═══════════════════════════════════════════════════════════════════════
//  SSE framing
// ═══════════════════════════════════════════════════════════════════════

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

/// Incremental decoder for a `text/event-stream` body.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; bytes are held
/// until a full line is available.  `LF`, `CRLF` and lone `CR` line
/// endings are accepted.  A line longer than [`MAX_LINE_BYTES`] is
/// dropped along with the event it belongs to.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
    data: Vec<String>,
    event: Option<String>,
    last_id: Option<String>,
    retry: Option<Duration>,
    /// The previous line ended in CR; a leading LF belongs to it.
    skip_lf: bool,
    /// Dropping the rest of an oversized line.
    discarding: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line) = self.take_line() {
            if std::mem::take(&mut self.discarding) {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LINE_BYTES {
            warn!(
                "Dropping push event with a line over {} bytes",
                MAX_LINE_BYTES
            );
            self.buffer.clear();
            self.data.clear();
            self.event = None;
            self.discarding = true;
        }
        events
    }

    /// Delay the server asked for before reconnecting.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// ID of the last event seen, sent back on reconnect.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Forget a half-read event when the connection drops.  The event ID
    /// and retry delay survive.
    pub fn reset_stream(&mut self) {
        self.buffer.clear();
        self.data.clear();
        self.event = None;
        self.skip_lf = false;
        self.discarding = false;
    }

    fn take_line(&mut self) -> Option<BytesMut> {
        if self.skip_lf && !self.buffer.is_empty() {
            if self.buffer[0] == b'\n' {
                let _ = self.buffer.split_to(1);
            }
            self.skip_lf = false;
        }
        let pos = self
            .buffer
            .iter()
            .position(|b| matches!(b, b'\n' | b'\r'))?;
        let mut line = self.buffer.split_to(pos + 1);
        self.skip_lf = line[pos] == b'\r';
        line.truncate(pos);
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            "retry" if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) => {
                if let Ok(ms) = value.parse() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseEvent {
            event: self.event.take(),
            data,
            id: self.last_id.clone(),
        })
    }
}

/// Decode the JSON payload of an event.  Unrecognised payloads are logged
/// and skipped.
pub fn parse_notification(event: &SseEvent) -> Option<PushNotification> {
    match serde_json::from_str::<PushNotification>(&event.data) {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("Ignoring push event {:?}: {}", event.data, e);
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Subscription
// ═══════════════════════════════════════════════════════════════════════

/// A live push channel, consumed as a `Stream` of notifications.
pub struct PushSubscription {
    rx: ReceiverStream<PushNotification>,
    task: Option<JoinHandle<()>>,
}

impl PushSubscription {
    pub fn new(rx: mpsc::Receiver<PushNotification>, task: Option<JoinHandle<()>>) -> Self {
        Self {
            rx: ReceiverStream::new(rx),
            task,
        }
    }

    /// A subscription fed by the returned sender instead of a connection.
    pub fn channel(buffer: usize) -> (mpsc::Sender<PushNotification>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx, None))
    }

    /// Next notification, or `None` once the channel has ended.
    pub async fn recv(&mut self) -> Option<PushNotification> {
        self.rx.next().await
    }

    /// Stop the reader and release the connection.
    pub fn close(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Push reader task aborted");
        }
    }
}

impl Stream for PushSubscription {
    type Item = PushNotification;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Open the backend's push channel.
///
/// Must be called from within a Tokio runtime.
pub fn open(client: BackendClient, token: Option<String>) -> PushSubscription {
    let (tx, rx) = mpsc::channel(PUSH_BUFFER);
    let task = tokio::spawn(async move {
        let mut decoder = SseDecoder::new();
        loop {
            match read_events(&client, token.as_deref(), &mut decoder, &tx).await {
                Ok(()) => info!("Push connection ended"),
                Err(e) if is_rejection(&e) => {
                    error!("Push channel rejected: {}", e);
                    break;
                }
                Err(e) => warn!("Push connection lost: {}", e),
            }
            if tx.is_closed() {
                break;
            }

            decoder.reset_stream();
            let delay = decoder.retry().unwrap_or(DEFAULT_RETRY);
            debug!("Reconnecting push channel in {:?}", delay);
            tokio::time::sleep(delay).await;
        }
        info!("Push channel closed");
    });
    PushSubscription::new(rx, Some(task))
}

/// The backend refused the stream itself; retrying cannot help.
fn is_rejection(err: &ConsoleError) -> bool {
    matches!(err.status, Some(status) if (400..500).contains(&status))
}

async fn read_events(
    client: &BackendClient,
    token: Option<&str>,
    decoder: &mut SseDecoder,
    tx: &mpsc::Sender<PushNotification>,
) -> ConsoleResult<()> {
    let resp = client
        .open_event_stream(EVENTS_PATH, token, decoder.last_event_id())
        .await?;
    info!("Push channel open");

    let mut stream = resp.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ConsoleError::from)?;
        for event in decoder.feed(&chunk) {
            let Some(notification) = parse_notification(&event) else {
                continue;
            };
            debug!("Push notification: {:?}", notification);
            if tx.send(notification).await.is_err() {
                // Subscriber went away.
                return Ok(());
            }
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════
