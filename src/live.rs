//! Long-lived subscription to the monitor's event stream.
//!
//! A background thread connects, frames the stream and forwards raw events
//! into the dashboard loop. After the stream ends or fails it waits for the
//! retry delay and reconnects, the way a browser event source does. Closing
//! the channel only raises a flag: the reader stops forwarding and exits the
//! next time it wakes up.

use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::runtime::DashEvent;
use crate::sse::{RawEvent, SseParser};

pub const DEFAULT_RETRY: Duration = Duration::from_secs(3);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// A stream silent for this long is treated as dropped and reconnected.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection lifecycle and payloads, as observed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Message(RawEvent),
    TransportError(String),
}

pub struct LiveChannel {
    closed: Arc<AtomicBool>,
    url: String,
}

impl LiveChannel {
    /// Subscribe to `<base_url>/monitor`.
    pub fn open(base_url: &str, tx: Sender<DashEvent>) -> Self {
        Self::open_with_idle_timeout(base_url, tx, IDLE_TIMEOUT)
    }

    pub fn open_with_idle_timeout(
        base_url: &str,
        tx: Sender<DashEvent>,
        idle_timeout: Duration,
    ) -> Self {
        let url = format!("{}/monitor", base_url.trim_end_matches('/'));
        let closed = Arc::new(AtomicBool::new(false));

        let reader = Reader {
            url: url.clone(),
            closed: Arc::clone(&closed),
            tx,
            agent: ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .timeout_read(idle_timeout)
                .build(),
        };
        thread::spawn(move || reader.run());

        tracing::info!(%url, "live channel opened");
        Self { closed, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!(url = %self.url, "live channel closed");
        }
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.close();
    }
}

struct Reader {
    url: String,
    closed: Arc<AtomicBool>,
    tx: Sender<DashEvent>,
    agent: ureq::Agent,
}

enum StreamEnd {
    Closed,
    Disconnected(String),
}

impl Reader {
    fn run(self) {
        let mut retry = DEFAULT_RETRY;
        while !self.is_closed() {
            match self.stream_once(&mut retry) {
                StreamEnd::Closed => break,
                StreamEnd::Disconnected(reason) => {
                    if !self.emit(ChannelEvent::TransportError(reason)) {
                        break;
                    }
                }
            }
            thread::sleep(retry);
        }
        tracing::debug!(url = %self.url, "live reader exiting");
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns false once nobody should hear from this reader again.
    fn emit(&self, event: ChannelEvent) -> bool {
        !self.is_closed() && self.tx.send(DashEvent::Channel(event)).is_ok()
    }

    fn stream_once(&self, retry: &mut Duration) -> StreamEnd {
        let response = match self
            .agent
            .get(&self.url)
            .set("Accept", "text/event-stream")
            .set("Cache-Control", "no-cache")
            .call()
        {
            Ok(response) => response,
            Err(err) => return StreamEnd::Disconnected(err.to_string()),
        };

        if !self.emit(ChannelEvent::Opened) {
            return StreamEnd::Closed;
        }

        let mut parser = SseParser::new();
        let mut reader = BufReader::new(response.into_reader());
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => return StreamEnd::Disconnected(err.to_string()),
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }
            // Bad bytes become U+FFFD; the decoder rejects the event, not the stream.
            let line = String::from_utf8_lossy(&buf);
            if let Some(event) = parser.push_line(&line) {
                if !self.emit(ChannelEvent::Message(event)) {
                    return StreamEnd::Closed;
                }
            }
            if let Some(advertised) = parser.retry() {
                *retry = advertised;
            }
        }

        StreamEnd::Disconnected("stream ended".to_string())
    }
}
