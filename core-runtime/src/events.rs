//! # Event Bus System
//!
//! Broadcasts what the audio engine does to any number of observers using
//! `tokio::sync::broadcast`. Observers are optional: emitting with no
//! subscriber is not an error for the engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐     subscribe    ┌────────────┐
//! │ AudioEngine ├──────────────>│ EventBus  ├─────────────────>│ Subscriber │
//! └─────────────┘               │ (broadcast│                  └────────────┘
//! ┌─────────────┐     emit      │  channel) │     subscribe    ┌────────────┐
//! │ Soundboard  ├──────────────>│           ├─────────────────>│ Subscriber │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, EventStream, SoundEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut failures = EventStream::new(bus.subscribe())
//!     .filter(|event| matches!(event, SoundEvent::LoadFailed { .. }));
//!
//! bus.emit(SoundEvent::LoadFailed {
//!     path: "cow.wav".to_string(),
//!     reason: "not found".to_string(),
//! })
//! .ok();
//!
//! let event = failures.recv().await.unwrap();
//! assert_eq!(event.severity(), core_runtime::events::EventSeverity::Warning);
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Sound Events
// ============================================================================

/// Events emitted by the audio engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SoundEvent {
    /// A channel started sounding.
    Started {
        channel: String,
        path: String,
        /// Position inside the sound where output began.
        offset_ms: u64,
    },
    /// A channel was stopped.
    Stopped {
        channel: String,
        /// Position inside the sound at the moment of stopping.
        offset_ms: u64,
    },
    /// A pending play was overtaken by a newer request on the same channel.
    Superseded { channel: String, path: String },
    /// Fetching or decoding an asset failed.
    LoadFailed { path: String, reason: String },
    /// A preload batch settled.
    PreloadCompleted {
        loaded: usize,
        failed: usize,
        skipped: usize,
    },
    /// The output device reached the running state.
    DeviceResumed,
    /// The platform refused to start the output device.
    DeviceResumeDenied { reason: String },
}

impl SoundEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            SoundEvent::Started { .. } => "Sound started",
            SoundEvent::Stopped { .. } => "Sound stopped",
            SoundEvent::Superseded { .. } => "Pending play superseded",
            SoundEvent::LoadFailed { .. } => "Sound failed to load",
            SoundEvent::PreloadCompleted { .. } => "Preload completed",
            SoundEvent::DeviceResumed => "Audio device running",
            SoundEvent::DeviceResumeDenied { .. } => "Audio device resume denied",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            SoundEvent::LoadFailed { .. } | SoundEvent::DeviceResumeDenied { .. } => {
                EventSeverity::Warning
            }
            SoundEvent::PreloadCompleted { .. } | SoundEvent::DeviceResumed => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another handle on the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SoundEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: SoundEvent) -> Result<usize, SendError<SoundEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<SoundEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&SoundEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<SoundEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<SoundEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SoundEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<SoundEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive a matching event without waiting.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<SoundEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    fn matches(&self, event: &SoundEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn started(channel: &str) -> SoundEvent {
        SoundEvent::Started {
            channel: channel.to_string(),
            path: "sounds/cow.wav".to_string(),
            offset_ms: 0,
        }
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(SoundEvent::DeviceResumed).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        assert_eq!(bus.emit(started("a")).unwrap(), 2);
        assert_eq!(sub1.recv().await.unwrap(), started("a"));
        assert_eq!(sub2.recv().await.unwrap(), started("a"));
    }

    #[tokio::test]
    async fn test_event_stream_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, SoundEvent::Stopped { .. }));

        bus.emit(started("a")).unwrap();
        bus.emit(SoundEvent::Stopped {
            channel: "a".to_string(),
            offset_ms: 120,
        })
        .unwrap();

        match stream.recv().await.unwrap() {
            SoundEvent::Stopped { offset_ms, .. } => assert_eq!(offset_ms, 120),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut stream = EventStream::new(bus.subscribe());

        for i in 0..5 {
            bus.emit(started(&i.to_string())).unwrap();
        }

        assert!(matches!(stream.try_recv(), Some(Err(RecvError::Lagged(_)))));
    }

    #[test]
    fn test_severity_and_description() {
        let failed = SoundEvent::LoadFailed {
            path: "x".to_string(),
            reason: "y".to_string(),
        };
        assert_eq!(failed.severity(), EventSeverity::Warning);
        assert_eq!(started("a").severity(), EventSeverity::Debug);
        assert_eq!(SoundEvent::DeviceResumed.description(), "Audio device running");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&started("k")).unwrap();
        assert!(json.contains("\"event\":\"Started\""));
        let back: SoundEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, started("k"));
    }
}
