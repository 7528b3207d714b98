//! Event channel built on crossbeam-channel.
//!
//! Workers hold cloned [`EventSender`]s; a single observer (usually the
//! progress monitor) drains the matching [`EventReceiver`]. Sending never
//! fails from the worker's point of view, so observers can be removed
//! without touching the data path.

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use super::Event;

/// Sending half, cheap to clone into every worker
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Send an event.
    ///
    /// A dropped receiver is not an error: the event is discarded.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Outcome of a timed receive
#[derive(Debug)]
pub enum Received {
    /// An event arrived
    Event(Event),
    /// Nothing arrived within the timeout
    Idle,
    /// Every sender has been dropped
    Closed,
}

/// Receiving half, owned by one observer
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, or `None` once all senders are gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Take an event if one is queued
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Wait at most `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Received {
        match self.inner.recv_timeout(timeout) {
            Ok(event) => Received::Event(event),
            Err(RecvTimeoutError::Timeout) => Received::Idle,
            Err(RecvTimeoutError::Disconnected) => Received::Closed,
        }
    }

    /// Iterate until all senders are dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel. Events are small, so this is the usual choice.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Bounded channel, for observers that need backpressure
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender nobody listens to, for runs without progress output
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{IngestEvent, IngestProgress, PipelineEvent};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Ingest(IngestEvent::Progress(IngestProgress {
                completed: 5,
                total: 25,
                current_path: PathBuf::from("/test.jpg"),
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Ingest(IngestEvent::Progress(p)) => assert_eq!(p.completed, 5),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Pipeline(PipelineEvent::Started));
    }

    #[test]
    fn bounded_channel_respects_capacity() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.send(Event::Pipeline(PipelineEvent::Started));
        sender.send(Event::Pipeline(PipelineEvent::Started));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn recv_timeout_reports_idle_then_closed() {
        let (sender, receiver) = EventChannel::new();

        assert!(matches!(
            receiver.recv_timeout(Duration::from_millis(5)),
            Received::Idle
        ));

        drop(sender);
        assert!(matches!(
            receiver.recv_timeout(Duration::from_millis(5)),
            Received::Closed
        ));
    }

    #[test]
    fn iteration_ends_when_all_senders_drop() {
        let (sender, receiver) = EventChannel::new();
        let clone = sender.clone();

        sender.send(Event::Pipeline(PipelineEvent::Started));
        clone.send(Event::Pipeline(PipelineEvent::Cancelled));
        drop(sender);
        drop(clone);

        assert_eq!(receiver.iter().count(), 2);
    }
}
