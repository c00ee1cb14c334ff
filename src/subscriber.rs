//! Synchronous, ordered broadcast of applied events.

use tokio::sync::mpsc::UnboundedSender;

use crate::event::Event;

/// Receives every event the log applies, in application order.
pub trait EventSubscriber: Send + Sync {
    /// `backward` is `true` when the event is being undone.
    fn on_event(&mut self, event: &Event, backward: bool);
}

impl<F> EventSubscriber for F
where
    F: FnMut(&Event, bool) + Send + Sync,
{
    fn on_event(&mut self, event: &Event, backward: bool) {
        self(event, backward)
    }
}

/// An event delivered through a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub event: Event,
    pub backward: bool,
}

/// Forwards events into an unbounded tokio channel. A closed receiver is
/// ignored.
pub struct ChannelSubscriber {
    tx: UnboundedSender<Notification>,
}

impl ChannelSubscriber {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }
}

impl EventSubscriber for ChannelSubscriber {
    fn on_event(&mut self, event: &Event, backward: bool) {
        let _ = self.tx.send(Notification {
            event: event.clone(),
            backward,
        });
    }
}

/// Explicit subscriber list.
#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Box<dyn EventSubscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl EventSubscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn publish(&mut self, event: &Event, backward: bool) {
        for subscriber in self.subscribers.iter_mut() {
            subscriber.on_event(event, backward);
        }
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "EventBus {{ subscribers: {} }}", self.subscribers.len())
    }
}
