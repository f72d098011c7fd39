// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// In-memory event streaming over tokio broadcast channels. Slow receivers
// lose the oldest events once the channel capacity is exceeded.

use crate::domain::events::{PolicyEvent, ViewEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified domain event type for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    View(ViewEvent),
    Policy(PolicyEvent),
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_view_event(&self, event: ViewEvent) {
        self.publish(DomainEvent::View(event));
    }

    pub fn publish_policy_event(&self, event: PolicyEvent) {
        self.publish(DomainEvent::Policy(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        // send() only fails when nobody is subscribed
        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all domain events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to view lifecycle events only
    pub fn subscribe_views(&self) -> ViewEventReceiver {
        ViewEventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver that skips everything except view lifecycle events
pub struct ViewEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl ViewEventReceiver {
    pub async fn recv(&mut self) -> Result<ViewEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if let DomainEvent::View(view_event) = event {
                return Ok(view_event);
            }
        }
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::view::{CatalogId, ViewId};
    use chrono::Utc;

    fn created(name: &str) -> ViewEvent {
        ViewEvent::ViewCreated {
            view_id: ViewId::new(),
            catalog_id: CatalogId::new(),
            name: name.to_string(),
            rule_count: 1,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.publish_view_event(created("readers"));

        match receiver.recv().await.unwrap() {
            DomainEvent::View(ViewEvent::ViewCreated { name, .. }) => assert_eq!(name, "readers"),
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_view_subscription_skips_policy_events() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe_views();

        event_bus.publish_policy_event(PolicyEvent::AccessDenied {
            operation: "catalog.list".to_string(),
            resource: "res://catalog/x".to_string(),
            reason: None,
            denied_at: Utc::now(),
        });
        event_bus.publish_view_event(created("writers"));

        match receiver.recv().await.unwrap() {
            ViewEvent::ViewCreated { name, .. } => assert_eq!(name, "writers"),
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish_view_event(created("a"));

        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[test]
    fn test_try_recv_empty() {
        let event_bus = EventBus::new(4);
        let mut receiver = event_bus.subscribe();
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }

    #[test]
    fn test_lagged_receiver() {
        let event_bus = EventBus::new(2);
        let mut receiver = event_bus.subscribe();
        for i in 0..5 {
            event_bus.publish_view_event(created(&format!("v{}", i)));
        }
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Lagged(_))));
    }

    #[test]
    fn test_domain_event_tagged_serialization() {
        let json = serde_json::to_value(DomainEvent::View(created("a"))).unwrap();
        assert_eq!(json["type"], "view");
    }
}
