//! Change notifications from entities to whoever displays them.
//!
//! Mutations publish a [`Change`]. Observers subscribe per entity and pull
//! their deliveries with [`ChangeBus::drain`]. Changes to entities nobody
//! subscribes to are dropped on drain.

use std::collections::VecDeque;

use kt_core::{GraphId, IdSequence, SubscriptionId, TraceId};

use crate::graph::GraphField;
use crate::trace::TraceField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Trace,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Trace(TraceId),
    Graph(GraphId),
}

impl EntityRef {
    pub fn kind(self) -> EntityKind {
        match self {
            EntityRef::Trace(_) => EntityKind::Trace,
            EntityRef::Graph(_) => EntityKind::Graph,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeField {
    Trace(TraceField),
    Graph(GraphField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub entity: EntityRef,
    pub field: ChangeField,
}

impl Change {
    pub fn trace(id: TraceId, field: TraceField) -> Self {
        Self {
            entity: EntityRef::Trace(id),
            field: ChangeField::Trace(field),
        }
    }

    pub fn graph(id: GraphId, field: GraphField) -> Self {
        Self {
            entity: EntityRef::Graph(id),
            field: ChangeField::Graph(field),
        }
    }
}

/// A change routed to one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub subscription: SubscriptionId,
    pub change: Change,
}

#[derive(Debug, Default)]
pub struct ChangeBus {
    subscriptions: Vec<(SubscriptionId, EntityRef)>,
    queue: VecDeque<Change>,
    ids: IdSequence,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, entity: EntityRef) -> SubscriptionId {
        let id = self.ids.next::<SubscriptionId>();
        self.subscriptions.push((id, entity));
        id
    }

    /// Cancel a subscription. Unknown or already cancelled ids are ignored;
    /// returns whether something was removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(sub, _)| *sub != id);
        self.subscriptions.len() != before
    }

    pub fn is_live(&self, id: SubscriptionId) -> bool {
        self.subscriptions.iter().any(|(sub, _)| *sub == id)
    }

    /// Entity a live subscription observes.
    pub fn target(&self, id: SubscriptionId) -> Option<EntityRef> {
        self.subscriptions
            .iter()
            .find(|(sub, _)| *sub == id)
            .map(|(_, entity)| *entity)
    }

    /// Live subscriptions observing entities of `kind`.
    pub fn live_count(&self, kind: EntityKind) -> usize {
        self.subscriptions
            .iter()
            .filter(|(_, entity)| entity.kind() == kind)
            .count()
    }

    pub fn publish(&mut self, change: Change) {
        self.queue.push_back(change);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Route queued changes to the subscriptions live right now, in publish order.
    pub fn drain(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        while let Some(change) = self.queue.pop_front() {
            deliveries.extend(
                self.subscriptions
                    .iter()
                    .filter(|(_, entity)| *entity == change.entity)
                    .map(|(subscription, _)| Delivery {
                        subscription: *subscription,
                        change,
                    }),
            );
        }
        deliveries
    }
}
