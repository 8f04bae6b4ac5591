//! Binding of the editable fields to the selected trace and graph.
//!
//! The binder keeps at most one bound entity per kind. Binding subscribes to
//! the entity's changes on the [`ChangeBus`]; rebinding cancels the previous
//! subscription first, so no delivery for a previously selected entity can
//! reach the fields afterwards.

use tracing::debug;

use kt_core::{GraphId, SubscriptionId, TraceId};
use kt_model::{
    Change, ChangeBus, ChangeField, Delivery, Entity, EntityRef, EntityStore, Graph, GraphField,
    Trace, TraceField,
};

use crate::error::{AppError, AppResult};
use crate::fields::{GraphForm, TraceForm, apply_graph_text, apply_trace_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bound<I> {
    id: I,
    subscription: SubscriptionId,
}

#[derive(Debug, Default)]
pub struct Binder {
    trace: Option<Bound<TraceId>>,
    graph: Option<Bound<GraphId>>,
    trace_form: TraceForm,
    graph_form: GraphForm,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound_trace(&self) -> Option<TraceId> {
        self.trace.map(|b| b.id)
    }

    pub fn bound_graph(&self) -> Option<GraphId> {
        self.graph.map(|b| b.id)
    }

    pub fn trace_form(&self) -> &TraceForm {
        &self.trace_form
    }

    pub fn graph_form(&self) -> &GraphForm {
        &self.graph_form
    }

    /// Bind the trace fields to `trace`, or clear them with `None`.
    ///
    /// Returns false when `trace` is already bound.
    pub fn bind_trace(&mut self, bus: &mut ChangeBus, trace: Option<&Trace>) -> bool {
        let next = trace.map(Entity::id);
        if self.bound_trace() == next && self.trace.is_none_or(|b| bus.is_live(b.subscription)) {
            return false;
        }

        if let Some(previous) = self.trace.take() {
            bus.unsubscribe(previous.subscription);
        }
        match trace {
            Some(trace) => {
                let subscription = bus.subscribe(EntityRef::Trace(trace.id()));
                self.trace = Some(Bound {
                    id: trace.id(),
                    subscription,
                });
                self.trace_form = TraceForm::from_trace(trace);
            }
            None => self.trace_form = TraceForm::cleared(),
        }
        debug!(trace = ?next, "trace fields rebound");
        true
    }

    /// Bind the graph fields to `graph`, or clear them with `None`.
    ///
    /// Returns false when `graph` is already bound.
    pub fn bind_graph(&mut self, bus: &mut ChangeBus, graph: Option<&Graph>) -> bool {
        let next = graph.map(Entity::id);
        if self.bound_graph() == next && self.graph.is_none_or(|b| bus.is_live(b.subscription)) {
            return false;
        }

        if let Some(previous) = self.graph.take() {
            bus.unsubscribe(previous.subscription);
        }
        match graph {
            Some(graph) => {
                let subscription = bus.subscribe(EntityRef::Graph(graph.id()));
                self.graph = Some(Bound {
                    id: graph.id(),
                    subscription,
                });
                self.graph_form = GraphForm::from_graph(graph);
            }
            None => self.graph_form = GraphForm::cleared(),
        }
        debug!(graph = ?next, "graph fields rebound");
        true
    }

    /// Refresh fields from the deliveries addressed to the current bindings.
    ///
    /// Deliveries for other subscriptions, or for entities that no longer
    /// exist, are ignored. Returns the number of fields refreshed.
    pub fn apply(
        &mut self,
        deliveries: &[Delivery],
        traces: &EntityStore<Trace>,
        graphs: &EntityStore<Graph>,
    ) -> usize {
        let mut refreshed = 0;
        for delivery in deliveries {
            match delivery.change.field {
                ChangeField::Trace(field) => {
                    let Some(bound) = self.trace.filter(|b| b.subscription == delivery.subscription)
                    else {
                        continue;
                    };
                    if let Some(trace) = traces.get(bound.id) {
                        self.trace_form.refresh(field, trace);
                        refreshed += 1;
                    }
                }
                ChangeField::Graph(field) => {
                    let Some(bound) = self.graph.filter(|b| b.subscription == delivery.subscription)
                    else {
                        continue;
                    };
                    if let Some(graph) = graphs.get(bound.id) {
                        self.graph_form.refresh(field, graph);
                        refreshed += 1;
                    }
                }
            }
        }
        refreshed
    }

    /// Commit a text edit of the bound trace. Publishes a change when the
    /// value actually changed.
    pub fn edit_trace(
        &self,
        traces: &mut EntityStore<Trace>,
        bus: &mut ChangeBus,
        field: TraceField,
        text: &str,
    ) -> AppResult<bool> {
        let id = self.bound_trace().ok_or(AppError::NoSelection("trace"))?;
        let trace = traces.get_mut(id).ok_or(AppError::TraceNotFound(id))?;
        let changed = apply_trace_text(trace, field, text)?;
        if changed {
            bus.publish(Change::trace(id, field));
        }
        Ok(changed)
    }

    /// Commit a text edit of the bound graph.
    pub fn edit_graph(
        &self,
        graphs: &mut EntityStore<Graph>,
        bus: &mut ChangeBus,
        field: GraphField,
        text: &str,
    ) -> AppResult<bool> {
        let id = self.bound_graph().ok_or(AppError::NoSelection("graph"))?;
        let graph = graphs.get_mut(id).ok_or(AppError::GraphNotFound(id))?;
        let changed = apply_graph_text(graph, field, text)?;
        if changed {
            bus.publish(Change::graph(id, field));
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kt_model::{EntityKind, GraphDefaults};

    fn stores() -> (EntityStore<Trace>, EntityStore<Graph>, TraceId, TraceId) {
        let mut traces = EntityStore::new();
        let t1 = traces.insert(|id| Trace::new(id, "T1"));
        let t2 = traces.insert(|id| Trace::new(id, "T2"));
        (traces, EntityStore::new(), t1, t2)
    }

    #[test]
    fn rebinding_drops_the_previous_subscription() {
        let (traces, _, t1, t2) = stores();
        let mut bus = ChangeBus::new();
        let mut binder = Binder::new();

        assert!(binder.bind_trace(&mut bus, traces.get(t1)));
        assert!(!binder.bind_trace(&mut bus, traces.get(t1)));
        assert!(binder.bind_trace(&mut bus, traces.get(t2)));
        assert_eq!(bus.live_count(EntityKind::Trace), 1);
        assert_eq!(binder.trace_form().name, "T2");

        binder.bind_trace(&mut bus, None);
        assert_eq!(bus.live_count(EntityKind::Trace), 0);
        assert_eq!(binder.trace_form(), &TraceForm::cleared());
    }

    #[test]
    fn edits_of_a_previous_entity_do_not_reach_the_fields() {
        let (mut traces, graphs, t1, t2) = stores();
        let mut bus = ChangeBus::new();
        let mut binder = Binder::new();
        binder.bind_trace(&mut bus, traces.get(t1));

        // T1 changes behind the binder's back after it moved on to T2.
        traces.get_mut(t1).unwrap().set_name("renamed");
        bus.publish(Change::trace(t1, TraceField::Name));
        binder.bind_trace(&mut bus, traces.get(t2));

        let deliveries = bus.drain();
        assert_eq!(binder.apply(&deliveries, &traces, &graphs), 0);
        assert_eq!(binder.trace_form().name, "T2");
    }

    #[test]
    fn edit_round_trip_through_the_bus() {
        let (mut traces, graphs, t1, _) = stores();
        let mut bus = ChangeBus::new();
        let mut binder = Binder::new();
        binder.bind_trace(&mut bus, traces.get(t1));

        assert!(binder.edit_trace(&mut traces, &mut bus, TraceField::Step, "0,5").unwrap());
        let deliveries = bus.drain();
        assert_eq!(binder.apply(&deliveries, &traces, &graphs), 1);
        assert_eq!(binder.trace_form().step, "0.5");
    }

    #[test]
    fn unbinding_a_detached_subscription_is_harmless() {
        let mut graphs = EntityStore::new();
        let g = graphs.insert(|id| Graph::new(id, "G", None, &GraphDefaults::default()));
        let mut bus = ChangeBus::new();
        let mut binder = Binder::new();
        binder.bind_graph(&mut bus, graphs.get(g));

        // Subscription detached elsewhere; rebinding the same graph restores it.
        let sub = binder.graph.unwrap().subscription;
        bus.unsubscribe(sub);
        assert!(binder.bind_graph(&mut bus, graphs.get(g)));
        assert_eq!(bus.live_count(EntityKind::Graph), 1);

        graphs.remove(g);
        binder.bind_graph(&mut bus, None);
        assert_eq!(bus.live_count(EntityKind::Graph), 0);
    }

    #[test]
    fn edit_without_binding() {
        let (mut traces, _, _, _) = stores();
        let mut bus = ChangeBus::new();
        let err = Binder::new()
            .edit_trace(&mut traces, &mut bus, TraceField::Mass, "1")
            .unwrap_err();
        assert!(matches!(err, AppError::NoSelection("trace")));
    }
}
