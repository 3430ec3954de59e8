use crate::error::Result;
use crate::mission::context::MissionContext;

// ---------------------------------------------------------------------------
// Mission events: condition/action pairs checked after every step call
// ---------------------------------------------------------------------------

/// What an event action asks of the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Continue,
    /// Stop the mission after the current tick.
    Halt,
}

pub type Condition<V> = Box<dyn FnMut(&MissionContext<V>) -> bool>;
pub type Action<V> = Box<dyn FnMut(&mut MissionContext<V>) -> Result<EventOutcome>>;

pub struct Event<V> {
    condition: Condition<V>,
    action: Action<V>,
    persistent: bool,
}

impl<V> Event<V> {
    /// A one-shot event: removed from the table once it has fired.
    pub fn new<C, A>(condition: C, action: A) -> Self
    where
        C: FnMut(&MissionContext<V>) -> bool + 'static,
        A: FnMut(&mut MissionContext<V>) -> Result<EventOutcome> + 'static,
    {
        Self {
            condition: Box::new(condition),
            action: Box::new(action),
            persistent: false,
        }
    }

    /// Keep the event after it fires, so it can fire on every tick its
    /// condition holds.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub(crate) fn check(&mut self, ctx: &MissionContext<V>) -> bool {
        (self.condition)(ctx)
    }

    pub(crate) fn fire(&mut self, ctx: &mut MissionContext<V>) -> Result<EventOutcome> {
        (self.action)(ctx)
    }
}

/// Named events kept in insertion order, which is also evaluation order.
///
/// While an event is being evaluated its slot stays in the table, empty, so
/// `contains` and `names` still report it.
pub struct EventTable<V> {
    entries: Vec<(String, Option<Event<V>>)>,
}

impl<V> Default for EventTable<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> EventTable<V> {
    /// Register an event. Re-using a name replaces the old event in place.
    pub fn insert(&mut self, name: impl Into<String>, event: Event<V>) {
        let name = name.into();
        match self.slot(&name) {
            Some(slot) => *slot = Some(event),
            None => self.entries.push((name, Some(event))),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(&mut self, name: &str) -> Option<&mut Option<Event<V>>> {
        self.entries.iter_mut().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    /// Lift an event out for evaluation, leaving its slot behind.
    pub(crate) fn take(&mut self, name: &str) -> Option<Event<V>> {
        self.slot(name).and_then(Option::take)
    }

    /// Put a taken event back. A no-op when its slot was removed or refilled
    /// while it was out.
    pub(crate) fn restore(&mut self, name: &str, event: Event<V>) {
        if let Some(slot) = self.slot(name) {
            if slot.is_none() {
                *slot = Some(event);
            }
        }
    }

    /// Drop the slot of a spent one-shot event unless it was refilled.
    pub(crate) fn retire(&mut self, name: &str) {
        self.entries.retain(|(n, e)| n != name || e.is_some());
    }
}
