//! Output contracts of the toggle world.
//!
//! Value changes and swallowed invocation failures are recorded as events so a
//! host can observe them after the fact; nothing here feeds back into the
//! state machine.

use serde::{Deserialize, Serialize};
use toggle_api_core::ObjectId;

use crate::ids::ToggleId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ToggleEvent {
    ValueChanged {
        toggle: ToggleId,
        object: ObjectId,
        value: i32,
    },
    InvocationFailed {
        toggle: ToggleId,
        method_id: String,
        message: String,
    },
}

/// Bounded event buffer; the oldest event is dropped when full.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<ToggleEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn push_event(&mut self, event: ToggleEvent, capacity: usize) {
        if capacity == 0 {
            return;
        }
        if self.events.len() >= capacity {
            let excess = self.events.len() + 1 - capacity;
            self.events.drain(..excess);
        }
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ToggleEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(value: i32) -> ToggleEvent {
        ToggleEvent::ValueChanged {
            toggle: ToggleId(0),
            object: ObjectId(0),
            value,
        }
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut out = Outputs::default();
        for v in 0..4 {
            out.push_event(changed(v), 3);
        }
        assert_eq!(out.drain(), vec![changed(1), changed(2), changed(3)]);
        assert!(out.is_empty());
    }
}
