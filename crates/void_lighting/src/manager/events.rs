//! Light manager events

use crossbeam_channel::{Receiver, Sender};

use crate::id::{GroupId, LightId};
use crate::light::LightType;

use super::config::BudgetTier;

/// Lifecycle and per-frame notifications
#[derive(Debug, Clone, PartialEq)]
pub enum LightEvent {
    /// A light was registered
    LightAdded {
        /// Light
        light: LightId,
        /// Its type
        light_type: LightType,
        /// Owning group
        group: Option<GroupId>,
    },
    /// A light was unregistered (returned to the caller or disposed)
    LightRemoved {
        /// Light
        light: LightId,
    },
    /// A light moved between groups
    LightMoved {
        /// Light
        light: LightId,
        /// Previous group
        from: Option<GroupId>,
        /// New group
        to: Option<GroupId>,
    },
    /// A group was created or attached
    GroupAdded {
        /// Group
        group: GroupId,
        /// Parent group
        parent: Option<GroupId>,
    },
    /// A group was detached or disposed
    GroupRemoved {
        /// Group
        group: GroupId,
    },
    /// Budget tier changed
    BudgetChanged {
        /// New tier
        tier: BudgetTier,
        /// Effective light cap
        max_lights: usize,
        /// Effective shadow map cap
        max_shadow_maps: usize,
    },
    /// Lights fell outside the active set because of the caps
    LightsEvicted {
        /// Frame number
        frame: u64,
        /// Dropped lights
        lights: Vec<LightId>,
    },
    /// A frame update finished
    Updated {
        /// Frame number
        frame: u64,
        /// Active lights
        active_lights: usize,
        /// Shadow-casting lights
        shadow_casters: usize,
    },
    /// The manager was disposed
    Disposed,
}

/// Fan-out of events to subscribers
#[derive(Debug, Default)]
pub(crate) struct EventHub {
    subscribers: Vec<Sender<LightEvent>>,
}

impl EventHub {
    pub(crate) fn subscribe(&mut self) -> Receiver<LightEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Deliver to every subscriber, pruning disconnected ones
    pub(crate) fn emit(&mut self, event: LightEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_and_pruning() {
        let mut hub = EventHub::default();
        let first = hub.subscribe();
        let second = hub.subscribe();

        hub.emit(LightEvent::Disposed);
        assert_eq!(first.try_recv(), Ok(LightEvent::Disposed));
        assert_eq!(second.try_recv(), Ok(LightEvent::Disposed));

        drop(second);
        hub.emit(LightEvent::Disposed);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(first.try_iter().count(), 1);
    }
}
