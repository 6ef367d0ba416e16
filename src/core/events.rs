//=========================================================================
// Transition Events
//=========================================================================
//
// Batched journal of transition lifecycle events.
//
// The sequencer pushes events as it advances; the host reads them and
// clears the log at its own tick boundary. Multiple readers may inspect
// the same batch before it is cleared.
//
// Pattern: push → read (N consumers) → clear → repeat
//
//=========================================================================

//=== Internal Dependencies ===============================================

use crate::core::stage::{SceneKey, StageError};

//=== Transition Event ====================================================

/// Lifecycle event emitted while a transition runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionEvent<K: SceneKey> {
    /// The fade-out toward the target has begun.
    Started { target: K },

    /// The target is loaded and has been promoted to active.
    Activated { target: K },

    /// Fade-in finished and all unloads drained; the scene-set
    /// invariant holds.
    Completed { target: K },

    /// The target failed to load; the previous scene stays active.
    Failed { target: K, error: StageError },
}

impl<K: SceneKey> TransitionEvent<K> {
    /// The scene this event refers to.
    pub fn target(&self) -> K {
        match self {
            Self::Started { target }
            | Self::Activated { target }
            | Self::Completed { target }
            | Self::Failed { target, .. } => *target,
        }
    }
}

//=== Event Log ===========================================================

/// Append-only event batch, cleared by the host at tick boundaries.
pub struct EventLog<K: SceneKey> {
    events: Vec<TransitionEvent<K>>,
}

impl<K: SceneKey> EventLog<K> {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event to the current batch.
    pub fn push(&mut self, event: TransitionEvent<K>) {
        self.events.push(event);
    }

    /// Returns the current batch.
    pub fn read(&self) -> &[TransitionEvent<K>] {
        &self.events
    }

    /// Returns true if any events are batched.
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Returns the number of batched events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clears the batch, preserving allocated capacity.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Takes the whole batch, leaving the log empty.
    pub fn take(&mut self) -> Vec<TransitionEvent<K>> {
        std::mem::take(&mut self.events)
    }
}

impl<K: SceneKey> Default for EventLog<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestScene {
        A,
        B,
    }

    impl SceneKey for TestScene {}

    #[test]
    fn new_log_is_empty() {
        let log: EventLog<TestScene> = EventLog::new();
        assert!(log.is_empty());
        assert!(!log.has_events());
        assert_eq!(log.read().len(), 0);
    }

    #[test]
    fn push_and_read_preserve_order() {
        let mut log = EventLog::new();
        log.push(TransitionEvent::Started { target: TestScene::A });
        log.push(TransitionEvent::Activated { target: TestScene::A });
        log.push(TransitionEvent::Completed { target: TestScene::A });

        let events = log.read();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], TransitionEvent::Started { target: TestScene::A });
        assert_eq!(
            events[2],
            TransitionEvent::Completed { target: TestScene::A }
        );
    }

    #[test]
    fn multiple_reads_see_same_batch() {
        let mut log = EventLog::new();
        log.push(TransitionEvent::Started { target: TestScene::B });

        assert_eq!(log.read().len(), 1);
        assert_eq!(log.read().len(), 1);
        assert!(log.has_events());
    }

    #[test]
    fn clear_empties_the_batch() {
        let mut log = EventLog::new();
        log.push(TransitionEvent::Started { target: TestScene::A });

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn take_drains_the_batch() {
        let mut log = EventLog::new();
        log.push(TransitionEvent::Started { target: TestScene::A });
        log.push(TransitionEvent::Completed { target: TestScene::A });

        let batch = log.take();
        assert_eq!(batch.len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn event_target_accessor() {
        let started = TransitionEvent::Started { target: TestScene::A };
        let failed = TransitionEvent::Failed {
            target: TestScene::B,
            error: crate::core::stage::StageError::Disconnected,
        };

        assert_eq!(started.target(), TestScene::A);
        assert_eq!(failed.target(), TestScene::B);
    }
}
