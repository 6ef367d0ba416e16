//=========================================================================
// Transition Sequencer
//=========================================================================
//
// The transition state machine.
//
// One transition runs at a time, advanced by tick():
//
//   FadingOut ──(level == 1)──> Loading ──(ticket ready)──┐
//       │                          │                      │
//       │                          └─(ticket failed)──> Failing
//       │                                                 │
//       └─(target already loaded)──> FadingIn <───────────┘ (activate +
//                                       │                    unloads on
//                                       ├─(unloads pending)  the ready
//                                       ▼                    path only)
//                                    Draining ──> idle
//
// Activation promotes the target, then issues an unload for every
// loaded scene outside the persistent set {target, bootstrap, carried}.
// Unload tickets are tracked and polled each tick; a transition only
// reports Completed once the fade-in has finished and the tracked
// unloads have drained, so the post-transition scene-set invariant is
// observed, not assumed.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

use log::{debug, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::events::{EventLog, TransitionEvent};
use crate::core::stage::{SceneKey, Stage, Ticket, TicketStatus};
use super::{Fader, TransitionQueue};

//=== Transition Phases ===================================================

enum Phase {
    /// Driving the overlay to fully occluded.
    FadingOut,

    /// Awaiting the target's additive load.
    Loading(Ticket),

    /// Driving the overlay back to clear after activation.
    FadingIn,

    /// Overlay is clear; waiting for tracked unloads to drain.
    Draining,

    /// Driving the overlay back to clear after a failed load.
    Failing,
}

struct Flight<K: SceneKey> {
    target: K,
    phase: Phase,
}

//=== Sequencer ===========================================================

/// Single-flight transition state machine with persistent-scene
/// tracking.
///
/// Owns the fade state, the request queue, the in-flight transition,
/// and the set of unload tickets still settling. Deterministic: given
/// the same stage behavior and the same sequence of tick instants, it
/// makes the same moves.
pub struct Sequencer<K: SceneKey> {
    bootstrap: K,
    carried: Option<K>,
    fader: Fader,
    queue: TransitionQueue<K>,
    current: Option<Flight<K>>,
    pending_unloads: Vec<Ticket>,
}

impl<K: SceneKey> Sequencer<K> {
    //--- Construction -----------------------------------------------------

    /// Creates an idle sequencer.
    ///
    /// `bootstrap` and `carried` (when set) are exempt from unloading
    /// for the sequencer's lifetime.
    pub fn new(bootstrap: K, carried: Option<K>, fade_duration: Duration) -> Self {
        Self {
            bootstrap,
            carried,
            fader: Fader::new(fade_duration),
            queue: TransitionQueue::new(),
            current: None,
            pending_unloads: Vec::new(),
        }
    }

    //--- Queries ----------------------------------------------------------

    /// The scene that was active when the sequencer was created.
    pub fn bootstrap(&self) -> K {
        self.bootstrap
    }

    /// Current overlay level (0 = clear, 1 = fully occluded).
    pub fn fade_level(&self) -> f32 {
        self.fader.level()
    }

    /// The target of the in-flight transition, if any.
    pub fn in_flight(&self) -> Option<K> {
        self.current.as_ref().map(|flight| flight.target)
    }

    /// Returns true while a transition is in flight or queued.
    pub fn is_transitioning(&self) -> bool {
        self.current.is_some() || !self.queue.is_empty()
    }

    /// Number of targets waiting behind the in-flight transition.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of unload tickets still settling.
    pub fn pending_unloads(&self) -> usize {
        self.pending_unloads.len()
    }

    //--- Requests ---------------------------------------------------------

    /// Requests a transition to `target`.
    ///
    /// Fire-and-forget. Requests issued while a transition is in flight
    /// are queued FIFO and run after the current sequence reaches a
    /// terminal state.
    pub fn request(&mut self, target: K) {
        debug!("Transition to {:?} requested", target);
        self.queue.push(target);
    }

    //--- Tick -------------------------------------------------------------

    /// Advances the sequencer by one scheduling tick.
    ///
    /// Pumps the stage, polls tracked unloads, advances the in-flight
    /// transition, and starts the next queued transition when idle.
    pub fn tick<S: Stage<K>>(
        &mut self,
        stage: &mut S,
        events: &mut EventLog<K>,
        now: Instant,
    ) {
        stage.pump();
        self.poll_unloads();
        self.advance(stage, events, now);
        self.maybe_start(events, now);
    }

    //--- Internal Helpers -------------------------------------------------

    fn poll_unloads(&mut self) {
        self.pending_unloads.retain_mut(|ticket| match ticket.poll() {
            TicketStatus::Pending => true,
            TicketStatus::Ready => false,
            TicketStatus::Failed(error) => {
                warn!("Unload failed, abandoning: {}", error);
                false
            }
        });
    }

    fn advance<S: Stage<K>>(
        &mut self,
        stage: &mut S,
        events: &mut EventLog<K>,
        now: Instant,
    ) {
        let Some(flight) = self.current.take() else {
            return;
        };
        let target = flight.target;

        let next_phase = match flight.phase {
            Phase::FadingOut => {
                if self.fader.tick(now) {
                    // Overlay is exactly opaque; the load step begins here
                    if stage.is_loaded(target) {
                        debug!("Target {:?} already loaded, skipping load request", target);
                        self.activate(stage, events, target);
                        self.fader.retarget(0.0, now);
                        Some(Phase::FadingIn)
                    } else {
                        debug!("Requesting additive load of {:?}", target);
                        Some(Phase::Loading(stage.load_additive(target)))
                    }
                } else {
                    Some(Phase::FadingOut)
                }
            }

            Phase::Loading(mut ticket) => match ticket.poll() {
                TicketStatus::Pending => Some(Phase::Loading(ticket)),
                TicketStatus::Ready => {
                    self.activate(stage, events, target);
                    self.fader.retarget(0.0, now);
                    Some(Phase::FadingIn)
                }
                TicketStatus::Failed(error) => {
                    warn!("Load of {:?} failed: {}", target, error);
                    events.push(TransitionEvent::Failed { target, error });
                    // Previous scene stays active; clear the overlay so
                    // the screen is not left occluded
                    self.fader.retarget(0.0, now);
                    Some(Phase::Failing)
                }
            },

            Phase::FadingIn => {
                if self.fader.tick(now) {
                    if self.pending_unloads.is_empty() {
                        self.complete(events, target);
                        None
                    } else {
                        debug!(
                            "Fade-in done, draining {} unload(s) for {:?}",
                            self.pending_unloads.len(),
                            target
                        );
                        Some(Phase::Draining)
                    }
                } else {
                    Some(Phase::FadingIn)
                }
            }

            Phase::Draining => {
                if self.pending_unloads.is_empty() {
                    self.complete(events, target);
                    None
                } else {
                    Some(Phase::Draining)
                }
            }

            Phase::Failing => {
                if self.fader.tick(now) {
                    None
                } else {
                    Some(Phase::Failing)
                }
            }
        };

        if let Some(phase) = next_phase {
            self.current = Some(Flight { target, phase });
        }
    }

    fn activate<S: Stage<K>>(&mut self, stage: &mut S, events: &mut EventLog<K>, target: K) {
        stage.set_active(target);
        events.push(TransitionEvent::Activated { target });

        // Unload everything outside the persistent set
        for scene in stage.loaded_scenes() {
            if scene == target || scene == self.bootstrap || Some(scene) == self.carried {
                continue;
            }
            debug!("Unloading stale scene {:?}", scene);
            self.pending_unloads.push(stage.unload(scene));
        }
    }

    fn complete(&mut self, events: &mut EventLog<K>, target: K) {
        info!("Transition to {:?} complete", target);
        events.push(TransitionEvent::Completed { target });
    }

    fn maybe_start(&mut self, events: &mut EventLog<K>, now: Instant) {
        if self.current.is_some() || !self.pending_unloads.is_empty() {
            return;
        }

        if let Some(target) = self.queue.pop() {
            info!("Starting transition to {:?}", target);
            events.push(TransitionEvent::Started { target });
            self.fader.retarget(1.0, now);
            self.current = Some(Flight {
                target,
                phase: Phase::FadingOut,
            });
        }
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::stage::{MemoryStage, StageError};
    use std::collections::HashSet;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestScene {
        Master,
        Carried,
        Level1,
        Level2,
        Missing,
    }

    impl SceneKey for TestScene {}

    const STEP: Duration = Duration::from_millis(10);
    const FADE: Duration = Duration::from_millis(100);

    struct Harness {
        stage: MemoryStage<TestScene>,
        sequencer: Sequencer<TestScene>,
        events: EventLog<TestScene>,
        now: Instant,
    }

    impl Harness {
        /// Master active, Carried loaded, Level1/Level2 registered.
        fn new() -> Self {
            let mut stage = MemoryStage::new();
            stage.register_active(TestScene::Master);
            stage.register_loaded(TestScene::Carried);
            stage.register(TestScene::Level1);
            stage.register(TestScene::Level2);

            Self {
                stage,
                sequencer: Sequencer::new(TestScene::Master, Some(TestScene::Carried), FADE),
                events: EventLog::new(),
                now: Instant::now(),
            }
        }

        fn tick(&mut self) {
            self.now += STEP;
            self.sequencer
                .tick(&mut self.stage, &mut self.events, self.now);
        }

        fn run_until_idle(&mut self) {
            for _ in 0..1_000 {
                self.tick();
                if !self.sequencer.is_transitioning()
                    && self.sequencer.pending_unloads() == 0
                {
                    return;
                }
            }
            panic!("sequencer did not settle within 1000 ticks");
        }

        fn loaded_set(&self) -> HashSet<TestScene> {
            self.stage.loaded_scenes().into_iter().collect()
        }
    }

    fn set(scenes: &[TestScene]) -> HashSet<TestScene> {
        scenes.iter().copied().collect()
    }

    //--- Core Sequence Tests ----------------------------------------------

    #[test]
    fn transition_reaches_invariant_set() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Level1);
        h.run_until_idle();

        assert_eq!(
            h.loaded_set(),
            set(&[TestScene::Master, TestScene::Carried, TestScene::Level1])
        );
        assert_eq!(h.stage.active_scene(), Some(TestScene::Level1));
        assert_eq!(h.sequencer.fade_level(), 0.0);
    }

    #[test]
    fn serial_transitions_each_reach_invariant() {
        let mut h = Harness::new();

        h.sequencer.request(TestScene::Level1);
        h.run_until_idle();
        assert_eq!(
            h.loaded_set(),
            set(&[TestScene::Master, TestScene::Carried, TestScene::Level1])
        );

        h.sequencer.request(TestScene::Level2);
        h.run_until_idle();
        assert_eq!(
            h.loaded_set(),
            set(&[TestScene::Master, TestScene::Carried, TestScene::Level2])
        );
        assert_eq!(h.stage.active_scene(), Some(TestScene::Level2));
    }

    #[test]
    fn fade_is_opaque_when_load_begins() {
        let mut h = Harness::new();
        h.stage.set_load_latency(5);
        h.sequencer.request(TestScene::Level1);

        // Tick until the load request is actually pending in the stage
        for _ in 0..1_000 {
            h.tick();
            if h.stage.pending_ops() > 0 {
                break;
            }
        }

        assert_eq!(h.stage.pending_ops(), 1, "load should be in flight");
        assert_eq!(h.sequencer.fade_level(), 1.0);
    }

    #[test]
    fn fade_rises_then_falls_monotonically() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Level1);

        let mut levels = Vec::new();
        for _ in 0..1_000 {
            h.tick();
            levels.push(h.sequencer.fade_level());
            if !h.sequencer.is_transitioning() && h.sequencer.pending_unloads() == 0 {
                break;
            }
        }

        let peak = levels
            .iter()
            .position(|&level| level == 1.0)
            .expect("fade must reach fully occluded");

        for window in levels[..=peak].windows(2) {
            assert!(window[0] <= window[1], "fade-out must be non-decreasing");
        }
        for window in levels[peak..].windows(2) {
            assert!(window[0] >= window[1], "fade-in must be non-increasing");
        }
        assert_eq!(*levels.last().expect("at least one sample"), 0.0);
    }

    #[test]
    fn transition_to_active_scene_runs_full_fade_without_load() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Master);

        let mut saw_opaque = false;
        for _ in 0..1_000 {
            h.tick();
            if h.sequencer.fade_level() == 1.0 {
                saw_opaque = true;
            }
            if !h.sequencer.is_transitioning() && h.sequencer.pending_unloads() == 0 {
                break;
            }
        }

        assert!(saw_opaque, "full fade cycle must run");
        assert_eq!(h.stage.load_requests(), 0, "no load request may be issued");
        assert_eq!(h.stage.active_scene(), Some(TestScene::Master));
        assert_eq!(h.sequencer.fade_level(), 0.0);
    }

    #[test]
    fn stale_scenes_are_unloaded_persistent_set_survives() {
        let mut h = Harness::new();

        // A leftover scene from some earlier flow
        h.stage.register_loaded(TestScene::Level2);

        h.sequencer.request(TestScene::Level1);
        h.run_until_idle();

        assert_eq!(
            h.loaded_set(),
            set(&[TestScene::Master, TestScene::Carried, TestScene::Level1])
        );
    }

    #[test]
    fn completion_waits_for_unload_drain() {
        let mut h = Harness::new();
        h.stage.register_loaded(TestScene::Level2);
        h.stage.set_unload_latency(40);
        h.sequencer.request(TestScene::Level1);

        // Wait for the fade-in to finish while unloads are still settling
        for _ in 0..1_000 {
            h.tick();
            if h.sequencer.fade_level() == 0.0 && h.sequencer.pending_unloads() > 0 {
                break;
            }
        }
        assert!(
            h.events
                .read()
                .iter()
                .all(|e| !matches!(e, TransitionEvent::Completed { .. })),
            "completion must not be reported while unloads are pending"
        );

        h.run_until_idle();
        assert!(h
            .events
            .read()
            .iter()
            .any(|e| matches!(e, TransitionEvent::Completed { target: TestScene::Level1 })));
        assert!(!h.stage.is_loaded(TestScene::Level2));
    }

    //--- Queueing Tests ---------------------------------------------------

    #[test]
    fn overlapping_requests_are_queued_and_run_in_order() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Level1);
        h.sequencer.request(TestScene::Level2);

        assert_eq!(h.sequencer.queued(), 2);
        h.run_until_idle();

        let completions: Vec<_> = h
            .events
            .read()
            .iter()
            .filter_map(|e| match e {
                TransitionEvent::Completed { target } => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(completions, vec![TestScene::Level1, TestScene::Level2]);

        // Final state reflects the last request
        assert_eq!(h.stage.active_scene(), Some(TestScene::Level2));
        assert_eq!(
            h.loaded_set(),
            set(&[TestScene::Master, TestScene::Carried, TestScene::Level2])
        );
    }

    #[test]
    fn request_mid_flight_waits_for_current_sequence() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Level1);

        // Let the first transition get airborne, then request another
        for _ in 0..3 {
            h.tick();
        }
        assert_eq!(h.sequencer.in_flight(), Some(TestScene::Level1));
        h.sequencer.request(TestScene::Level2);
        assert_eq!(h.sequencer.in_flight(), Some(TestScene::Level1));

        h.run_until_idle();
        assert_eq!(h.stage.active_scene(), Some(TestScene::Level2));
    }

    //--- Failure Tests ----------------------------------------------------

    #[test]
    fn failed_load_keeps_previous_scene_and_clears_overlay() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Missing);
        h.run_until_idle();

        assert_eq!(h.stage.active_scene(), Some(TestScene::Master));
        assert_eq!(h.sequencer.fade_level(), 0.0);

        let failed: Vec<_> = h
            .events
            .read()
            .iter()
            .filter_map(|e| match e {
                TransitionEvent::Failed { target, error } => Some((*target, error.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, TestScene::Missing);
        assert!(matches!(failed[0].1, StageError::UnknownScene(_)));
    }

    #[test]
    fn queued_transition_runs_after_a_failure() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Missing);
        h.sequencer.request(TestScene::Level1);
        h.run_until_idle();

        assert_eq!(h.stage.active_scene(), Some(TestScene::Level1));
        assert!(h
            .events
            .read()
            .iter()
            .any(|e| matches!(e, TransitionEvent::Completed { target: TestScene::Level1 })));
    }

    #[test]
    fn failed_transition_emits_no_completion() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Missing);
        h.run_until_idle();

        assert!(h
            .events
            .read()
            .iter()
            .all(|e| !matches!(e, TransitionEvent::Completed { .. })));
    }

    //--- Event Ordering ---------------------------------------------------

    #[test]
    fn event_sequence_for_successful_transition() {
        let mut h = Harness::new();
        h.sequencer.request(TestScene::Level1);
        h.run_until_idle();

        let events = h.events.read();
        assert_eq!(
            events[0],
            TransitionEvent::Started { target: TestScene::Level1 }
        );
        assert_eq!(
            events[1],
            TransitionEvent::Activated { target: TestScene::Level1 }
        );
        assert_eq!(
            events[2],
            TransitionEvent::Completed { target: TestScene::Level1 }
        );
    }
}
