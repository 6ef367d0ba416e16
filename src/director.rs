//=========================================================================
// Director
//=========================================================================
//
// Main entry point and coordinator facade.
//
// Architecture:
// ```text
//     DirectorBuilder  ──build(stage)──>  Director  ──tick(now)──> ...
//         │                                  │
//         ├─ with_fade_duration()            ├─ owns the Stage
//         ├─ with_carried_forward()          ├─ owns the Sequencer
//         ├─ with_auto_boot()                └─ owns the EventLog
//         └─ with_residency()
// ```
//
// The director is explicitly constructed and explicitly owned by the
// host; there is no process-wide instance. It records the stage's
// active scene as the bootstrap scene at build time and keeps that
// scene (plus the optional carried-forward scene) exempt from
// unloading for its whole lifetime.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};

//=== Internal Dependencies ===============================================

use crate::core::events::{EventLog, TransitionEvent};
use crate::core::stage::{PersistenceMarker, Residency, SceneKey, Stage};
use crate::core::transition::Sequencer;

//=== Director Errors =====================================================

/// Construction failures for [`Director`].
#[derive(Debug)]
pub enum DirectorError {
    /// The stage reported no active scene to record as bootstrap.
    NoActiveScene,

    /// The requested residency slot is already held by a live director.
    AlreadyResident(String),
}

impl std::fmt::Display for DirectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveScene => {
                write!(f, "stage has no active scene to record as bootstrap")
            }
            Self::AlreadyResident(slot) => {
                write!(f, "coordinator slot '{}' is already live", slot)
            }
        }
    }
}

impl std::error::Error for DirectorError {}

//=== DirectorBuilder =====================================================

/// Builder for configuring and constructing a [`Director`].
///
/// Provides a fluent API for setting coordinator parameters before
/// construction.
///
/// # Default Values
///
/// - **Fade duration**: 350 ms per fade segment
/// - **Carried-forward scene**: none
/// - **Auto-boot**: disabled
///
/// # Examples
///
/// Simple usage with defaults:
/// ```
/// use stagehand::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum GameScene { Master, Level1 }
/// impl SceneKey for GameScene {}
///
/// let mut stage = MemoryStage::new();
/// stage.register_active(GameScene::Master);
/// stage.register(GameScene::Level1);
///
/// let mut director = DirectorBuilder::new()
///     .build(stage)
///     .expect("stage has an active scene");
///
/// director.next(GameScene::Level1);
/// ```
///
/// Full configuration:
/// ```
/// # use stagehand::prelude::*;
/// # use std::time::Duration;
/// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// # enum GameScene { Master, Carried, Splash }
/// # impl SceneKey for GameScene {}
/// # let mut stage = MemoryStage::new();
/// # stage.register_active(GameScene::Master);
/// # stage.register_loaded(GameScene::Carried);
/// # stage.register(GameScene::Splash);
/// let director = DirectorBuilder::new()
///     .with_fade_duration(Duration::from_millis(500))
///     .with_carried_forward(GameScene::Carried)
///     .with_auto_boot(GameScene::Splash, Duration::from_secs(2))
///     .build(stage)
///     .expect("stage has an active scene");
/// ```
pub struct DirectorBuilder<K: SceneKey> {
    fade_duration: Duration,
    carried_forward: Option<K>,
    auto_boot: Option<(K, Duration)>,
    residency: Option<(Arc<Residency>, String)>,
}

impl<K: SceneKey> DirectorBuilder<K> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            fade_duration: Duration::from_millis(350),
            carried_forward: None,
            auto_boot: None,
            residency: None,
        }
    }

    /// Sets the duration of each fade segment (out and in separately).
    ///
    /// Measured in unscaled wall-clock time.
    ///
    /// Default: 350 ms.
    ///
    /// # Panics
    ///
    /// Panics if the duration is zero.
    pub fn with_fade_duration(mut self, duration: Duration) -> Self {
        assert!(!duration.is_zero(), "fade duration must be positive");
        self.fade_duration = duration;
        self
    }

    /// Designates a scene that is never unloaded by transitions.
    ///
    /// Conventionally the container scene hosting persistent objects
    /// that must survive every transition.
    pub fn with_carried_forward(mut self, scene: K) -> Self {
        self.carried_forward = Some(scene);
        self
    }

    /// Enables auto-boot: after `delay` of coordinator uptime, if
    /// `first` is not already loaded, a transition to it runs as if
    /// requested via [`Director::next`].
    ///
    /// Lets the bootstrap scene double as a splash screen before the
    /// real first scene loads. One-shot.
    pub fn with_auto_boot(mut self, first: K, delay: Duration) -> Self {
        self.auto_boot = Some((first, delay));
        self
    }

    /// Claims a named slot in `registry` at build time.
    ///
    /// While the director lives, any further build attempt against the
    /// same slot fails with [`DirectorError::AlreadyResident`] and the
    /// live director is untouched.
    pub fn with_residency(mut self, registry: Arc<Residency>, slot: impl Into<String>) -> Self {
        self.residency = Some((registry, slot.into()));
        self
    }

    /// Builds the director over the given stage.
    ///
    /// Records the stage's currently active scene as the bootstrap
    /// scene; that scene is exempt from unloading for the director's
    /// lifetime.
    ///
    /// # Errors
    ///
    /// - [`DirectorError::NoActiveScene`] if the stage has no active
    ///   scene.
    /// - [`DirectorError::AlreadyResident`] if the configured residency
    ///   slot is already held.
    pub fn build<S: Stage<K>>(self, stage: S) -> Result<Director<K, S>, DirectorError> {
        let bootstrap = stage.active_scene().ok_or(DirectorError::NoActiveScene)?;

        let resident = match &self.residency {
            Some((registry, slot)) => Some(
                registry
                    .claim(slot.clone())
                    .ok_or_else(|| DirectorError::AlreadyResident(slot.clone()))?,
            ),
            None => None,
        };

        info!(
            "Director created (bootstrap: {:?}, fade: {:?})",
            bootstrap, self.fade_duration
        );

        Ok(Director {
            stage,
            sequencer: Sequencer::new(bootstrap, self.carried_forward, self.fade_duration),
            events: EventLog::new(),
            boot: self.auto_boot.map(|(first, delay)| BootPlan { first, delay }),
            started_at: None,
            _resident: resident,
        })
    }
}

impl<K: SceneKey> Default for DirectorBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Auto-Boot Plan ======================================================

struct BootPlan<K: SceneKey> {
    first: K,
    delay: Duration,
}

//=== Director ============================================================

/// Scene-transition coordinator.
///
/// Drives the fade → load → activate → unload → fade sequence for each
/// requested target, one transition at a time, advanced by
/// [`Director::tick`]. Requests issued mid-transition are queued FIFO.
///
/// After any completed transition, exactly the target, the bootstrap
/// scene, and the carried-forward scene (when configured) are loaded,
/// and the target is active.
///
/// # Examples
///
/// Ticking a transition to completion by hand:
/// ```
/// use stagehand::prelude::*;
/// use std::time::{Duration, Instant};
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// enum GameScene { Master, Level1 }
/// impl SceneKey for GameScene {}
///
/// let mut stage = MemoryStage::new();
/// stage.register_active(GameScene::Master);
/// stage.register(GameScene::Level1);
///
/// let mut director = DirectorBuilder::new()
///     .with_fade_duration(Duration::from_millis(20))
///     .build(stage)
///     .expect("stage has an active scene");
///
/// director.next(GameScene::Level1);
///
/// let mut now = Instant::now();
/// while director.is_transitioning() {
///     now += Duration::from_millis(5);
///     director.tick(now);
/// }
///
/// assert_eq!(director.stage().active_scene(), Some(GameScene::Level1));
/// ```
pub struct Director<K: SceneKey, S: Stage<K>> {
    stage: S,
    sequencer: Sequencer<K>,
    events: EventLog<K>,
    boot: Option<BootPlan<K>>,
    started_at: Option<Instant>,
    _resident: Option<PersistenceMarker>,
}

impl<K: SceneKey, S: Stage<K>> Director<K, S> {
    //--- Requests ---------------------------------------------------------

    /// Requests a transition to `target`.
    ///
    /// Fire-and-forget: the sequence runs across subsequent ticks.
    /// Requests issued while a transition is in flight are queued and
    /// run in order.
    pub fn next(&mut self, target: K) {
        self.sequencer.request(target);
    }

    /// Alias of [`Director::next`].
    pub fn boot(&mut self, target: K) {
        self.next(target);
    }

    //--- Lifecycle --------------------------------------------------------

    /// Marks the coordinator as started, arming the auto-boot timer.
    ///
    /// Optional: the first call to [`Director::tick`] arms the timer
    /// implicitly. Calling `start` more than once has no effect.
    pub fn start(&mut self, now: Instant) {
        if self.started_at.is_none() {
            info!("Director started");
            self.started_at = Some(now);
        }
    }

    /// Advances the coordinator by one scheduling tick.
    ///
    /// Fires the auto-boot transition once its delay has elapsed, then
    /// advances the in-flight transition sequence.
    pub fn tick(&mut self, now: Instant) {
        let started = *self.started_at.get_or_insert(now);

        if let Some(plan) = &self.boot {
            if now.saturating_duration_since(started) >= plan.delay {
                let first = plan.first;
                self.boot = None;

                if self.stage.is_loaded(first) {
                    debug!("Auto-boot target {:?} already loaded, skipping", first);
                } else {
                    info!("Auto-boot: transitioning to {:?}", first);
                    self.sequencer.request(first);
                }
            }
        }

        self.sequencer.tick(&mut self.stage, &mut self.events, now);
    }

    //--- Queries ----------------------------------------------------------

    /// The scene that was active when the director was built.
    pub fn bootstrap(&self) -> K {
        self.sequencer.bootstrap()
    }

    /// Current overlay level (0 = clear, 1 = fully occluded).
    ///
    /// The host draws the overlay; the director only owns the level.
    pub fn fade_level(&self) -> f32 {
        self.sequencer.fade_level()
    }

    /// Returns true while a transition is in flight or queued.
    pub fn is_transitioning(&self) -> bool {
        self.sequencer.is_transitioning() || self.sequencer.pending_unloads() > 0
    }

    /// The underlying stage.
    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Mutable access to the underlying stage.
    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    //--- Events -----------------------------------------------------------

    /// The current event batch.
    pub fn events(&self) -> &EventLog<K> {
        &self.events
    }

    /// Takes the current event batch, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<TransitionEvent<K>> {
        self.events.take()
    }

    /// Clears the current event batch.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

//=========================================================================
// Tests
//=========================================================================
