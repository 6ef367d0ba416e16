//=========================================================================
// Stage System
//=========================================================================
//
// The loading collaborator seam.
//
// A `Stage` owns the actual scene content: which scenes are loaded,
// which one is active, and how load/unload requests complete. The
// transition sequencer only ever talks to a stage through this trait,
// so platform backends (an engine's scene loader, a test double, a
// headless simulation) can be swapped without changing coordination
// logic.
//
// Components:
// - `Stage` trait + `SceneKey`: the contract
// - `Ticket` / `TicketSender`: pollable completion handles
// - `MemoryStage`: in-memory implementation for tests and headless hosts
// - `Residency` / `PersistenceMarker`: first-one-wins persistence claims
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt::Debug;
use std::hash::Hash;

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};

//=== Module Declarations =================================================

mod memory;
mod residency;

//=== Public API ==========================================================

pub use memory::MemoryStage;
pub use residency::{PersistenceMarker, Residency};

//=== Scene Key Trait =====================================================

/// Marker trait for scene identifiers.
///
/// Scene keys uniquely identify loadable scenes. Typically implemented
/// by host-specific enums.
pub trait SceneKey: Clone + Copy + Eq + Hash + Debug + Send + 'static {}

//=== Stage Errors ========================================================

/// Failures reported by a stage for load and unload requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// The requested scene is not known to the stage.
    UnknownScene(String),

    /// The scene exists but loading it failed.
    LoadFailed(String),

    /// The stage dropped the completion handle without settling it.
    Disconnected,
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownScene(scene) => write!(f, "unknown scene: {}", scene),
            Self::LoadFailed(reason) => write!(f, "scene load failed: {}", reason),
            Self::Disconnected => write!(f, "completion channel disconnected"),
        }
    }
}

impl std::error::Error for StageError {}

//=== Completion Tickets ==================================================

/// Result of polling a [`Ticket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketStatus {
    /// The request has not settled yet.
    Pending,

    /// The request completed successfully.
    Ready,

    /// The request failed.
    Failed(StageError),
}

/// Pollable completion handle for a load or unload request.
///
/// A ticket settles exactly once. Polling after settlement keeps
/// returning the settled status, so callers may poll every tick without
/// tracking completion themselves.
#[derive(Debug)]
pub struct Ticket {
    inner: TicketInner,
}

#[derive(Debug)]
enum TicketInner {
    Waiting(Receiver<Result<(), StageError>>),
    Settled(Result<(), StageError>),
}

impl Ticket {
    /// Creates a ticket that is already completed.
    ///
    /// Used by stages that satisfy a request synchronously.
    pub fn ready() -> Self {
        Self {
            inner: TicketInner::Settled(Ok(())),
        }
    }

    /// Creates a ticket that is already failed.
    pub fn failed(error: StageError) -> Self {
        Self {
            inner: TicketInner::Settled(Err(error)),
        }
    }

    /// Creates a pending ticket and the sender the stage settles it with.
    pub fn pending() -> (TicketSender, Self) {
        let (tx, rx) = bounded(1);
        (
            TicketSender { tx },
            Self {
                inner: TicketInner::Waiting(rx),
            },
        )
    }

    /// Polls the ticket, settling it if the stage has reported.
    ///
    /// A dropped [`TicketSender`] settles the ticket as
    /// [`StageError::Disconnected`] rather than leaving it pending
    /// forever.
    pub fn poll(&mut self) -> TicketStatus {
        if let TicketInner::Waiting(rx) = &self.inner {
            match rx.try_recv() {
                Ok(result) => self.inner = TicketInner::Settled(result),
                Err(TryRecvError::Empty) => return TicketStatus::Pending,
                Err(TryRecvError::Disconnected) => {
                    self.inner = TicketInner::Settled(Err(StageError::Disconnected))
                }
            }
        }

        match &self.inner {
            TicketInner::Settled(Ok(())) => TicketStatus::Ready,
            TicketInner::Settled(Err(error)) => TicketStatus::Failed(error.clone()),
            TicketInner::Waiting(_) => TicketStatus::Pending,
        }
    }
}

/// Stage-side handle for settling a pending [`Ticket`].
#[derive(Debug)]
pub struct TicketSender {
    tx: Sender<Result<(), StageError>>,
}

impl TicketSender {
    /// Settles the ticket as completed.
    pub fn complete(self) {
        let _ = self.tx.send(Ok(()));
    }

    /// Settles the ticket as failed.
    pub fn fail(self, error: StageError) {
        let _ = self.tx.send(Err(error));
    }
}

//=== Stage Trait =========================================================

/// The loading collaborator.
///
/// The transition sequencer drives exactly these operations: querying
/// loaded/active state, requesting additive loads and unloads, and
/// promoting a scene to active. Load and unload requests return a
/// [`Ticket`] the sequencer polls to completion.
pub trait Stage<K: SceneKey> {
    /// Returns true if the scene is currently loaded.
    fn is_loaded(&self, scene: K) -> bool;

    /// Returns the currently active scene, if any.
    fn active_scene(&self) -> Option<K>;

    /// Returns every currently loaded scene.
    fn loaded_scenes(&self) -> Vec<K>;

    /// Requests an additive load; nothing is implicitly unloaded.
    fn load_additive(&mut self, scene: K) -> Ticket;

    /// Requests an unload.
    fn unload(&mut self, scene: K) -> Ticket;

    /// Promotes a loaded scene to active.
    fn set_active(&mut self, scene: K);

    /// Advances stage-internal pending work.
    ///
    /// Called once per coordinator tick. Stages that complete requests
    /// from their own event sources can ignore this.
    fn pump(&mut self) {}
}

//=========================================================================
// Tests
//=========================================================================
