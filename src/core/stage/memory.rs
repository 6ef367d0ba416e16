//=========================================================================
// Memory Stage
//=========================================================================
//
// In-memory Stage implementation.
//
// Tracks loaded/active state in plain collections and completes load
// and unload requests after a configurable number of pump calls. Used
// by the crate's own tests and by headless hosts that have no real
// content to stream.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;

use log::{debug, warn};

//=== Internal Dependencies ===============================================

use super::{SceneKey, Stage, StageError, Ticket, TicketSender};

//=== Pending Operations ==================================================

enum OpKind {
    Load,
    Unload,
}

struct PendingOp<K: SceneKey> {
    scene: K,
    kind: OpKind,
    remaining: u32,
    sender: TicketSender,
}

//=== Memory Stage ========================================================

/// In-memory scene stage with configurable completion latency.
///
/// Scenes must be registered before they can be loaded; loading an
/// unregistered scene fails the returned ticket with
/// [`StageError::UnknownScene`]. With zero latency (the default),
/// requests complete synchronously; otherwise they settle after the
/// configured number of [`Stage::pump`] calls.
pub struct MemoryStage<K: SceneKey> {
    known: HashSet<K>,
    loaded: HashSet<K>,
    active: Option<K>,
    load_latency: u32,
    unload_latency: u32,
    pending: Vec<PendingOp<K>>,
    load_requests: u32,
}

impl<K: SceneKey> MemoryStage<K> {
    //--- Construction -----------------------------------------------------

    /// Creates an empty stage with zero completion latency.
    pub fn new() -> Self {
        Self {
            known: HashSet::new(),
            loaded: HashSet::new(),
            active: None,
            load_latency: 0,
            unload_latency: 0,
            pending: Vec::new(),
            load_requests: 0,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a scene as known (loadable) without loading it.
    pub fn register(&mut self, scene: K) {
        self.known.insert(scene);
    }

    /// Registers a scene and marks it loaded.
    pub fn register_loaded(&mut self, scene: K) {
        self.known.insert(scene);
        self.loaded.insert(scene);
    }

    /// Registers a scene, marks it loaded, and makes it active.
    pub fn register_active(&mut self, scene: K) {
        self.register_loaded(scene);
        self.active = Some(scene);
    }

    //--- Configuration ----------------------------------------------------

    /// Sets how many pump calls a load request takes to complete.
    pub fn set_load_latency(&mut self, ticks: u32) {
        self.load_latency = ticks;
    }

    /// Sets how many pump calls an unload request takes to complete.
    pub fn set_unload_latency(&mut self, ticks: u32) {
        self.unload_latency = ticks;
    }

    //--- Introspection ----------------------------------------------------

    /// Returns the number of requests still settling.
    pub fn pending_ops(&self) -> usize {
        self.pending.len()
    }

    /// Returns the number of load requests received so far.
    pub fn load_requests(&self) -> u32 {
        self.load_requests
    }

    //--- Internal Helpers -------------------------------------------------

    fn apply(&mut self, scene: K, kind: &OpKind) {
        match kind {
            OpKind::Load => {
                self.loaded.insert(scene);
            }
            OpKind::Unload => {
                self.loaded.remove(&scene);
            }
        }
    }
}

impl<K: SceneKey> Default for MemoryStage<K> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Stage Implementation ================================================

impl<K: SceneKey> Stage<K> for MemoryStage<K> {
    fn is_loaded(&self, scene: K) -> bool {
        self.loaded.contains(&scene)
    }

    fn active_scene(&self) -> Option<K> {
        self.active
    }

    fn loaded_scenes(&self) -> Vec<K> {
        self.loaded.iter().copied().collect()
    }

    fn load_additive(&mut self, scene: K) -> Ticket {
        self.load_requests += 1;

        if !self.known.contains(&scene) {
            warn!("Load requested for unregistered scene {:?}", scene);
            return Ticket::failed(StageError::UnknownScene(format!("{:?}", scene)));
        }

        if self.loaded.contains(&scene) {
            debug!("Scene {:?} already loaded, completing immediately", scene);
            return Ticket::ready();
        }

        if self.load_latency == 0 {
            self.loaded.insert(scene);
            return Ticket::ready();
        }

        debug!(
            "Queueing load of {:?} ({} ticks to settle)",
            scene, self.load_latency
        );
        let (sender, ticket) = Ticket::pending();
        self.pending.push(PendingOp {
            scene,
            kind: OpKind::Load,
            remaining: self.load_latency,
            sender,
        });
        ticket
    }

    fn unload(&mut self, scene: K) -> Ticket {
        if !self.loaded.contains(&scene) {
            debug!("Unload requested for {:?}, which is not loaded", scene);
            return Ticket::ready();
        }

        if self.unload_latency == 0 {
            self.loaded.remove(&scene);
            return Ticket::ready();
        }

        let (sender, ticket) = Ticket::pending();
        self.pending.push(PendingOp {
            scene,
            kind: OpKind::Unload,
            remaining: self.unload_latency,
            sender,
        });
        ticket
    }

    fn set_active(&mut self, scene: K) {
        if self.loaded.contains(&scene) {
            debug!("Scene {:?} is now active", scene);
            self.active = Some(scene);
        } else {
            warn!("Cannot activate {:?}: not loaded", scene);
        }
    }

    fn pump(&mut self) {
        let ops = std::mem::take(&mut self.pending);

        for mut op in ops {
            op.remaining -= 1;
            if op.remaining == 0 {
                self.apply(op.scene, &op.kind);
                op.sender.complete();
            } else {
                self.pending.push(op);
            }
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
