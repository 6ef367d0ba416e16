//=========================================================================
// Residency
//=========================================================================
//
// First-one-wins persistence claims.
//
// A persistent object placed in several scenes' content gets duplicated
// every time one of those scenes reloads. Claiming a named slot in a
// shared Residency decides which copy survives: the first claimant gets
// a marker, every later claimant is refused and discards itself. The
// marker releases the slot on drop.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use log::{debug, warn};

//=== Residency Registry ==================================================

/// Shared registry of live persistent residents, keyed by name.
///
/// Internally locked, so claims may arrive from any thread. Hosts
/// typically create one registry for the process and hand clones of the
/// `Arc` to whatever spawns persistent objects.
pub struct Residency {
    live: Mutex<HashSet<String>>,
}

impl Residency {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Claims a named slot.
    ///
    /// The first claim for a name returns a [`PersistenceMarker`] that
    /// holds the slot until dropped. Any claim while the slot is held
    /// returns `None`; the caller is expected to discard the duplicate
    /// instance it was about to keep alive.
    pub fn claim(self: &Arc<Self>, name: impl Into<String>) -> Option<PersistenceMarker> {
        let name = name.into();
        let mut live = self.live.lock().expect("residency registry poisoned");

        if live.insert(name.clone()) {
            debug!("Residency slot '{}' claimed", name);
            Some(PersistenceMarker {
                registry: Arc::clone(self),
                name,
            })
        } else {
            warn!("Residency slot '{}' already live, refusing duplicate", name);
            None
        }
    }

    /// Returns true if a resident currently holds the named slot.
    pub fn is_live(&self, name: &str) -> bool {
        self.live
            .lock()
            .expect("residency registry poisoned")
            .contains(name)
    }

    fn release(&self, name: &str) {
        let mut live = self.live.lock().expect("residency registry poisoned");
        live.remove(name);
        debug!("Residency slot '{}' released", name);
    }
}

impl Default for Residency {
    fn default() -> Self {
        Self::new()
    }
}

//=== Persistence Marker ==================================================

/// Guard held by the surviving copy of a persistent object.
///
/// Carries no behavior of its own; its existence is the claim. Dropping
/// it releases the slot so a later instance can become the resident.
pub struct PersistenceMarker {
    registry: Arc<Residency>,
    name: String,
}

impl PersistenceMarker {
    /// The claimed slot name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for PersistenceMarker {
    fn drop(&mut self) {
        self.registry.release(&self.name);
    }
}

impl std::fmt::Debug for PersistenceMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceMarker")
            .field("name", &self.name)
            .finish()
    }
}

//=========================================================================
// Tests
//=========================================================================
