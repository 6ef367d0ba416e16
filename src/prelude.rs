//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use stagehand::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Coordinator facade
pub use crate::director::{Director, DirectorBuilder, DirectorError};

// Stage seam
pub use crate::core::stage::{
    MemoryStage, PersistenceMarker, Residency, SceneKey, Stage, StageError, Ticket,
    TicketSender, TicketStatus,
};

// Transition machinery
pub use crate::core::transition::{Fader, Sequencer, TransitionQueue};

// Events
pub use crate::core::events::{EventLog, TransitionEvent};

// Threaded runtime
pub use crate::runtime::{spawn_director, DirectorCommand, DirectorHandle};
