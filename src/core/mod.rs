//=========================================================================
// Core Systems
//=========================================================================
//
// Internal coordination systems behind the Director facade.
//
// - `stage`: the loading collaborator seam (trait, tickets, residency)
// - `transition`: fade sequencing and the transition state machine
// - `events`: batched transition lifecycle journal
//
// Exposed publicly for hosts that want to drive a `Sequencer` directly
// or provide their own `Stage` backend; typical applications use the
// top-level `Director` instead.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod events;
pub mod stage;
pub mod transition;
