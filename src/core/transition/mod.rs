//=========================================================================
// Transition System
//=========================================================================
//
// Fade sequencing and the single-flight transition state machine.
//
// Architecture:
//   Sequencer
//     ├─ fader: Fader                  (overlay level interpolation)
//     ├─ queue: TransitionQueue<K>     (pending targets, FIFO)
//     ├─ current: in-flight transition (explicit phases)
//     └─ pending_unloads: Vec<Ticket>  (tracked until drained)
//
// Flow:
//   request() → queue → tick() → FadingOut → Loading → FadingIn → idle
//
//=========================================================================

//=== Module Declarations =================================================

mod fade;
mod queue;
mod sequencer;

//=== Public API ==========================================================

pub use fade::Fader;
pub use queue::TransitionQueue;
pub use sequencer::Sequencer;
