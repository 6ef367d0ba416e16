//=========================================================================
// Stagehand — Library Root
//
// This crate defines the public API surface of Stagehand, a
// deterministic scene-transition coordinator.
//
// Responsibilities:
// - Expose the coordinator interface (`Director`, `DirectorBuilder`)
// - Keep the transition machinery (`core`) available for hosts that
//   need to drive it directly or plug in their own stage backend
// - Provide an optional threaded runtime (`runtime`) for hosts without
//   their own scheduling loop
//
// Typical usage:
// ```no_run
// use stagehand::prelude::*;
//
// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
// enum GameScene { Master, Level1 }
// impl SceneKey for GameScene {}
//
// fn main() {
//     let mut stage = MemoryStage::new();
//     stage.register_active(GameScene::Master);
//     stage.register(GameScene::Level1);
//
//     let director = DirectorBuilder::new()
//         .build(stage)
//         .expect("stage has an active scene");
//
//     let (handle, thread) = spawn_director(director, 60.0);
//     handle.next(GameScene::Level1);
//     // ...
//     handle.shutdown();
//     thread.join().expect("logic thread panicked");
// }
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the coordination systems (stage seam, transition
// state machine, event journal). It is exposed publicly for
// extensibility, but normal application code will mostly use the
// top-level `Director` facade.
//
// `runtime` provides the fixed-TPS logic thread and its handle.
//
pub mod core;
pub mod prelude;
pub mod runtime;

//--- Internal Modules ----------------------------------------------------
//
// `director` defines the coordinator facade and its builder.
//
mod director;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the coordinator types as the main entry points, so users
// can simply `use stagehand::Director;` without having to know the
// internal module structure.
//
pub use director::{Director, DirectorBuilder, DirectorError};
