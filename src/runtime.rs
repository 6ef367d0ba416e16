//=========================================================================
// Director Runtime
//=========================================================================
//
// Fixed-TPS thread driving a Director.
//
// The host keeps a cloneable handle; the director lives on its own
// logic thread and is ticked at a fixed rate. Communication is message
// passing only:
//
//   DirectorHandle ──commands (MPSC)──> [logic thread: tick @ TPS]
//   DirectorHandle <──events (MPSC)──── [forwarded after each tick]
//
// Each tick:
//  1. Collects pending commands (blocking up to one frame for the first)
//  2. Advances the director with the current wall-clock instant
//  3. Forwards batched transition events to the handle
//  4. Sleeps to maintain fixed pacing
//  5. Exits cleanly on Shutdown or when every handle is dropped
//
//=========================================================================

//=== External Dependencies ===============================================

use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use log::info;

//=== Internal Dependencies ===============================================

use crate::core::events::TransitionEvent;
use crate::core::stage::{SceneKey, Stage};
use crate::Director;

//=== Constants ===========================================================

/// Capacity of the command channel. Commands are tiny; this only bounds
/// how far a burst of requests can run ahead of the logic thread.
const COMMAND_CAPACITY: usize = 128;

//=== TickControl =========================================================
//
// Control flow for the logic loop. Each command-collection pass signals
// either to continue ticking or to terminate the loop.
//
enum TickControl {
    Continue,
    Exit,
}

//=== Commands ============================================================

/// Commands a [`DirectorHandle`] sends to the logic thread.
#[derive(Debug, Clone)]
pub enum DirectorCommand<K: SceneKey> {
    /// Request a transition to the target scene.
    Next(K),

    /// Terminate the logic thread after the current tick.
    Shutdown,
}

//=== DirectorHandle ======================================================

/// Cloneable handle to a director running on its own thread.
///
/// Requests are fire-and-forget; transition lifecycle events stream
/// back on the event channel in emission order.
pub struct DirectorHandle<K: SceneKey> {
    commands: Sender<DirectorCommand<K>>,
    events: Receiver<TransitionEvent<K>>,
}

impl<K: SceneKey> DirectorHandle<K> {
    /// Requests a transition to `target`.
    ///
    /// Silently dropped if the logic thread has already exited.
    pub fn next(&self, target: K) {
        let _ = self.commands.send(DirectorCommand::Next(target));
    }

    /// Asks the logic thread to terminate.
    pub fn shutdown(&self) {
        let _ = self.commands.send(DirectorCommand::Shutdown);
    }

    /// The stream of transition lifecycle events.
    pub fn events(&self) -> &Receiver<TransitionEvent<K>> {
        &self.events
    }
}

impl<K: SceneKey> Clone for DirectorHandle<K> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            events: self.events.clone(),
        }
    }
}

//=== Spawn ===============================================================

/// Spawns a logic thread ticking `director` at `tps`.
///
/// The thread runs until [`DirectorHandle::shutdown`] is called or
/// every handle is dropped.
///
/// # Panics
///
/// Panics if `tps <= 0.0`.
///
/// # Examples
///
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
/// let director = DirectorBuilder::new()
///     .with_fade_duration(std::time::Duration::from_millis(10))
///     .build(stage)
///     .expect("stage has an active scene");
///
/// let (handle, thread) = spawn_director(director, 240.0);
/// handle.next(GameScene::Level1);
/// handle.shutdown();
/// thread.join().expect("logic thread panicked");
/// ```
pub fn spawn_director<K, S>(
    mut director: Director<K, S>,
    tps: f64,
) -> (DirectorHandle<K>, thread::JoinHandle<()>)
where
    K: SceneKey,
    S: Stage<K> + Send + 'static,
{
    assert!(tps > 0.0, "TPS must be positive, got {}", tps);

    let frame_duration = Duration::from_secs_f64(1.0 / tps);
    let (command_tx, command_rx) = bounded(COMMAND_CAPACITY);
    let (event_tx, event_rx) = unbounded();

    let thread = thread::spawn(move || {
        info!("Director thread running (TPS: {})", tps);
        director.start(Instant::now());

        loop {
            let frame_start = Instant::now();

            //--- Step 1: Collect commands -----------------------------
            if let TickControl::Exit =
                collect_commands(&command_rx, &mut director, frame_duration)
            {
                info!("Director thread exiting");
                break;
            }

            //--- Step 2: Advance the coordinator ----------------------
            director.tick(Instant::now());

            //--- Step 3: Forward events -------------------------------
            for event in director.drain_events() {
                // A dropped event receiver is not an error; requests
                // can legitimately outlive interest in the outcome
                let _ = event_tx.send(event);
            }

            //--- Step 4: Maintain deterministic pacing ----------------
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                thread::sleep(frame_duration - elapsed);
            }
        }
    });

    (
        DirectorHandle {
            commands: command_tx,
            events: event_rx,
        },
        thread,
    )
}

//--- collect_commands() --------------------------------------------------
//
// Aggregates all commands received during this frame. Blocks up to one
// frame waiting for the first command so an idle director does not
// spin. Returns a TickControl indicating whether to continue or exit.
//
fn collect_commands<K: SceneKey, S: Stage<K>>(
    receiver: &Receiver<DirectorCommand<K>>,
    director: &mut Director<K, S>,
    frame_duration: Duration,
) -> TickControl {
    // Wait for at most one frame for the first command
    match receiver.recv_timeout(frame_duration) {
        Ok(DirectorCommand::Next(target)) => director.next(target),
        Ok(DirectorCommand::Shutdown) => return TickControl::Exit,
        Err(RecvTimeoutError::Disconnected) => return TickControl::Exit,
        Err(RecvTimeoutError::Timeout) => {}
    }

    // Drain any further commands queued during this frame
    while let Ok(command) = receiver.try_recv() {
        match command {
            DirectorCommand::Next(target) => director.next(target),
            DirectorCommand::Shutdown => return TickControl::Exit,
        }
    }

    TickControl::Continue
}

//=========================================================================
// Tests
//=========================================================================
