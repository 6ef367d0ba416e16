//=========================================================================
// Fader
//=========================================================================
//
// Timed interpolation of the overlay level.
//
// Level 0 is fully clear, 1 is fully occluded. Each retarget starts a
// linear segment from the current level to the target across the full
// configured duration, measured on unscaled wall-clock instants so
// host-side time scaling never stretches a fade. Completion clamps
// exactly to the target, leaving no floating-point residual.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::time::{Duration, Instant};

//=== Fade Segment ========================================================

#[derive(Debug, Clone, Copy)]
struct Segment {
    from: f32,
    to: f32,
    started: Instant,
}

//=== Fader ===============================================================

/// Retargetable linear fade of the overlay level.
///
/// Driven by [`Fader::tick`] once per scheduling tick. Idle until the
/// first [`Fader::retarget`].
#[derive(Debug)]
pub struct Fader {
    duration: Duration,
    level: f32,
    segment: Option<Segment>,
}

impl Fader {
    /// Creates a fader at level 0 (clear) with the given segment duration.
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            level: 0.0,
            segment: None,
        }
    }

    /// Current overlay level in `[0, 1]`.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Returns true when no segment is in flight.
    pub fn is_idle(&self) -> bool {
        self.segment.is_none()
    }

    /// Starts a new segment from the current level to `target`.
    ///
    /// The segment always runs the full configured duration, even when
    /// the level is already at the target. Targets outside `[0, 1]` are
    /// clamped.
    pub fn retarget(&mut self, target: f32, now: Instant) {
        self.segment = Some(Segment {
            from: self.level,
            to: target.clamp(0.0, 1.0),
            started: now,
        });
    }

    /// Advances the in-flight segment.
    ///
    /// Returns true once the fader has settled at the segment target
    /// (and on every tick thereafter until the next retarget).
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(segment) = self.segment else {
            return true;
        };

        let elapsed = now.saturating_duration_since(segment.started);
        let t = if self.duration.is_zero() {
            1.0
        } else {
            elapsed.as_secs_f32() / self.duration.as_secs_f32()
        };

        if t >= 1.0 {
            // Clamp to the exact target so no residual drift survives
            self.level = segment.to;
            self.segment = None;
            true
        } else {
            self.level = segment.from + (segment.to - segment.from) * t;
            false
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
