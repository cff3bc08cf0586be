//! The playback sequencer - temporal position along a route.
//!
//! Owns "which waypoint", "how far along the next segment" and "dwelling or
//! traveling", and moves them forward once per frame. It knows nothing about
//! cameras or rendering: a host calls [`PlaybackSequencer::advance`] from its
//! render loop (or [`PlaybackSequencer::step`] directly in tests) and reads
//! the interpolated position back out.
//!
//! # State machine
//!
//! ```text
//!            play()                    dwell expires, more stops
//!   Idle ───────────────► Dwelling ─────────────────────────────► Traveling
//!    ▲                     │   ▲                                     │
//!    │ dwell expires       │   │          progress reaches 1.0       │
//!    └──── at last stop ───┘   └─────────── (index + 1) ─────────────┘
//!
//!   stop()      : any ──► Idle(index 0)
//!   pause()     : any ──► same phase, suspended (playing = false)
//!   next()/prev(): any ──► Dwelling(index ± 1), no interpolation
//! ```

use std::sync::Arc;

use crate::config::PlaybackConfig;
use crate::route::{Route, SegmentSample};

/// Upper bound on fixed steps run by a single `advance` call.
///
/// A host that stalls (minimised window, debugger) would otherwise replay
/// the whole gap at once; the excess time is dropped instead.
pub const MAX_STEPS_PER_ADVANCE: u32 = 120;

/// Phase of the playback state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// Not started, or finished / stopped
    #[default]
    Idle,
    /// Paused at the current waypoint ("paused at stop")
    Dwelling,
    /// Moving along the segment leaving the current waypoint
    Traveling,
}

/// Ephemeral playback state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    /// Current waypoint, always `< waypoint count`
    pub index: usize,
    /// Progress along the segment leaving `index`, in `[0, 1)`
    pub progress: f64,
    pub phase: PlaybackPhase,
    /// Frames spent in the current dwell
    pub dwell_timer: u32,
    pub playing: bool,
}

impl PlaybackState {
    pub fn is_paused_at_stop(&self) -> bool {
        self.phase == PlaybackPhase::Dwelling
    }

    pub fn is_traveling(&self) -> bool {
        self.phase == PlaybackPhase::Traveling
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            playing: self.playing,
            dwelling: self.is_paused_at_stop(),
            index: self.index,
        }
    }
}

/// The `(playing, dwelling, index)` tuple observers are notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlaybackSnapshot {
    pub playing: bool,
    pub dwelling: bool,
    pub index: usize,
}

/// Interpolated position produced by a traveling frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelSample {
    /// Index of the segment (= departure waypoint)
    pub segment: usize,
    pub progress: f64,
    pub sample: SegmentSample,
}

/// Transport commands issued by a controls surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCommand {
    Play,
    Pause,
    Stop,
    Next,
    Prev,
}

/// Command interface for playback controls.
pub trait Transport {
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn next(&mut self);
    fn prev(&mut self);

    /// Dispatches a queued command.
    fn apply(&mut self, command: TransportCommand) {
        match command {
            TransportCommand::Play => self.play(),
            TransportCommand::Pause => self.pause(),
            TransportCommand::Stop => self.stop(),
            TransportCommand::Next => self.next(),
            TransportCommand::Prev => self.prev(),
        }
    }
}

/// Drives playback over a [`Route`].
#[derive(Debug, Clone)]
pub struct PlaybackSequencer {
    route: Arc<Route>,
    progress_per_frame: f64,
    dwell_frames: u32,
    frame_dt: f64,
    state: PlaybackState,
    /// Unconsumed time for the fixed-step loop, in seconds
    accumulator: f64,
    frame_count: u64,
}

impl PlaybackSequencer {
    /// Creates a stopped sequencer at waypoint 0.
    pub fn new(route: Arc<Route>, config: &PlaybackConfig) -> Self {
        Self {
            route,
            progress_per_frame: config.progress_per_frame,
            dwell_frames: config.dwell_frames,
            frame_dt: config.frame_dt(),
            state: PlaybackState::default(),
            accumulator: 0.0,
            frame_count: 0,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.state.snapshot()
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    pub fn waypoint_count(&self) -> usize {
        self.route.len()
    }

    /// Total fixed steps executed so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn last_index(&self) -> usize {
        self.route.last_index()
    }

    fn enter_dwell(&mut self) {
        self.state.phase = PlaybackPhase::Dwelling;
        self.state.dwell_timer = 0;
    }

    fn arrive(&mut self) {
        self.state.index = (self.state.index + 1).min(self.last_index());
        self.state.progress = 0.0;
        self.enter_dwell();
    }

    fn finish(&mut self) {
        self.state.playing = false;
        self.state.index = 0;
        self.state.progress = 0.0;
        self.state.phase = PlaybackPhase::Idle;
        self.state.dwell_timer = 0;
    }

    /// Host entry point: feeds `dt` seconds into a fixed-step loop and runs
    /// one [`step`](Self::step) per whole frame.
    ///
    /// Returns the sample of the final step if it was a traveling frame.
    pub fn advance(&mut self, dt: f64) -> Option<TravelSample> {
        if dt.is_finite() && dt > 0.0 {
            self.accumulator += dt;
        }

        let mut last = None;
        let mut steps = 0;
        // Tolerance absorbs float drift from summing 1/60 repeatedly
        while self.accumulator + 1e-9 >= self.frame_dt {
            if steps == MAX_STEPS_PER_ADVANCE {
                self.accumulator = 0.0;
                break;
            }
            self.accumulator -= self.frame_dt;
            last = self.step();
            steps += 1;
        }
        self.accumulator = self.accumulator.max(0.0);
        last
    }

    /// The per-frame advance.
    ///
    /// Routes with fewer than two waypoints never animate: a playing
    /// single-stop route stays in its dwell indefinitely.
    pub fn step(&mut self) -> Option<TravelSample> {
        self.frame_count += 1;

        if !self.state.playing || self.route.len() < 2 {
            return None;
        }

        match self.state.phase {
            PlaybackPhase::Idle => None,
            PlaybackPhase::Dwelling => {
                self.state.dwell_timer += 1;
                if self.state.dwell_timer >= self.dwell_frames {
                    self.state.dwell_timer = 0;
                    if self.state.index >= self.last_index() {
                        self.finish();
                    } else {
                        self.state.phase = PlaybackPhase::Traveling;
                    }
                }
                None
            }
            PlaybackPhase::Traveling => {
                let index = self.state.index;
                let Some(segment) = self.route.segment(index) else {
                    self.finish();
                    return None;
                };

                if segment.is_degenerate() {
                    self.arrive();
                    return None;
                }

                let next = self.state.progress + self.progress_per_frame;
                if next >= 1.0 {
                    self.arrive();
                    None
                } else {
                    self.state.progress = next;
                    Some(TravelSample {
                        segment: index,
                        progress: next,
                        sample: segment.sample(next),
                    })
                }
            }
        }
    }
}

impl Transport for PlaybackSequencer {
    /// Starts (or resumes) playback, always by dwelling at the current
    /// waypoint first. At the final waypoint the tour restarts from 0.
    fn play(&mut self) {
        if self.state.index == self.last_index() {
            self.state.index = 0;
            self.state.progress = 0.0;
        }
        self.state.playing = true;
        self.enter_dwell();
    }

    fn pause(&mut self) {
        self.state.playing = false;
    }

    fn stop(&mut self) {
        self.finish();
    }

    fn next(&mut self) {
        if self.state.index < self.last_index() {
            self.state.index += 1;
            self.state.progress = 0.0;
            self.enter_dwell();
        }
    }

    fn prev(&mut self) {
        if self.state.index > 0 {
            self.state.index -= 1;
            self.state.progress = 0.0;
            self.enter_dwell();
        }
    }
}
