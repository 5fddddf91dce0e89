//! Fixed-timestep orchestration of a [`WaveModel`].
//!
//! One call to [`Stepper::tick`] is one discrete step:
//!
//! 1. Advance the clock by `dt`, only while [`RunState::Running`].
//! 2. Push the configured decay threshold into the model, then
//!    [`WaveModel::collect`], so storage freed by decayed particles is
//!    available to everything that allocates below.
//! 3. Serve a pending live generation request at the current time.
//! 4. While running in [`Mode::Replay`], re-issue every queued event older
//!    than the current time, at its recorded time.
//! 5. While running, find every particle that needs to split, optionally
//!    stop the clock, then split them.
//!
//! Generation always precedes the growth check of its tick, and a ring
//! born at the current time has `t - birth_time == 0`, so it never splits
//! in its birth tick.
//!
//! Input reaches the stepper as discrete [`Command`]s; nothing here reads
//! device state.

use std::collections::VecDeque;

use glam::Vec2;

use crate::{
    config::Config,
    error::Result,
    events::{EventLog, GenEvent},
    model::{ParticleSample, WaveModel},
    ring::RingLayout,
};

/// Whether the clock advances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Stopped => RunState::Running,
            RunState::Running => RunState::Stopped,
        }
    }

    pub fn is_running(self) -> bool {
        self == RunState::Running
    }
}

/// Where generation events come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Live requests are served and recorded.
    #[default]
    Live,
    /// Recorded events are re-issued; nothing is recorded.
    Replay,
}

/// Discrete input events from the outside world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Start or stop the clock.
    ToggleRunning,
    /// Spawn a ring at this world point on the next tick.
    Generate(Vec2),
    /// Drop every particle and rewind the clock to 0.
    Clear,
    /// Forget every recorded event.
    ClearEvents,
    /// Write the event log to the configured path.
    Save,
    /// Replace the event log with the configured file.
    Load,
    /// Start a replay of the event log, or abandon the current one.
    ToggleReplay,
    SetStopOnSubdivision(bool),
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Clock value after the tick.
    pub time: f32,
    /// Particles created by generation events this tick.
    pub generated: usize,
    /// Particles split this tick.
    pub subdivided: usize,
    /// Live particles after the tick.
    pub live: usize,
    /// Smallest live amplitude after the tick.
    pub min_amplitude: Option<f32>,
}

/// Drives a [`WaveModel`] one tick at a time.
#[derive(Debug)]
pub struct Stepper<M> {
    model: M,
    pub cfg: Config,
    time: f32,
    run: RunState,
    mode: Mode,
    log: EventLog,
    replay_queue: VecDeque<GenEvent>,
    pending: Option<Vec2>,
}

impl<M: WaveModel> Stepper<M> {
    pub fn new(model: M, cfg: Config) -> Self {
        Self {
            model,
            cfg,
            time: 0.0,
            run: RunState::Stopped,
            mode: Mode::Live,
            log: EventLog::new(),
            replay_queue: VecDeque::new(),
            pending: None,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Swaps the model for `model`, resetting the clock. The event log is
    /// kept.
    pub fn replace_model(&mut self, model: M) {
        self.model = model;
        self.rewind();
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    pub fn set_run_state(&mut self, run: RunState) {
        self.run = run;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Events still waiting to be replayed.
    pub fn replay_remaining(&self) -> usize {
        self.replay_queue.len()
    }

    /// Applies one input event.
    ///
    /// Only `Save` and `Load` can fail; a failed load leaves the event log
    /// untouched.
    pub fn handle(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::ToggleRunning => {
                self.run = self.run.toggled();
                log::debug!("run state: {:?}", self.run);
            }
            Command::Generate(at) => self.pending = Some(at),
            Command::Clear => {
                self.rewind();
                log::info!("reset");
            }
            Command::ClearEvents => {
                self.log.clear();
                self.leave_replay();
            }
            Command::Save => self.log.save(&self.cfg.events_path)?,
            Command::Load => {
                self.log.load(&self.cfg.events_path)?;
            }
            Command::ToggleReplay => match self.mode {
                Mode::Live => self.start_replay(),
                Mode::Replay => self.leave_replay(),
            },
            Command::SetStopOnSubdivision(on) => self.cfg.stop_on_subdivision = on,
        }
        Ok(())
    }

    /// Resets the model and starts re-issuing the recorded events.
    ///
    /// The clock is set one time unit before the first event so it fires on
    /// an early tick. Does nothing when the log is empty.
    pub fn start_replay(&mut self) {
        let queue = self.log.sorted();
        let Some(first) = queue.first() else {
            log::warn!("replay requested with an empty event log");
            return;
        };

        self.model.reset();
        self.time = first.time - 1.0;
        self.pending = None;
        self.replay_queue = queue.into();
        self.mode = Mode::Replay;
        log::info!("replaying {} events", self.replay_queue.len());
    }

    fn leave_replay(&mut self) {
        self.replay_queue.clear();
        self.mode = Mode::Live;
    }

    fn rewind(&mut self) {
        self.model.reset();
        self.time = 0.0;
        self.pending = None;
        self.leave_replay();
    }

    /// Spawns a ring right away, recording it unless replaying.
    ///
    /// ### Errors
    /// Fails when the configured radii cannot produce a ring; nothing is
    /// spawned or recorded in that case.
    pub fn generate(&mut self, time: f32, at: Vec2) -> Result<usize> {
        let ring = RingLayout::from_config(&self.cfg)?;
        let created = self.model.generate(time, at, &ring);
        if self.mode == Mode::Live {
            self.log.record(time, at);
        }
        Ok(created)
    }

    /// Advances the simulation by one fixed step of length `dt`.
    ///
    /// ### Errors
    /// Fails when a generation in this tick hits an invalid configuration.
    /// The clock has already advanced at that point; splitting is skipped
    /// for this tick. A replayed event that fails stays queued.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport> {
        let running = self.run.is_running();
        if running {
            self.time += dt;
        }

        self.model.set_decay_amplitude(self.cfg.decay_amplitude);
        self.model.collect();

        let mut generated = 0;
        if let Some(at) = self.pending.take() {
            generated += self.generate(self.time, at)?;
        }

        if running && self.mode == Mode::Replay {
            while let Some(ev) = self.replay_queue.front().copied() {
                if ev.time >= self.time {
                    break;
                }
                // Dequeue only once the ring exists, so a failed generation
                // is retried on a later tick.
                generated += self.generate(ev.time, ev.position)?;
                self.replay_queue.pop_front();
            }
            if self.replay_queue.is_empty() {
                self.mode = Mode::Live;
                log::info!("replay finished");
            }
        }

        let mut subdivided = 0;
        if running {
            let candidates = self
                .model
                .subdivision_candidates(self.time, self.cfg.particle_radius);
            if !candidates.is_empty() && self.cfg.stop_on_subdivision {
                self.run = RunState::Stopped;
                log::info!(
                    "stopped on subdivision: {} of {} particles qualify",
                    candidates.len(),
                    self.model.live_count()
                );
            }
            subdivided = self.model.subdivide(&candidates);
        }

        Ok(TickReport {
            time: self.time,
            generated,
            subdivided,
            live: self.model.live_count(),
            min_amplitude: self.model.min_amplitude(),
        })
    }

    /// Live particles at the current time, for the renderer.
    pub fn snapshot(&self) -> Vec<ParticleSample> {
        self.model.snapshot(self.time, self.cfg.particle_radius)
    }
}
