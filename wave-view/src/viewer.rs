//! Interactive wave-particle viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Stepper`] over either
//! particle storage and implements [`eframe::App`]. It is the outside world
//! for the simulation core: it turns clicks and key presses into
//! [`Command`]s, runs the fixed-timestep clock, and draws the render
//! snapshot. It never mutates particles directly.

use eframe::App;
use glam::Vec2;
use wave_core::{
    config::{Config, DEFAULT_FIXED_DT},
    error::SimError,
    model::WaveModel,
    pool::ParticlePool,
    stepper::{Command, Mode, RunState, Stepper, TickReport},
    store::ParticleStore,
};

/// Most fixed steps run in a single frame; a longer stall drops time
/// instead of catching up.
const MAX_TICKS_PER_FRAME: u32 = 8;

/// Which particle storage the stepper drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Unbounded, append-only list.
    Store,
    /// Fixed-capacity slot pool.
    Pool,
}

impl Backend {
    fn build(self, cfg: &Config) -> Result<Box<dyn WaveModel>, SimError> {
        let model: Box<dyn WaveModel> = match self {
            Backend::Store => Box::new(ParticleStore::new()),
            Backend::Pool => Box::new(ParticlePool::from_config(cfg)?),
        };
        Ok(model)
    }
}

/// Main application state for the interactive viewer.
///
/// ### Fields
/// - `sim` - Stepper owning the particle model, clock and event log.
/// - `backend` - Storage currently plugged into `sim`.
/// - `zoom` - Pixels per world unit.
/// - `pan` - Screen-space pan offset in pixels.
/// - `accumulator` - Frame time not yet consumed by fixed steps.
/// - `last_report` - Result of the most recent tick, for the status bar.
/// - `last_error` - Most recent failure, shown until the next success.
pub struct Viewer {
    sim: Stepper<Box<dyn WaveModel>>,
    backend: Backend,

    zoom: f32,
    pan: egui::Vec2,

    accumulator: f32,
    last_report: TickReport,
    last_error: Option<String>,
}

impl Viewer {
    /// Creates a viewer with the default configuration and the pool backend.
    pub fn new() -> Self {
        let cfg = Config::default();
        let model: Box<dyn WaveModel> = Box::new(ParticlePool::new(
            cfg.pool_capacity,
            cfg.decay_amplitude,
        ));

        Self {
            sim: Stepper::new(model, cfg),
            backend: Backend::Pool,
            zoom: 12.0,
            pan: egui::vec2(0.0, 0.0),
            accumulator: 0.0,
            last_report: TickReport::default(),
            last_error: None,
        }
    }

    /// Forwards one input event to the stepper, remembering any failure.
    fn apply(&mut self, cmd: Command) {
        match self.sim.handle(cmd) {
            Ok(()) => self.last_error = None,
            Err(e) => self.report_error(e),
        }
    }

    fn report_error(&mut self, e: SimError) {
        log::error!("{e}");
        self.last_error = Some(e.to_string());
    }

    /// Advances the simulation by one fixed step.
    fn step_once(&mut self) {
        match self.sim.tick(DEFAULT_FIXED_DT) {
            Ok(report) => {
                if report.subdivided > 0 {
                    log::debug!(
                        "t={:.3}: {} splits, {} live, min amplitude {:?}",
                        report.time,
                        report.subdivided,
                        report.live,
                        report.min_amplitude
                    );
                }
                self.last_report = report;
            }
            Err(e) => self.report_error(e),
        }
    }

    /// Consumes `frame_dt` seconds of wall time in fixed steps.
    ///
    /// Returns how many steps ran.
    fn advance_clock(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt;
        let mut ticks = 0;
        while self.accumulator >= DEFAULT_FIXED_DT && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= DEFAULT_FIXED_DT;
            self.step_once();
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_FRAME {
            self.accumulator = 0.0;
        }
        ticks
    }

    /// Plugs a fresh model of the given kind into the stepper.
    ///
    /// The clock and particles are reset; the event log is kept so a
    /// recording can be replayed against the other storage.
    fn set_backend(&mut self, backend: Backend) {
        match backend.build(&self.sim.cfg) {
            Ok(model) => {
                self.sim.replace_model(model);
                self.backend = backend;
                self.last_error = None;
                log::info!("switched to {:?} backend", backend);
            }
            Err(e) => self.report_error(e),
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// World coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to world-space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, event log, backend).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let running = self.sim.run_state().is_running();
                if ui.button(if running { "⏸ Pause" } else { "▶ Run" }).clicked() {
                    self.apply(Command::ToggleRunning);
                }

                if ui.button("Step").clicked() {
                    // A single manual step always moves the clock.
                    let was = self.sim.run_state();
                    self.sim.set_run_state(RunState::Running);
                    self.step_once();
                    if self.sim.run_state().is_running() {
                        self.sim.set_run_state(was);
                    }
                }

                if ui.button("Clear").clicked() {
                    self.apply(Command::Clear);
                }

                let mut stop = self.sim.cfg.stop_on_subdivision;
                if ui.checkbox(&mut stop, "Stop on subdiv").changed() {
                    self.apply(Command::SetStopOnSubdivision(stop));
                }

                ui.separator();
                if ui.button("Save").clicked() {
                    self.apply(Command::Save);
                }
                if ui.button("Load").clicked() {
                    self.apply(Command::Load);
                }
                if !self.sim.events().is_empty() {
                    let replaying = self.sim.mode() == Mode::Replay;
                    if ui
                        .button(if replaying { "Replaying" } else { "Replay" })
                        .clicked()
                    {
                        self.apply(Command::ToggleReplay);
                    }
                }
                if ui.button("Clear events").clicked() {
                    self.apply(Command::ClearEvents);
                }

                ui.separator();
                let mut backend = self.backend;
                ui.selectable_value(&mut backend, Backend::Pool, "Pool");
                ui.selectable_value(&mut backend, Backend::Store, "Unbounded");
                if backend != self.backend {
                    self.set_backend(backend);
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 1.0..=100.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("t = {:.2}", self.sim.time()));
                ui.label(format!("{:?} / {:?}", self.sim.run_state(), self.sim.mode()));
                ui.separator();
                let model = self.sim.model();
                ui.label(format!("particles = {}", model.live_count()));
                if let (Some(free), Some(cap)) = (model.free_count(), model.capacity()) {
                    ui.label(format!("free = {free}/{cap}"));
                }
                if let Some(a) = self.last_report.min_amplitude {
                    ui.label(format!("min amp = {a:.4}"));
                }
                ui.separator();
                ui.label(format!("ev = {}", self.sim.events().len()));
                if self.sim.mode() == Mode::Replay {
                    ui.label(format!("queued = {}", self.sim.replay_remaining()));
                }
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err.as_str());
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Radii");
                let cfg = &mut self.sim.cfg;
                Self::labeled_drag_f32(
                    ui,
                    "particle_radius:",
                    &mut cfg.particle_radius,
                    0.01..=50.0,
                    0.01,
                );
                Self::labeled_drag_f32(
                    ui,
                    "wave_radius:",
                    &mut cfg.wave_radius,
                    0.01..=100.0,
                    0.05,
                );

                ui.separator();
                ui.label("Plane");
                Self::labeled_drag_f32(ui, "width:", &mut cfg.plane_size.x, 1.0..=1000.0, 1.0);
                Self::labeled_drag_f32(ui, "height:", &mut cfg.plane_size.y, 1.0..=1000.0, 1.0);

                ui.separator();
                ui.label("Pool");
                ui.horizontal(|ui| {
                    ui.label("capacity (on rebuild):");
                    ui.add(
                        egui::DragValue::new(&mut cfg.pool_capacity)
                            .range(1..=1 << 20)
                            .speed(16.0),
                    );
                });
                Self::labeled_drag_f32(
                    ui,
                    "decay_amplitude:",
                    &mut cfg.decay_amplitude,
                    0.0..=1.0,
                    1e-4,
                );

                if let Err(e) = cfg.validate() {
                    ui.colored_label(egui::Color32::LIGHT_RED, e.to_string());
                }

                ui.separator();
                if ui.button("Rebuild model").clicked() {
                    self.set_backend(self.backend);
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.sim.cfg = Config::default();
                }
            });
    }

    /// Builds the central panel where the plane and particles are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Releasing a click spawns a wave there.
            if response.clicked()
                && let Some(p) = response.interact_pointer_pos()
            {
                let at = self.screen_to_world(p, rect);
                self.apply(Command::Generate(at));
            }

            if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
                self.apply(Command::ToggleRunning);
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(1.0, 100.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Plane bounds.
            let half = self.sim.cfg.plane_size * 0.5;
            let corners = [
                Vec2::new(-half.x, -half.y),
                Vec2::new(half.x, -half.y),
                Vec2::new(half.x, half.y),
                Vec2::new(-half.x, half.y),
            ];
            let outline: Vec<egui::Pos2> = corners
                .iter()
                .map(|&c| self.world_to_screen(c, rect))
                .collect();
            painter.add(egui::Shape::closed_line(
                outline,
                egui::Stroke::new(1.0, egui::Color32::GREEN),
            ));

            // Particles, brighter for higher amplitude.
            for s in self.sim.snapshot() {
                let p = self.world_to_screen(s.position, rect);
                let r = (s.radius * self.zoom).max(1.5);
                let alpha = (s.amplitude.clamp(0.0, 1.0).sqrt() * 255.0) as u8;
                painter.circle_filled(
                    p,
                    r,
                    egui::Color32::from_rgba_unmultiplied(90, 170, 255, alpha.max(24)),
                );
            }

            let frame_dt = ctx.input(|i| i.stable_dt);
            self.advance_clock(frame_dt);
            ctx.request_repaint();
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
