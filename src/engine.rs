//! Pointer physics and particle state.
//!
//! `Engine` is the single owner of every transient entity: pointer, blob,
//! puddle, trail, afterglow, scatter and sparkles. It is advanced by
//! [`Engine::tick`] and read by the field renderer through [`Snapshot`].
//!
//! Time is measured in `dt_norm` units of 100 ms; every rate parameter is "per
//! 100 ms". Ticks longer than [`MAX_TICK`] are clamped so a stalled host does
//! not launch the pointer across the grid.

use crate::math::{approach, as_count, ease_out_quad, Vec2};
use crate::params::ParameterSet;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::time::Duration;

pub const MAX_TICK: Duration = Duration::from_millis(50);
const RATE_UNIT_MS: f32 = 100.0;
const SPARKLE_SPAWN_MS: f32 = 100.0;
const SPARKLE_DECAY_MS: f32 = 60.0;
const SCATTER_MARGIN: f32 = 2.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridSize {
    pub width: usize,
    pub height: usize,
}

impl GridSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn diagonal(&self) -> f32 {
        let (w, h) = (self.width as f32, self.height as f32);
        (w * w + h * h).sqrt()
    }

    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Clamps a point into `[0, w-1] x [0, h-1]`.
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        let max_x = self.width.saturating_sub(1) as f32;
        let max_y = self.height.saturating_sub(1) as f32;
        Vec2::new(p.x.clamp(0.0, max_x), p.y.clamp(0.0, max_y))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerPhase {
    Idle,
    Tracking,
    Drifting,
    Fading,
}

#[derive(Clone, Copy, Debug)]
pub struct PointerState {
    pub phase: PointerPhase,
    /// `None` while the pointer is off-grid.
    pub position: Option<Vec2>,
    pub target: Option<Vec2>,
    /// Cells per 100 ms.
    pub velocity: Vec2,
    pub pressing: bool,
}

impl PointerState {
    fn idle() -> Self {
        Self {
            phase: PointerPhase::Idle,
            position: None,
            target: None,
            velocity: Vec2::ZERO,
            pressing: false,
        }
    }

    pub fn is_drifting(&self) -> bool {
        self.phase == PointerPhase::Drifting
    }

    pub fn is_fading(&self) -> bool {
        self.phase == PointerPhase::Fading
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Blob {
    /// Cells.
    pub radius: f32,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub life: f32,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Afterglow {
    pub pos: Vec2,
    pub life: f32,
    /// Time since spawn in 100 ms units.
    pub age: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    /// Index into the palette's scatter set.
    pub glyph: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SparkleCell {
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sparkle {
    pub cell: SparkleCell,
    pub life: f32,
    /// Index into the palette's sparkle set.
    pub glyph: usize,
}

/// Read-only view of the engine handed to the renderer.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub grid: GridSize,
    pub pointer: Option<Vec2>,
    pub blob: Blob,
    pub puddle_radius: f32,
    pub base_opacity: f32,
    pub accent_opacity: f32,
    pub trail: &'a VecDeque<TrailPoint>,
    pub afterglow: Option<Afterglow>,
    pub scatter: &'a [ScatterParticle],
    pub sparkles: &'a VecDeque<Sparkle>,
}

pub struct Engine {
    grid: GridSize,
    rng: StdRng,
    inertia: bool,
    pointer: PointerState,
    blob: Blob,
    puddle_hold: f32,
    puddle_radius: f32,
    base_opacity: f32,
    accent_opacity: f32,
    trail: VecDeque<TrailPoint>,
    afterglow: Option<Afterglow>,
    scatter: Vec<ScatterParticle>,
    sparkles: VecDeque<Sparkle>,
    sparkle_spawn_acc: f32,
    sparkle_decay_acc: f32,
    clock: f32,
    dissolves: u64,
}

impl Engine {
    pub fn new(seed: u64) -> Self {
        Self {
            grid: GridSize::default(),
            rng: StdRng::seed_from_u64(seed),
            inertia: false,
            pointer: PointerState::idle(),
            blob: Blob::default(),
            puddle_hold: 0.0,
            puddle_radius: 0.0,
            base_opacity: ParameterSet::default().base_opacity,
            accent_opacity: 0.0,
            trail: VecDeque::new(),
            afterglow: None,
            scatter: Vec::new(),
            sparkles: VecDeque::new(),
            sparkle_spawn_acc: 0.0,
            sparkle_decay_acc: 0.0,
            clock: 0.0,
            dissolves: 0,
        }
    }

    /// Enables coasting after release, as on touch devices.
    pub fn set_inertia(&mut self, on: bool) {
        self.inertia = on;
    }

    pub fn inertia(&self) -> bool {
        self.inertia
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    /// Adopts a new grid size and pulls every live entity back inside it.
    pub fn resize(&mut self, grid: GridSize) {
        if grid == self.grid {
            return;
        }
        log::debug!("engine grid {}x{}", grid.width, grid.height);
        self.grid = grid;
        if grid.is_empty() {
            self.pointer = PointerState::idle();
            self.trail.clear();
            self.afterglow = None;
            self.scatter.clear();
            self.sparkles.clear();
            return;
        }
        if let Some(p) = self.pointer.position {
            self.pointer.position = Some(grid.clamp(p));
        }
        if let Some(t) = self.pointer.target {
            self.pointer.target = Some(grid.clamp(t));
        }
        self.sparkles
            .retain(|s| s.cell.x < grid.width && s.cell.y < grid.height);
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn blob(&self) -> Blob {
        self.blob
    }

    pub fn puddle_hold(&self) -> f32 {
        self.puddle_hold
    }

    pub fn puddle_radius(&self) -> f32 {
        self.puddle_radius
    }

    pub fn base_opacity(&self) -> f32 {
        self.base_opacity
    }

    pub fn accent_opacity(&self) -> f32 {
        self.accent_opacity
    }

    pub fn trail(&self) -> &VecDeque<TrailPoint> {
        &self.trail
    }

    pub fn afterglow(&self) -> Option<Afterglow> {
        self.afterglow
    }

    pub fn scatter(&self) -> &[ScatterParticle] {
        &self.scatter
    }

    pub fn sparkles(&self) -> &VecDeque<Sparkle> {
        &self.sparkles
    }

    pub fn dissolve_count(&self) -> u64 {
        self.dissolves
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: self.grid,
            pointer: self.pointer.position,
            blob: self.blob,
            puddle_radius: self.puddle_radius,
            base_opacity: self.base_opacity,
            accent_opacity: self.accent_opacity,
            trail: &self.trail,
            afterglow: self.afterglow,
            scatter: &self.scatter,
            sparkles: &self.sparkles,
        }
    }

    /* -----------------------------
       Pointer events (grid coordinates)
    ------------------------------ */

    fn accept(&self, x: f32, y: f32) -> Option<Vec2> {
        let p = Vec2::new(x, y);
        if self.grid.is_empty() || !p.is_finite() {
            return None;
        }
        Some(self.grid.clamp(p))
    }

    /// Sets a target, snapping an off-grid or idle pointer onto it with a
    /// fresh blob.
    fn retarget(&mut self, p: Vec2) {
        if self.pointer.position.is_none() || self.pointer.phase == PointerPhase::Idle {
            self.pointer.position = Some(p);
            self.pointer.velocity = Vec2::ZERO;
            self.blob = Blob::default();
        }
        self.pointer.target = Some(p);
        self.pointer.phase = PointerPhase::Tracking;
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let Some(p) = self.accept(x, y) else {
            return;
        };
        self.afterglow = None;
        self.retarget(p);
        self.pointer.pressing = true;
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some(p) = self.accept(x, y) else {
            return;
        };
        self.retarget(p);
    }

    /// Without inertia the target is dropped and the pointer holds where it
    /// is, so the blob and puddle ease out in place. The release point itself
    /// is not used.
    pub fn pointer_up(&mut self, _x: f32, _y: f32) {
        self.pointer.pressing = false;
        if self.inertia {
            self.begin_drift();
        } else if self.pointer.phase == PointerPhase::Tracking {
            self.pointer.target = None;
            self.pointer.velocity = Vec2::ZERO;
        }
    }

    /// Without inertia the pointer goes idle but keeps its position until the
    /// blob has faded, then drops off-grid. No afterglow is spawned.
    pub fn pointer_leave(&mut self) {
        self.pointer.pressing = false;
        if self.inertia {
            self.begin_drift();
        } else if self.pointer.phase == PointerPhase::Tracking {
            self.pointer.phase = PointerPhase::Idle;
            self.pointer.target = None;
            self.pointer.velocity = Vec2::ZERO;
        }
    }

    fn begin_drift(&mut self) {
        match self.pointer.phase {
            PointerPhase::Tracking | PointerPhase::Idle if self.pointer.position.is_some() => {
                self.pointer.phase = PointerPhase::Drifting;
                self.pointer.target = None;
            }
            PointerPhase::Drifting | PointerPhase::Fading => {}
            _ => self.go_idle(),
        }
    }

    fn go_idle(&mut self) {
        self.pointer = PointerState::idle();
    }

    /* -----------------------------
       Tick
    ------------------------------ */

    pub fn tick(&mut self, dt: Duration, params: &ParameterSet) {
        let dt_ms = dt.min(MAX_TICK).as_secs_f32() * 1000.0;
        let dt_norm = dt_ms / RATE_UNIT_MS;
        self.clock += dt_ms / 1000.0;

        if self.grid.is_empty() {
            self.update_opacity(dt_norm, params);
            return;
        }

        self.decay_trail(dt_norm, params);
        self.decay_afterglow(dt_norm, params);
        self.update_scatter(dt_norm, params);
        self.update_sparkles(dt_ms, params);

        self.update_pointer(dt_norm, params);
        self.update_blob(dt_norm, params);
        self.check_dissolve(params);

        self.update_puddle(dt_norm, params);
        self.update_opacity(dt_norm, params);
        self.spawn_trail(params);
    }

    fn update_pointer(&mut self, dt_norm: f32, params: &ParameterSet) {
        let grid = self.grid;
        let blob = self.blob;
        let ptr = &mut self.pointer;
        match ptr.phase {
            PointerPhase::Idle => {
                ptr.velocity = Vec2::ZERO;
                ptr.target = None;
                if blob.radius < params.fade_radius_epsilon
                    && blob.intensity < params.fade_intensity_epsilon
                {
                    ptr.position = None;
                }
            }
            PointerPhase::Tracking => {
                let Some(pos) = ptr.position else {
                    *ptr = PointerState::idle();
                    return;
                };
                // Released without inertia: hold in place.
                let Some(target) = ptr.target else {
                    ptr.velocity = Vec2::ZERO;
                    return;
                };
                let k = crate::math::ease_factor(params.pointer_smoothing, dt_norm);
                let next = pos.add(target.sub(pos).mul(k));
                if dt_norm > 0.0 {
                    ptr.velocity = next.sub(pos).mul(1.0 / dt_norm);
                }
                ptr.position = Some(next);
            }
            PointerPhase::Drifting => {
                let Some(pos) = ptr.position else {
                    *ptr = PointerState::idle();
                    return;
                };
                let moved = pos.add(ptr.velocity.mul(dt_norm));
                let clamped = grid.clamp(moved);
                if clamped.x != moved.x {
                    ptr.velocity.x = 0.0;
                }
                if clamped.y != moved.y {
                    ptr.velocity.y = 0.0;
                }
                ptr.position = Some(clamped);
                ptr.velocity = ptr.velocity.mul(params.friction.clamp(0.0, 1.0).powf(dt_norm));
                if ptr.velocity.len() < params.min_velocity {
                    ptr.phase = PointerPhase::Fading;
                }
            }
            PointerPhase::Fading => {}
        }
    }

    fn update_blob(&mut self, dt_norm: f32, params: &ParameterSet) {
        let diag = self.grid.diagonal();
        let (radius, intensity, radius_rate, intensity_rate) = match self.pointer.phase {
            PointerPhase::Tracking if self.pointer.pressing => (
                params.blob_radius_press * diag,
                params.blob_intensity_press,
                params.blob_radius_lerp,
                params.blob_intensity_lerp,
            ),
            PointerPhase::Tracking | PointerPhase::Drifting => (
                params.blob_radius_hover * diag,
                params.blob_intensity_hover,
                params.blob_radius_lerp,
                params.blob_intensity_lerp,
            ),
            PointerPhase::Fading | PointerPhase::Idle => {
                (0.0, 0.0, params.blob_fade_lerp, params.blob_fade_lerp)
            }
        };
        self.blob.radius = approach(self.blob.radius, radius, radius_rate, dt_norm).max(0.0);
        self.blob.intensity =
            approach(self.blob.intensity, intensity, intensity_rate, dt_norm).max(0.0);
    }

    fn check_dissolve(&mut self, params: &ParameterSet) {
        if !self.pointer.is_fading() {
            return;
        }
        if self.blob.radius >= params.fade_radius_epsilon
            || self.blob.intensity >= params.fade_intensity_epsilon
        {
            return;
        }
        let Some(at) = self.pointer.position else {
            self.go_idle();
            return;
        };
        self.dissolve(at, self.pointer.velocity, params);
    }

    fn dissolve(&mut self, at: Vec2, last_velocity: Vec2, params: &ParameterSet) {
        self.dissolves += 1;
        log::debug!("dissolve #{} at ({:.1}, {:.1})", self.dissolves, at.x, at.y);

        self.afterglow = Some(Afterglow {
            pos: at,
            life: 1.0,
            age: 0.0,
        });

        let count = as_count(params.scatter_count);
        let inherit = last_velocity.mul(params.scatter_velocity_inherit);
        self.scatter.reserve(count);
        for _ in 0..count {
            let angle = self.rng.gen_range(0.0..TAU);
            let speed = params.scatter_speed * self.rng.gen_range(0.5..=1.0);
            let radial = Vec2::new(angle.cos(), angle.sin()).mul(speed);
            self.scatter.push(ScatterParticle {
                pos: at,
                vel: radial.add(inherit),
                life: 1.0,
                glyph: self.rng.gen_range(0..usize::MAX),
            });
        }

        self.blob = Blob::default();
        self.go_idle();
    }

    fn update_puddle(&mut self, dt_norm: f32, params: &ParameterSet) {
        let grow = params.puddle_grow_frames.max(1.0);
        if self.pointer.pressing {
            self.puddle_hold = (self.puddle_hold + dt_norm).min(grow);
        } else {
            self.puddle_hold = (self.puddle_hold - 2.0 * dt_norm).max(0.0);
        }
        let t = (self.puddle_hold / grow).min(1.0);
        let start = params.puddle_start_radius;
        let frac = start + (params.puddle_max_radius - start) * ease_out_quad(t);
        self.puddle_radius = frac.max(0.0) * self.grid.diagonal();
    }

    fn update_opacity(&mut self, dt_norm: f32, params: &ParameterSet) {
        let t = self.clock * params.master_speed;
        let wave = params.pulse_weight_a * (t * params.pulse_freq_a).sin()
            + params.pulse_weight_b * (t * params.pulse_freq_b).sin()
            + params.pulse_weight_c * (t * params.pulse_freq_c).sin();
        self.base_opacity = (params.base_opacity + wave * params.pulse_amount).clamp(0.0, 1.0);

        let (target, rate) = if self.pointer.pressing {
            (params.accent_max_opacity, params.accent_press_lerp)
        } else {
            (0.0, params.accent_release_lerp)
        };
        self.accent_opacity = approach(self.accent_opacity, target, rate, dt_norm).clamp(0.0, 1.0);
        if !self.pointer.pressing && self.accent_opacity < params.accent_epsilon {
            self.accent_opacity = 0.0;
            self.puddle_hold = 0.0;
        }
    }

    fn decay_trail(&mut self, dt_norm: f32, params: &ParameterSet) {
        if self.pointer.pressing {
            let step = params.trail_decay_press * dt_norm;
            for p in self.trail.iter_mut() {
                p.life -= step;
            }
        } else {
            let keep = params.trail_decay_exp.clamp(0.0, 1.0).powf(dt_norm);
            let floor = params.trail_decay_linear * dt_norm;
            for p in self.trail.iter_mut() {
                p.life = p.life * keep - floor;
            }
        }
        self.trail.retain(|p| p.life > 0.0);
    }

    fn spawn_trail(&mut self, params: &ParameterSet) {
        if !self.pointer.pressing {
            return;
        }
        let Some(pos) = self.pointer.position else {
            return;
        };
        let far_enough = match self.trail.back() {
            Some(last) => last.pos.dist(pos) >= params.trail_spawn_distance,
            None => true,
        };
        if far_enough {
            // The blob may still be growing in; use the intensity it is heading for.
            self.trail.push_back(TrailPoint {
                pos,
                life: 1.0,
                intensity: self.blob.intensity.max(params.blob_intensity_press),
            });
        }
        let max = as_count(params.trail_max_length).max(1);
        while self.trail.len() > max {
            self.trail.pop_front();
        }
    }

    fn decay_afterglow(&mut self, dt_norm: f32, params: &ParameterSet) {
        if let Some(g) = self.afterglow.as_mut() {
            g.life -= params.afterglow_decay * dt_norm;
            g.age += dt_norm;
            if g.life <= 0.0 {
                self.afterglow = None;
            }
        }
    }

    fn update_scatter(&mut self, dt_norm: f32, params: &ParameterSet) {
        let damp = params.scatter_friction.clamp(0.0, 1.0).powf(dt_norm);
        let decay = params.scatter_decay * dt_norm;
        let max_x = self.grid.width as f32 - 1.0 + SCATTER_MARGIN;
        let max_y = self.grid.height as f32 - 1.0 + SCATTER_MARGIN;
        for p in self.scatter.iter_mut() {
            p.pos = p.pos.add(p.vel.mul(dt_norm));
            p.vel = p.vel.mul(damp);
            p.life -= decay;
        }
        self.scatter.retain(|p| {
            p.life > 0.0
                && p.pos.x >= -SCATTER_MARGIN
                && p.pos.y >= -SCATTER_MARGIN
                && p.pos.x <= max_x
                && p.pos.y <= max_y
        });
    }

    fn update_sparkles(&mut self, dt_ms: f32, params: &ParameterSet) {
        let max = as_count(params.sparkle_max_count);

        self.sparkle_spawn_acc += dt_ms;
        while self.sparkle_spawn_acc >= SPARKLE_SPAWN_MS {
            self.sparkle_spawn_acc -= SPARKLE_SPAWN_MS;
            if max == 0 || !self.rng.gen_bool(params.sparkle_spawn_chance.clamp(0.0, 1.0) as f64) {
                continue;
            }
            while self.sparkles.len() >= max {
                self.sparkles.pop_front();
            }
            let cell = SparkleCell {
                x: self.rng.gen_range(0..self.grid.width),
                y: self.rng.gen_range(0..self.grid.height),
            };
            self.sparkles.push_back(Sparkle {
                cell,
                life: 1.0,
                glyph: self.rng.gen_range(0..usize::MAX),
            });
        }
        // A lowered max applies on the next tick even without a spawn.
        while self.sparkles.len() > max {
            self.sparkles.pop_front();
        }

        self.sparkle_decay_acc += dt_ms;
        while self.sparkle_decay_acc >= SPARKLE_DECAY_MS {
            self.sparkle_decay_acc -= SPARKLE_DECAY_MS;
            for s in self.sparkles.iter_mut() {
                s.life -= params.sparkle_decay_rate;
            }
            self.sparkles.retain(|s| s.life > 0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn engine(w: usize, h: usize) -> Engine {
        let mut e = Engine::new(1);
        e.resize(GridSize::new(w, h));
        e
    }

    fn run(e: &mut Engine, p: &ParameterSet, ticks: usize) {
        for _ in 0..ticks {
            e.tick(FRAME, p);
        }
    }

    #[test]
    fn first_press_snaps_with_an_empty_blob() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.pointer_down(5.0, 5.0);
        assert_eq!(e.pointer().position, Some(Vec2::new(5.0, 5.0)));
        assert_eq!(e.blob(), Blob::default());
        e.tick(FRAME, &p);
        assert_eq!(e.pointer().position, Some(Vec2::new(5.0, 5.0)));
        assert_eq!(e.pointer().phase, PointerPhase::Tracking);
        assert!(e.pointer().pressing);
    }

    #[test]
    fn later_press_eases_toward_target() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.pointer_move(20.0, 10.0);
        run(&mut e, &p, 5);
        e.pointer_down(5.0, 5.0);
        e.tick(FRAME, &p);
        let pos = e.pointer().position.unwrap();
        assert!(pos.x < 20.0 && pos.x > 5.0, "x = {}", pos.x);
        assert!(pos.y < 10.0 && pos.y > 5.0, "y = {}", pos.y);
    }

    #[test]
    fn coordinates_are_clamped_and_garbage_ignored() {
        let mut e = engine(10, 10);
        e.pointer_down(f32::NAN, 3.0);
        assert_eq!(e.pointer().phase, PointerPhase::Idle);
        e.pointer_down(50.0, -4.0);
        assert_eq!(e.pointer().position, Some(Vec2::new(9.0, 0.0)));
    }

    #[test]
    fn empty_grid_is_inert() {
        let p = ParameterSet::default();
        let mut e = engine(0, 0);
        e.pointer_down(1.0, 1.0);
        run(&mut e, &p, 50);
        assert_eq!(e.pointer().phase, PointerPhase::Idle);
        assert!(e.sparkles().is_empty());
        assert!(e.trail().is_empty());
    }

    #[test]
    fn down_then_leave_never_spawns_afterglow() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.pointer_down(5.0, 5.0);
        e.pointer_leave();
        for _ in 0..500 {
            e.tick(FRAME, &p);
            assert!(e.afterglow().is_none());
            assert_ne!(e.pointer().phase, PointerPhase::Fading);
        }
        assert_eq!(e.pointer().phase, PointerPhase::Idle);
        assert_eq!(e.dissolve_count(), 0);

        e.pointer_down(8.0, 8.0);
        e.pointer_up(8.0, 8.0);
        run(&mut e, &p, 10);
        assert_eq!(e.pointer().phase, PointerPhase::Tracking);
        assert_eq!(e.pointer().target, None);
        assert!(e.afterglow().is_none());
        assert!(e.scatter().is_empty());
    }

    #[test]
    fn release_without_inertia_holds_position_while_fading_out() {
        let p = ParameterSet::default();
        let mut e = engine(60, 30);
        e.pointer_down(30.0, 15.0);
        run(&mut e, &p, 400);
        let held = e.blob();
        e.pointer_up(30.0, 15.0);
        e.tick(FRAME, &p);

        let ptr = e.pointer();
        assert_eq!(ptr.position, Some(Vec2::new(30.0, 15.0)));
        assert_eq!(ptr.target, None);
        assert_eq!(ptr.velocity, Vec2::ZERO);
        assert!(!ptr.pressing);
        assert!(e.accent_opacity() > 0.5);
        assert!(e.blob().radius > 0.0 && e.blob().radius < held.radius);

        run(&mut e, &p, 1000);
        assert_eq!(e.pointer().position, Some(Vec2::new(30.0, 15.0)));
        assert_eq!(e.accent_opacity(), 0.0);
        let diag = GridSize::new(60, 30).diagonal();
        assert!((e.blob().radius - p.blob_radius_hover * diag).abs() < 1e-2);
    }

    #[test]
    fn leave_without_inertia_shrinks_blob_in_place() {
        let p = ParameterSet::default();
        let mut e = engine(60, 30);
        e.pointer_move(20.0, 10.0);
        run(&mut e, &p, 200);
        let before = e.blob();
        assert!(before.radius > p.fade_radius_epsilon);

        e.pointer_leave();
        e.tick(FRAME, &p);
        assert_eq!(e.pointer().phase, PointerPhase::Idle);
        assert_eq!(e.pointer().position, Some(Vec2::new(20.0, 10.0)));
        assert!(e.blob().radius < before.radius);
        assert!(e.blob().radius > 0.0);

        for _ in 0..1000 {
            e.tick(FRAME, &p);
            assert!(e.afterglow().is_none());
        }
        assert_eq!(e.pointer().position, None);
        assert_eq!(e.dissolve_count(), 0);

        e.pointer_move(50.0, 25.0);
        assert_eq!(e.pointer().position, Some(Vec2::new(50.0, 25.0)));
        assert_eq!(e.blob(), Blob::default());
    }

    #[test]
    fn first_trail_point_is_not_faint() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.pointer_down(10.0, 10.0);
        e.tick(FRAME, &p);
        assert!(e.blob().intensity < 0.1);
        assert_eq!(e.trail().len(), 1);
        assert_eq!(e.trail()[0].intensity, p.blob_intensity_press);
    }

    #[test]
    fn drift_fade_dissolve_spawns_one_afterglow_and_burst() {
        let mut p = ParameterSet::default();
        p.scatter_count = 10.0;
        let mut e = engine(80, 30);
        e.set_inertia(true);

        e.pointer_move(5.0, 15.0);
        run(&mut e, &p, 10);
        e.pointer_move(60.0, 15.0);
        run(&mut e, &p, 2);
        assert!(e.pointer().velocity.len() > p.min_velocity);

        e.pointer_leave();
        assert!(e.pointer().is_drifting());

        let mut saw_fading = false;
        let mut burst_checked = false;
        for _ in 0..5000 {
            e.tick(FRAME, &p);
            saw_fading |= e.pointer().is_fading();
            if let Some(g) = e.afterglow() {
                if !burst_checked {
                    assert!(saw_fading);
                    assert_eq!(g.life, 1.0);
                    assert_eq!(e.scatter().len(), 10);
                    assert!(e.scatter().iter().all(|s| s.pos == g.pos));
                    burst_checked = true;
                }
            }
        }
        assert!(burst_checked);
        assert_eq!(e.dissolve_count(), 1);
        assert_eq!(e.pointer().phase, PointerPhase::Idle);
        assert!(e.afterglow().is_none());
        assert!(e.scatter().is_empty());
    }

    #[test]
    fn press_cancels_afterglow() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.dissolve(Vec2::new(3.0, 3.0), Vec2::ZERO, &p);
        assert!(e.afterglow().is_some());
        e.pointer_down(10.0, 10.0);
        assert!(e.afterglow().is_none());
    }

    #[test]
    fn trail_keeps_the_newest_points() {
        let mut p = ParameterSet::default();
        p.trail_max_length = 5.0;
        p.pointer_smoothing = 1.0;
        let mut e = engine(60, 20);
        e.pointer_down(0.0, 5.0);
        e.tick(FRAME, &p);
        for i in 1..=20 {
            e.pointer_move(i as f32 * 2.0, 5.0);
            e.tick(FRAME, &p);
            assert!(e.trail().len() <= 5);
        }
        let xs: Vec<f32> = e.trail().iter().map(|t| t.pos.x).collect();
        assert_eq!(xs, vec![32.0, 34.0, 36.0, 38.0, 40.0]);
    }

    #[test]
    fn trail_decays_after_release() {
        let mut p = ParameterSet::default();
        p.pointer_smoothing = 1.0;
        let mut e = engine(60, 20);
        e.pointer_down(0.0, 5.0);
        for i in 1..=10 {
            e.pointer_move(i as f32 * 3.0, 5.0);
            e.tick(FRAME, &p);
        }
        assert!(!e.trail().is_empty());
        e.pointer_up(30.0, 5.0);
        run(&mut e, &p, 2000);
        assert!(e.trail().is_empty());
    }

    #[test]
    fn sparkles_never_exceed_max() {
        let mut p = ParameterSet::default();
        p.sparkle_spawn_chance = 1.0;
        p.sparkle_max_count = 5.0;
        p.sparkle_decay_rate = 0.005;
        let mut e = engine(30, 10);
        for _ in 0..200 {
            e.tick(Duration::from_millis(50), &p);
            assert!(e.sparkles().len() <= 5);
        }
        assert_eq!(e.sparkles().len(), 5);
        assert!(e.sparkles().iter().all(|s| s.cell.x < 30 && s.cell.y < 10));
    }

    #[test]
    fn sparkles_expire() {
        let mut p = ParameterSet::default();
        p.sparkle_spawn_chance = 1.0;
        let mut e = engine(30, 10);
        run(&mut e, &p, 30);
        assert!(!e.sparkles().is_empty());
        p.sparkle_spawn_chance = 0.0;
        run(&mut e, &p, 300);
        assert!(e.sparkles().is_empty());
    }

    #[test]
    fn puddle_grows_while_pressed_and_stays_bounded() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.pointer_down(10.0, 10.0);
        run(&mut e, &p, 30);
        let early = e.puddle_radius();
        run(&mut e, &p, 1000);
        assert_eq!(e.puddle_hold(), p.puddle_grow_frames);
        let full = e.puddle_radius();
        assert!(full > early);
        let diag = GridSize::new(40, 20).diagonal();
        assert!((full - p.puddle_max_radius * diag).abs() < 1e-3);
    }

    #[test]
    fn accent_snaps_to_zero_after_release() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        e.pointer_down(10.0, 10.0);
        run(&mut e, &p, 100);
        assert!(e.accent_opacity() > 0.5);
        e.pointer_up(10.0, 10.0);
        run(&mut e, &p, 1000);
        assert_eq!(e.accent_opacity(), 0.0);
        assert_eq!(e.puddle_hold(), 0.0);
    }

    #[test]
    fn long_ticks_are_clamped() {
        let p = ParameterSet::default();
        let mut a = engine(40, 20);
        let mut b = engine(40, 20);
        a.pointer_move(1.0, 1.0);
        b.pointer_move(1.0, 1.0);
        a.pointer_move(30.0, 15.0);
        b.pointer_move(30.0, 15.0);
        a.tick(Duration::from_secs(5), &p);
        b.tick(MAX_TICK, &p);
        assert_eq!(a.pointer().position, b.pointer().position);
    }

    #[test]
    fn base_opacity_pulses_within_bounds() {
        let p = ParameterSet::default();
        let mut e = engine(40, 20);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for _ in 0..600 {
            e.tick(Duration::from_millis(50), &p);
            lo = lo.min(e.base_opacity());
            hi = hi.max(e.base_opacity());
        }
        assert!(hi > lo);
        assert!(lo >= p.base_opacity - p.pulse_amount - 1e-4);
        assert!(hi <= p.base_opacity + p.pulse_amount + 1e-4);
    }

    #[test]
    fn shrinking_the_grid_drops_outside_sparkles() {
        let mut p = ParameterSet::default();
        p.sparkle_spawn_chance = 1.0;
        p.sparkle_decay_rate = 0.005;
        let mut e = engine(100, 50);
        run(&mut e, &p, 300);
        e.resize(GridSize::new(10, 5));
        assert!(e.sparkles().iter().all(|s| s.cell.x < 10 && s.cell.y < 5));
    }
}
