//! Turns an engine snapshot into two layers of glyph rows.
//!
//! The base layer is the wave field with every dynamic influence stacked on
//! top; the accent layer only carries the puddle around a held pointer.

use crate::engine::{GridSize, Snapshot};
use crate::math::{clamp01, Vec2};
use crate::palette::Palette;
use crate::params::ParameterSet;
use std::f32::consts::SQRT_2;

/// Accent opacity at or below which the accent layer is not drawn.
pub const ACCENT_VISIBLE_MIN: f32 = 0.01;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldFrame {
    pub grid: GridSize,
    /// One string per row, `grid.width` chars each.
    pub base: Vec<String>,
    pub accent: Vec<String>,
    /// Final per-cell value in `[0, 1]`, row-major.
    pub values: Vec<f32>,
    pub base_opacity: f32,
    pub accent_opacity: f32,
    /// Degrees.
    pub accent_hue: f32,
}

impl FieldFrame {
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn accent_visible(&self) -> bool {
        self.accent_opacity > ACCENT_VISIBLE_MIN
    }

    pub fn value(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.grid.width || y >= self.grid.height {
            return None;
        }
        self.values.get(y * self.grid.width + x).copied()
    }

    pub fn base_text(&self) -> String {
        self.base.join("\n")
    }

    pub fn accent_text(&self) -> String {
        self.accent.join("\n")
    }
}

#[derive(Clone, Copy)]
struct CellGeom {
    nx: f32,
    ny: f32,
    /// Distance from the centre, 0 at the centre and 1 in the corners.
    center_dist: f32,
}

#[derive(Clone, Copy)]
struct Marker {
    life: f32,
    glyph: usize,
}

#[derive(Default)]
pub struct FieldRenderer {
    grid: GridSize,
    geom: Vec<CellGeom>,
    frame: u64,
    trail_rows: Vec<Vec<usize>>,
    scatter_cells: Vec<Option<Marker>>,
    sparkle_cells: Vec<Option<Marker>>,
}

impl FieldRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render frames produced so far; drives the wave phase.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn advance(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    /// Drops the cached geometry; it is rebuilt on the next render.
    pub fn invalidate(&mut self) {
        self.grid = GridSize::default();
        self.geom.clear();
    }

    fn ensure_geometry(&mut self, grid: GridSize) {
        if grid == self.grid && self.geom.len() == grid.cells() {
            return;
        }
        log::debug!("rebuilding field geometry for {}x{}", grid.width, grid.height);
        self.grid = grid;
        self.geom.clear();
        self.geom.reserve(grid.cells());
        let sx = (grid.width.max(2) - 1) as f32;
        let sy = (grid.height.max(2) - 1) as f32;
        for y in 0..grid.height {
            for x in 0..grid.width {
                let nx = x as f32 / sx * 2.0 - 1.0;
                let ny = y as f32 / sy * 2.0 - 1.0;
                self.geom.push(CellGeom {
                    nx,
                    ny,
                    center_dist: (nx * nx + ny * ny).sqrt() / SQRT_2,
                });
            }
        }
        self.trail_rows = vec![Vec::new(); grid.height];
        self.scatter_cells = vec![None; grid.cells()];
        self.sparkle_cells = vec![None; grid.cells()];
    }

    pub fn render(
        &mut self,
        params: &ParameterSet,
        palette: &Palette,
        snap: &Snapshot<'_>,
    ) -> FieldFrame {
        let grid = snap.grid;
        let mut out = FieldFrame {
            grid,
            base_opacity: clamp01(snap.base_opacity),
            accent_opacity: clamp01(snap.accent_opacity),
            accent_hue: params.accent_hue.rem_euclid(360.0),
            ..FieldFrame::default()
        };
        if grid.is_empty() {
            return out;
        }
        self.ensure_geometry(grid);

        let diag = grid.diagonal();
        let trail_r = (params.trail_radius * diag).max(0.0);
        self.bucket_trail(snap, trail_r);
        self.mark_scatter(snap);
        self.mark_sparkles(snap, params.sparkle_threshold);

        let waves = [
            Wave::new(params.wave1_freq, params.wave1_cross, params.wave1_weight, params.wave1_speed),
            Wave::new(params.wave2_freq, params.wave2_cross, params.wave2_weight, params.wave2_speed),
            Wave::new(params.wave3_freq, params.wave3_cross, params.wave3_weight, params.wave3_speed),
        ];
        let weight_sum: f32 = waves.iter().map(|w| w.weight).sum();
        let time = self.frame as f32 * params.master_speed;
        let phases = waves.map(|w| time * w.speed);

        let blob = match snap.pointer {
            Some(p) if snap.blob.radius > 0.0 => Some((p, snap.blob.radius, snap.blob.intensity)),
            _ => None,
        };
        let glow = snap.afterglow.map(|g| {
            let base_r = params.afterglow_radius * diag * (1.0 + params.afterglow_expand * (1.0 - g.life));
            (g, base_r)
        });
        let puddle = match snap.pointer {
            Some(p) if out.accent_visible() && snap.puddle_radius > 0.0 => Some((p, snap.puddle_radius)),
            _ => None,
        };

        out.values.reserve(grid.cells());
        out.base.reserve(grid.height);
        out.accent.reserve(grid.height);

        for y in 0..grid.height {
            let mut base_row = String::with_capacity(grid.width);
            let mut accent_row = String::with_capacity(grid.width);
            for x in 0..grid.width {
                let idx = y * grid.width + x;
                let g = self.geom[idx];
                let cell = Vec2::new(x as f32, y as f32);

                let mut value = if weight_sum > 0.0 {
                    let mut sum = 0.0;
                    for (w, phase) in waves.iter().zip(phases) {
                        sum += w.weight * (g.nx * w.freq + phase + g.ny * w.cross).sin();
                    }
                    (sum / weight_sum + 1.0) * 0.5
                } else {
                    0.5
                };
                value = clamp01(value) * (1.0 - g.center_dist * params.center_falloff).max(0.0);

                if let Some((p, r, intensity)) = blob {
                    let f = falloff(cell.dist(p), r);
                    value = (value + intensity * f * f).min(1.0);
                }

                if trail_r > 0.0 {
                    for &i in &self.trail_rows[y] {
                        let t = snap.trail[i];
                        let (dx, dy) = (t.pos.x - cell.x, t.pos.y - cell.y);
                        if dx.abs() > trail_r || dy.abs() > trail_r {
                            continue;
                        }
                        let f = falloff((dx * dx + dy * dy).sqrt(), trail_r);
                        if f > 0.0 {
                            value += f * f * t.life * t.intensity * params.trail_intensity;
                        }
                    }
                    value = value.min(1.0);
                }

                if let Some((glow, base_r)) = glow {
                    let d = cell.sub(glow.pos);
                    let theta = d.y.atan2(d.x);
                    let t = glow.age * params.afterglow_morph_speed;
                    let morph = 1.0
                        + params.afterglow_morph_amp_a * (params.afterglow_morph_lobes_a.round() * theta + t).sin()
                        + params.afterglow_morph_amp_b
                            * (params.afterglow_morph_lobes_b.round() * theta - 1.7 * t).sin();
                    let f = falloff(d.len(), base_r * morph);
                    if f > 0.0 {
                        value = (value + f * f * glow.life.max(0.0).sqrt() * params.afterglow_intensity).min(1.0);
                    }
                }

                let glyph = if let Some(m) = self.scatter_cells[idx] {
                    value = (value + m.life * params.scatter_value_boost).min(1.0);
                    palette.scatter_glyph(m.glyph)
                } else if let Some(m) = self.sparkle_cells[idx] {
                    palette.sparkle_glyph(m.glyph)
                } else {
                    palette.block(value)
                };
                base_row.push(glyph);
                out.values.push(clamp01(value));

                let accent = match puddle {
                    Some((p, r)) => {
                        let f = falloff(cell.dist(p), r);
                        if f > 0.0 {
                            palette.puddle_glyph(f * f)
                        } else {
                            ' '
                        }
                    }
                    None => ' ',
                };
                accent_row.push(accent);
            }
            out.base.push(base_row);
            out.accent.push(accent_row);
        }
        out
    }

    fn bucket_trail(&mut self, snap: &Snapshot<'_>, radius: f32) {
        for row in self.trail_rows.iter_mut() {
            row.clear();
        }
        if radius <= 0.0 {
            return;
        }
        let max_y = snap.grid.height as f32 - 1.0;
        for (i, t) in snap.trail.iter().enumerate() {
            if t.life <= 0.0 || !t.pos.is_finite() {
                continue;
            }
            let lo = (t.pos.y - radius).ceil().max(0.0);
            let hi = (t.pos.y + radius).floor().min(max_y);
            if lo > hi {
                continue;
            }
            for y in lo as usize..=hi as usize {
                self.trail_rows[y].push(i);
            }
        }
    }

    fn mark_scatter(&mut self, snap: &Snapshot<'_>) {
        self.scatter_cells.fill(None);
        for s in snap.scatter {
            let Some(idx) = cell_index(snap.grid, s.pos) else {
                continue;
            };
            let slot = &mut self.scatter_cells[idx];
            if slot.map_or(true, |m| s.life > m.life) {
                *slot = Some(Marker {
                    life: s.life,
                    glyph: s.glyph,
                });
            }
        }
    }

    fn mark_sparkles(&mut self, snap: &Snapshot<'_>, threshold: f32) {
        self.sparkle_cells.fill(None);
        for s in snap.sparkles.iter() {
            if s.life <= threshold || s.cell.x >= snap.grid.width || s.cell.y >= snap.grid.height {
                continue;
            }
            let idx = s.cell.y * snap.grid.width + s.cell.x;
            let slot = &mut self.sparkle_cells[idx];
            if slot.map_or(true, |m| s.life > m.life) {
                *slot = Some(Marker {
                    life: s.life,
                    glyph: s.glyph,
                });
            }
        }
    }
}

#[derive(Clone, Copy)]
struct Wave {
    freq: f32,
    cross: f32,
    weight: f32,
    speed: f32,
}

impl Wave {
    fn new(freq: f32, cross: f32, weight: f32, speed: f32) -> Self {
        Self {
            freq,
            cross,
            weight: weight.max(0.0),
            speed,
        }
    }
}

/// `1 - d / r` inside the radius, 0 outside.
#[inline]
fn falloff(d: f32, r: f32) -> f32 {
    if r <= 0.0 || !(d < r) {
        0.0
    } else {
        1.0 - d / r
    }
}

fn cell_index(grid: GridSize, p: Vec2) -> Option<usize> {
    if !p.is_finite() {
        return None;
    }
    let (x, y) = (p.x.round(), p.y.round());
    if x < 0.0 || y < 0.0 || x >= grid.width as f32 || y >= grid.height as f32 {
        return None;
    }
    Some(y as usize * grid.width + x as usize)
}
