//! Host-facing wrapper around engine, renderer and parameters.
//!
//! The surface works in *container* units (terminal cells for the bundled
//! binary). The glyph grid is the container divided by `font_size`, so a
//! larger font gives a coarser field.

use crate::engine::{Engine, GridSize};
use crate::field::{FieldFrame, FieldRenderer};
use crate::macros::{self, MacroState};
use crate::palette::Palette;
use crate::params::{ParamOverrides, ParameterSet};
use std::time::Duration;

pub struct Surface {
    overrides: ParamOverrides,
    macros: Option<MacroState>,
    params: ParameterSet,
    palette: &'static Palette,
    engine: Engine,
    renderer: FieldRenderer,
    container: (usize, usize),
}

impl Surface {
    pub fn new(seed: u64) -> Self {
        Self {
            overrides: ParamOverrides::new(),
            macros: None,
            params: ParameterSet::default(),
            palette: Palette::default_palette(),
            engine: Engine::new(seed),
            renderer: FieldRenderer::new(),
            container: (0, 0),
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn overrides(&self) -> &ParamOverrides {
        &self.overrides
    }

    pub fn macros(&self) -> Option<&MacroState> {
        self.macros.as_ref()
    }

    pub fn palette(&self) -> &'static Palette {
        self.palette
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn grid(&self) -> GridSize {
        self.engine.grid()
    }

    pub fn container(&self) -> (usize, usize) {
        self.container
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.container = (cols, rows);
        self.apply_grid();
    }

    /// Explicit overrides; these sit above macro output.
    pub fn set_config_overrides(&mut self, overrides: ParamOverrides) {
        self.overrides = overrides;
        self.recompute();
    }

    /// `None` switches the macro layer off entirely.
    pub fn set_macros(&mut self, macros: Option<MacroState>) {
        self.macros = macros;
        self.recompute();
    }

    pub fn set_palette(&mut self, name: &str) {
        self.palette = Palette::by_name(name);
    }

    pub fn cycle_palette(&mut self) -> &'static Palette {
        self.palette = self.palette.next();
        self.palette
    }

    pub fn set_inertia(&mut self, on: bool) {
        self.engine.set_inertia(on);
    }

    pub fn inertia(&self) -> bool {
        self.engine.inertia()
    }

    fn recompute(&mut self) {
        let mut params = ParameterSet::default();
        if let Some(state) = &self.macros {
            params = params.with_overrides(&macros::compute(state));
        }
        self.params = params.with_overrides(&self.overrides);
        self.apply_grid();
    }

    fn font_size(&self) -> f32 {
        if self.params.font_size.is_finite() && self.params.font_size > 0.0 {
            self.params.font_size
        } else {
            1.0
        }
    }

    fn apply_grid(&mut self) {
        let fs = self.font_size();
        let (cols, rows) = self.container;
        let grid = GridSize::new(
            (cols as f32 / fs).floor() as usize,
            (rows as f32 / fs).floor() as usize,
        );
        if grid != self.engine.grid() {
            self.engine.resize(grid);
            self.renderer.invalidate();
        }
    }

    fn to_grid(&self, x: f32, y: f32) -> (f32, f32) {
        let fs = self.font_size();
        (x / fs, y / fs)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        let (gx, gy) = self.to_grid(x, y);
        self.engine.pointer_down(gx, gy);
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let (gx, gy) = self.to_grid(x, y);
        self.engine.pointer_move(gx, gy);
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        let (gx, gy) = self.to_grid(x, y);
        self.engine.pointer_up(gx, gy);
    }

    pub fn pointer_leave(&mut self) {
        self.engine.pointer_leave();
    }

    pub fn tick_physics(&mut self, dt: Duration) {
        self.engine.tick(dt, &self.params);
    }

    pub fn tick_render(&mut self) -> FieldFrame {
        self.renderer.advance();
        self.renderer
            .render(&self.params, self.palette, &self.engine.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::Macro;
    use crate::math::Vec2;
    use crate::params::ParamKey;

    #[test]
    fn grid_follows_font_size() {
        let mut s = Surface::new(1);
        s.resize(80, 24);
        assert_eq!(s.grid(), GridSize::new(80, 24));

        let mut o = ParamOverrides::new();
        o.insert(ParamKey::FontSize, 2.0);
        s.set_config_overrides(o);
        assert_eq!(s.overrides().get(ParamKey::FontSize), Some(2.0));
        assert_eq!(s.grid(), GridSize::new(40, 12));
        assert_eq!(s.container(), (80, 24));
    }

    #[test]
    fn container_coordinates_map_through_font_size() {
        let mut s = Surface::new(1);
        s.resize(80, 24);
        let mut o = ParamOverrides::new();
        o.insert(ParamKey::FontSize, 2.0);
        s.set_config_overrides(o);

        s.pointer_down(20.0, 10.0);
        assert_eq!(s.engine().pointer().position, Some(Vec2::new(10.0, 5.0)));

        s.pointer_move(500.0, -3.0);
        assert_eq!(s.engine().pointer().target, Some(Vec2::new(39.0, 0.0)));
    }

    #[test]
    fn explicit_overrides_beat_macros() {
        let mut s = Surface::new(1);
        let mut state = MacroState::default();
        state.set(Macro::Motion, 0.0);
        s.set_macros(Some(state));
        assert_eq!(s.macros().map(|m| m.get(Macro::Motion)), Some(0.0));
        assert!((s.params().master_speed - 0.25).abs() < 1e-6);

        let mut o = ParamOverrides::new();
        o.insert(ParamKey::MasterSpeed, 3.0);
        s.set_config_overrides(o);
        assert_eq!(s.params().master_speed, 3.0);

        s.set_config_overrides(ParamOverrides::new());
        s.set_macros(None);
        assert!(s.macros().is_none());
        assert!(s.overrides().is_empty());
        assert_eq!(*s.params(), ParameterSet::default());
    }

    #[test]
    fn macro_driven_font_size_rederives_the_grid() {
        let mut s = Surface::new(1);
        s.resize(60, 30);
        let mut o = ParamOverrides::new();
        o.insert(ParamKey::FontSize, 3.0);
        s.set_config_overrides(o);
        assert_eq!(s.grid(), GridSize::new(20, 10));
        s.set_macros(Some(MacroState::default()));
        assert_eq!(s.grid(), GridSize::new(20, 10));
    }

    #[test]
    fn tiny_container_renders_empty() {
        let mut s = Surface::new(1);
        let mut o = ParamOverrides::new();
        o.insert(ParamKey::FontSize, 4.0);
        s.set_config_overrides(o);
        s.resize(3, 3);
        assert!(s.grid().is_empty());
        s.pointer_down(1.0, 1.0);
        s.tick_physics(Duration::from_millis(16));
        assert!(s.tick_render().is_empty());
    }

    #[test]
    fn palette_switch_and_cycle() {
        let mut s = Surface::new(1);
        s.set_palette("braille");
        assert_eq!(s.palette().name, "braille");
        s.set_palette("nope");
        assert_eq!(s.palette().name, "blocks");
        assert_eq!(s.cycle_palette().name, "ascii");
    }
}
