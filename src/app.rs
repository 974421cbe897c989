use crate::input::{collect_input, map_event, Action};
use crate::term::{draw_text, paint_frame, Rgb, Terminal};
use anyhow::{Context, Result};
use clap::Parser;
use glyphfield::config::{resolve_settings, Settings};
use glyphfield::macros::{self, Macro, MacroState};
use glyphfield::{FieldFrame, Surface};
use rand::{rngs::StdRng, SeedableRng};
use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "glyphfield", about = "Pointer-reactive generative glyph field")]
struct Args {
    /// JSON settings file (default: the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Glyph palette: blocks, ascii, braille, binary
    #[arg(long)]
    palette: Option<String>,

    /// Set a macro, e.g. --macro GHOST=0.8 (repeatable)
    #[arg(long = "macro", value_name = "NAME=VALUE", value_parser = parse_macro)]
    macros: Vec<(Macro, f32)>,

    /// Start from random macro values
    #[arg(long)]
    random_macros: bool,

    /// Coast after release like a touch screen
    #[arg(long)]
    touch: bool,

    #[arg(long)]
    seed: Option<u64>,

    /// Physics ticks per second
    #[arg(long)]
    physics_hz: Option<u32>,

    /// ms between field renders
    #[arg(long)]
    render_ms: Option<u64>,

    /// Write logs to this file (RUST_LOG controls the level)
    #[arg(long)]
    log: Option<PathBuf>,

    #[arg(long)]
    no_hud: bool,
}

fn parse_macro(raw: &str) -> Result<(Macro, f32), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let m = Macro::from_name(name).ok_or_else(|| format!("unknown macro {name:?}"))?;
    let v: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("bad value {value:?} for {}", m.name()))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("{} must be within 0..=1", m.name()));
    }
    Ok((m, v))
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

struct App {
    surface: Surface,
    term: Terminal,
    rng: StdRng,
    macros: MacroState,
    selected: Macro,
    physics_step: Duration,
    render_every: Duration,
    paused: bool,
    show_hud: bool,
    quit: bool,
    frame: FieldFrame,
    fps: f32,
}

impl App {
    fn init(args: Args, settings: Settings) -> Result<Self> {
        let seed = args.seed.or(settings.seed).unwrap_or_else(clock_seed);
        let physics_hz = args.physics_hz.unwrap_or(settings.physics_hz).clamp(1, 1000);
        let render_ms = args.render_ms.unwrap_or(settings.render_ms).clamp(1, 10_000);
        log::info!("seed {seed}, physics {physics_hz} Hz, render every {render_ms} ms");

        let mut rng = StdRng::seed_from_u64(seed ^ 0x9E37_79B9_7F4A_7C15);
        let mut macro_state = settings.macro_state();
        if args.random_macros {
            macro_state = Some(macros::randomize(&mut rng));
        }
        if !args.macros.is_empty() {
            let state = macro_state.get_or_insert_with(MacroState::default);
            for &(m, v) in &args.macros {
                state.set(m, v);
            }
        }

        let mut surface = Surface::new(seed);
        surface.set_palette(args.palette.as_deref().unwrap_or(&settings.palette));
        surface.set_inertia(args.touch || settings.touch);
        surface.set_config_overrides(settings.overrides);
        surface.set_macros(macro_state);

        let term = Terminal::begin().context("entering the alternate screen")?;
        surface.resize(term.cols as usize, term.rows as usize);

        Ok(Self {
            surface,
            term,
            rng,
            macros: macro_state.unwrap_or_default(),
            selected: Macro::Dither,
            physics_step: Duration::from_secs_f64(1.0 / physics_hz as f64),
            render_every: Duration::from_millis(render_ms),
            paused: false,
            show_hud: !args.no_hud,
            quit: false,
            frame: FieldFrame::default(),
            fps: 0.0,
        })
    }

    fn run(&mut self) -> Result<()> {
        let mut last_physics = Instant::now();
        let mut next_render = Instant::now();
        let mut next_physics = Instant::now();
        let mut last_render = Instant::now();

        while !self.quit {
            let now = Instant::now();
            let due = next_physics.min(next_render);
            let timeout = due.saturating_duration_since(now).min(Duration::from_millis(20));
            for ev in collect_input(timeout)? {
                if let Some(action) = map_event(ev) {
                    self.apply(action);
                }
            }

            let now = Instant::now();
            if now >= next_physics {
                let dt = now.saturating_duration_since(last_physics);
                last_physics = now;
                if !self.paused {
                    self.surface.tick_physics(dt);
                }
                next_physics = now + self.physics_step;
            }

            if now >= next_render {
                if !self.paused {
                    self.frame = self.surface.tick_render();
                }
                let since = now.saturating_duration_since(last_render).as_secs_f32();
                last_render = now;
                if since > 0.0 {
                    self.fps = self.fps * 0.8 + (1.0 / since) * 0.2;
                }
                self.draw()?;
                next_render = now + self.render_every;
            }
        }
        self.term.end()
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.quit = true,
            Action::TogglePause => self.paused = !self.paused,
            Action::NextPalette => {
                let p = self.surface.cycle_palette();
                log::info!("palette {}", p.name);
            }
            Action::RandomizeMacros => {
                self.macros = macros::randomize(&mut self.rng);
                self.surface.set_macros(Some(self.macros));
            }
            Action::ResetMacros => {
                self.macros = MacroState::default();
                self.surface.set_macros(Some(self.macros));
            }
            Action::SelectMacro(m) => self.selected = m,
            Action::NudgeMacro(delta) => {
                self.macros.nudge(self.selected, delta);
                self.surface.set_macros(Some(self.macros));
            }
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::ToggleInertia => {
                let on = !self.surface.inertia();
                self.surface.set_inertia(on);
            }
            Action::PointerDown(x, y) => self.surface.pointer_down(x, y),
            Action::PointerMove(x, y) => self.surface.pointer_move(x, y),
            Action::PointerUp(x, y) => self.surface.pointer_up(x, y),
            Action::PointerLeave => self.surface.pointer_leave(),
            Action::Resize(w, h) => {
                self.term.resize(w, h);
                self.surface.resize(w as usize, h as usize);
            }
        }
    }

    fn draw(&mut self) -> Result<()> {
        self.term.cur.clear();
        paint_frame(&mut self.term.cur, &self.frame, self.surface.params().font_size);
        if self.show_hud {
            self.draw_hud();
        }
        self.term.present()
    }

    fn draw_hud(&mut self) {
        let fg = Rgb { r: 210, g: 220, b: 245 };
        let dim = Rgb { r: 150, g: 160, b: 185 };
        let grid = self.surface.grid();
        let mut status = format!(
            " glyphfield  {}x{}  palette {}  dissolves {}  {:.0} fps",
            grid.width,
            grid.height,
            self.surface.palette().name,
            self.surface.engine().dissolve_count(),
            self.fps
        );
        if self.surface.inertia() {
            status.push_str("  [touch]");
        }
        if self.paused {
            status.push_str("  [paused]");
        }
        draw_text(&mut self.term.cur, 0, 0, &status, fg);

        let mut x = 1u16;
        for (i, (m, v)) in self.macros.iter().enumerate() {
            let label = if m == self.selected {
                format!("[{} {} {:.2}]", i + 1, m.name(), v)
            } else {
                format!(" {} {} {:.2} ", i + 1, m.name(), v)
            };
            let color = if m == self.selected { fg } else { dim };
            draw_text(&mut self.term.cur, x, 1, &label, color);
            x = x.saturating_add(label.chars().count() as u16 + 1);
        }
        draw_text(
            &mut self.term.cur,
            1,
            2,
            "q quit  space pause  p palette  r random  0 reset  1-8 select  +/- adjust  t touch  h hud",
            dim,
        );
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x6C79_7068)
}

pub(crate) fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_ref())?;
    let settings = resolve_settings(args.config.as_deref()).context("loading settings")?;
    let mut app = App::init(args, settings)?;
    app.run()
}
