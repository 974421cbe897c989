use crossterm::{
    cursor,
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use glyphfield::FieldFrame;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub(crate) fn grey(v: f32) -> Rgb {
        let g = (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb { r: g, g, b: g }
    }

    pub(crate) fn scale(self, k: f32) -> Rgb {
        let k = k.max(0.0);
        let s = |v: u8| -> u8 { ((v as f32) * k).round().clamp(0.0, 255.0) as u8 };
        Rgb {
            r: s(self.r),
            g: s(self.g),
            b: s(self.b),
        }
    }

    /// `h` in degrees, `s` and `l` in `[0, 1]`.
    pub(crate) fn from_hsl(h: f32, s: f32, l: f32) -> Rgb {
        let h = h.rem_euclid(360.0) / 60.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let to = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: to(r),
            g: to(g),
            b: to(b),
        }
    }

    fn to_color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Rgb,
    pub(crate) bg: Rgb,
}

impl Cell {
    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Rgb { r: 255, g: 255, b: 255 },
        bg: Rgb::BLACK,
    };
}

pub(crate) struct CellBuffer {
    w: u16,
    h: u16,
    cells: Vec<Cell>,
}

impl CellBuffer {
    fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::BLANK; w as usize * h as usize],
        }
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        y as usize * self.w as usize + x as usize
    }

    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        self.cells[i] = cell;
    }

    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        if x >= self.w || y >= self.h {
            return None;
        }
        Some(self.cells[self.idx(x, y)])
    }
}

/// Owns the alternate screen. Dropping it restores the terminal.
pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    active: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            EnableFocusChange,
            Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            active: true,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        queue!(
            self.out,
            ResetColor,
            Clear(ClearType::All),
            DisableFocusChange,
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) {
        if cols == self.cols && rows == self.rows {
            return;
        }
        self.cols = cols;
        self.rows = rows;
        self.prev = CellBuffer::new(cols, rows);
        self.cur = CellBuffer::new(cols, rows);
        // Force a full repaint; the old screen contents are unknown.
        self.prev.cells.fill(Cell {
            ch: '\0',
            ..Cell::BLANK
        });
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }
                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg.to_color()))?;
                    last_bg = Some(c.bg);
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg.to_color()))?;
                    last_fg = Some(c.fg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        std::mem::swap(&mut self.prev, &mut self.cur);
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

/// Paints both layers into `buf`, scaling grid cells up to `font_size`
/// terminal cells.
pub(crate) fn paint_frame(buf: &mut CellBuffer, frame: &FieldFrame, font_size: f32) {
    if frame.is_empty() {
        return;
    }
    let fs = if font_size > 0.0 { font_size } else { 1.0 };
    let accent_on = frame.accent_visible();
    let accent_rgb = Rgb::from_hsl(frame.accent_hue, 0.85, 0.6).scale(frame.accent_opacity);

    let rows: Vec<Vec<char>> = frame.base.iter().map(|r| r.chars().collect()).collect();
    let accent: Vec<Vec<char>> = if accent_on {
        frame.accent.iter().map(|r| r.chars().collect()).collect()
    } else {
        Vec::new()
    };

    for y in 0..buf.h {
        let gy = ((y as f32 / fs) as usize).min(frame.grid.height - 1);
        for x in 0..buf.w {
            let gx = ((x as f32 / fs) as usize).min(frame.grid.width - 1);
            let accent_ch = accent
                .get(gy)
                .and_then(|row| row.get(gx))
                .copied()
                .filter(|c| *c != ' ');
            let cell = match accent_ch {
                Some(ch) => Cell {
                    ch,
                    fg: accent_rgb,
                    bg: Rgb::BLACK,
                },
                None => {
                    let v = frame.value(gx, gy).unwrap_or(0.0);
                    Cell {
                        ch: rows[gy].get(gx).copied().unwrap_or(' '),
                        fg: Rgb::grey(frame.base_opacity * (0.4 + 0.6 * v)),
                        bg: Rgb::BLACK,
                    }
                }
            };
            buf.set(x, y, cell);
        }
    }
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Rgb) {
    for (i, ch) in s.chars().enumerate() {
        let Ok(dx) = u16::try_from(i) else {
            break;
        };
        buf.set(
            x.saturating_add(dx),
            y,
            Cell {
                ch,
                fg,
                bg: Rgb::BLACK,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glyphfield::GridSize;

    #[test]
    fn hsl_primaries() {
        assert_eq!(Rgb::from_hsl(0.0, 1.0, 0.5), Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(Rgb::from_hsl(120.0, 1.0, 0.5), Rgb { r: 0, g: 255, b: 0 });
        assert_eq!(Rgb::from_hsl(240.0, 1.0, 0.5), Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(Rgb::from_hsl(360.0, 1.0, 0.5), Rgb { r: 255, g: 0, b: 0 });
    }

    fn frame() -> FieldFrame {
        FieldFrame {
            grid: GridSize::new(2, 1),
            base: vec!["ab".into()],
            accent: vec![" x".into()],
            values: vec![1.0, 0.0],
            base_opacity: 1.0,
            accent_opacity: 0.5,
            accent_hue: 240.0,
        }
    }

    #[test]
    fn accent_overrides_base_when_visible() {
        let mut buf = CellBuffer::new(2, 1);
        paint_frame(&mut buf, &frame(), 1.0);
        let a = buf.get(0, 0).unwrap();
        assert_eq!(a.ch, 'a');
        assert_eq!(a.fg, Rgb::grey(1.0));
        let b = buf.get(1, 0).unwrap();
        assert_eq!(b.ch, 'x');
        assert_eq!(b.fg, Rgb::from_hsl(240.0, 0.85, 0.6).scale(0.5));
    }

    #[test]
    fn hidden_accent_leaves_base() {
        let mut f = frame();
        f.accent_opacity = 0.0;
        let mut buf = CellBuffer::new(2, 1);
        paint_frame(&mut buf, &f, 1.0);
        assert_eq!(buf.get(1, 0).unwrap().ch, 'b');
    }

    #[test]
    fn font_size_scales_cells_up() {
        let mut buf = CellBuffer::new(4, 2);
        paint_frame(&mut buf, &frame(), 2.0);
        assert_eq!(buf.get(1, 1).unwrap().ch, 'a');
        assert_eq!(buf.get(3, 0).unwrap().ch, 'x');
    }
}
