//! Named glyph sets.
//!
//! `blocks` runs low→high→low density so that saturated cells fold back into
//! sparse glyphs; `puddle` is a plain monotonic ramp.

#[derive(Debug, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub blocks: &'static [char],
    pub puddle: &'static [char],
    pub sparkle: &'static [char],
    pub scatter: &'static [char],
}

pub const PALETTES: &[Palette] = &[
    Palette {
        name: "blocks",
        blocks: &[
            ' ', '·', '░', '░', '▒', '▒', '▓', '▓', '█', '▓', '▓', '▒', '▒', '░', '░', '·',
        ],
        puddle: &[' ', '.', '·', ':', '░', '▒', '▒', '▓', '▓', '█'],
        sparkle: &['+', '*', '✦', '✧', '·'],
        scatter: &['·', '*', '+', '×', '•', '°'],
    },
    Palette {
        name: "ascii",
        blocks: &[
            ' ', '.', ',', ':', ';', 'i', 'l', 'I', '#', 'I', 'l', 'i', ';', ':', ',', '.',
        ],
        puddle: &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'],
        sparkle: &['+', '*', 'x', '\'', '.'],
        scatter: &['.', '*', '+', 'o', 'x', '\''],
    },
    Palette {
        name: "braille",
        blocks: &[
            '⠀', '⠁', '⠃', '⠇', '⡇', '⡏', '⡟', '⡿', '⣿', '⡿', '⡟', '⡏', '⡇', '⠇', '⠃', '⠁',
        ],
        puddle: &['⠀', '⠂', '⠆', '⠖', '⠶', '⡶', '⣶', '⣷', '⣿', '⣿'],
        sparkle: &['⠁', '⠂', '⠄', '⡀', '⠈'],
        scatter: &['⠁', '⠐', '⠠', '⢀', '⠈', '⡀'],
    },
    Palette {
        name: "binary",
        blocks: &[
            ' ', ' ', '.', '0', '0', '1', '0', '1', '1', '1', '0', '1', '0', '0', '.', ' ',
        ],
        puddle: &[' ', '.', '.', '0', '0', '1', '0', '1', '1', '1'],
        sparkle: &['1', '0', '/', '\\', '|'],
        scatter: &['0', '1', '0', '1', '.', '\''],
    },
];

pub const DEFAULT_PALETTE: &str = "blocks";

impl Palette {
    /// Looks a palette up by name, falling back to the default one.
    pub fn by_name(name: &str) -> &'static Palette {
        let name = name.trim();
        match PALETTES.iter().find(|p| p.name.eq_ignore_ascii_case(name)) {
            Some(p) => p,
            None => {
                log::warn!("unknown palette {name:?}, using {DEFAULT_PALETTE}");
                Self::default_palette()
            }
        }
    }

    pub fn default_palette() -> &'static Palette {
        &PALETTES[0]
    }

    /// The palette after `self` in [`PALETTES`], wrapping around.
    pub fn next(&self) -> &'static Palette {
        let i = PALETTES.iter().position(|p| p.name == self.name).unwrap_or(0);
        &PALETTES[(i + 1) % PALETTES.len()]
    }

    pub fn block(&self, value: f32) -> char {
        ramp_glyph(self.blocks, value)
    }

    pub fn puddle_glyph(&self, value: f32) -> char {
        ramp_glyph(self.puddle, value)
    }

    pub fn sparkle_glyph(&self, index: usize) -> char {
        pick(self.sparkle, index)
    }

    pub fn scatter_glyph(&self, index: usize) -> char {
        pick(self.scatter, index)
    }
}

/// Maps `value` in `[0, 1]` onto `[0, len - 1]` with `floor(value * (len - 1))`.
/// Out-of-range and NaN values clamp; an empty ramp yields 0.
pub fn glyph_index(value: f32, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let v = crate::math::clamp01(value);
    let i = (v * (len - 1) as f32).floor() as usize;
    i.min(len - 1)
}

fn ramp_glyph(ramp: &[char], value: f32) -> char {
    ramp.get(glyph_index(value, ramp.len()))
        .copied()
        .unwrap_or(' ')
}

fn pick(set: &[char], index: usize) -> char {
    if set.is_empty() {
        ' '
    } else {
        set[index % set.len()]
    }
}
