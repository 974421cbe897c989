//! Generative glyph field: wave background, pointer blob physics and decaying
//! particle effects rendered into two layers of text.

pub mod config;
pub mod engine;
pub mod field;
pub mod macros;
pub mod math;
pub mod palette;
pub mod params;
pub mod surface;

pub use engine::{Engine, GridSize, PointerPhase, Snapshot};
pub use field::{FieldFrame, FieldRenderer};
pub use macros::{Macro, MacroState};
pub use palette::Palette;
pub use params::{ParamKey, ParamOverrides, ParameterSet};
pub use surface::Surface;
