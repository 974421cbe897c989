//! Eight perceptual sliders over the raw parameter set.
//!
//! Each macro owns a handful of parameters and drives them linearly between a
//! `low` and `high` endpoint. Endpoints are centred on the parameter default,
//! so a macro at 0.5 reproduces the defaults it governs.

use crate::math::lerp;
use crate::params::{ParamKey, ParamKind, ParamOverrides};
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Macro {
    Dither,
    Motion,
    Glow,
    Trail,
    Burst,
    Pulse,
    Ghost,
    Noise,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Endpoint {
    pub key: ParamKey,
    pub low: f32,
    pub high: f32,
}

const fn ep(key: ParamKey, low: f32, high: f32) -> Endpoint {
    Endpoint { key, low, high }
}

const DITHER: &[Endpoint] = &[
    ep(ParamKey::Wave1Freq, 1.6, 4.8),
    ep(ParamKey::Wave2Freq, 2.5, 8.5),
    ep(ParamKey::Wave3Freq, 4.0, 14.0),
    ep(ParamKey::Wave3Weight, 0.0, 0.4),
    ep(ParamKey::CenterFalloff, 1.5, 0.3),
];

const MOTION: &[Endpoint] = &[
    ep(ParamKey::MasterSpeed, 0.25, 1.75),
    ep(ParamKey::Wave1Speed, 0.03, 0.15),
    ep(ParamKey::Wave2Speed, 0.02, 0.10),
    ep(ParamKey::Wave3Speed, 0.04, 0.24),
    ep(ParamKey::PointerSmoothing, 0.2, 0.7),
    ep(ParamKey::Friction, 0.84, 0.96),
];

const GLOW: &[Endpoint] = &[
    ep(ParamKey::BlobIntensityHover, 0.2, 0.7),
    ep(ParamKey::BlobIntensityPress, 0.7, 1.0),
    ep(ParamKey::BlobRadiusHover, 0.04, 0.10),
    ep(ParamKey::BlobRadiusPress, 0.06, 0.16),
    ep(ParamKey::BaseOpacity, 0.35, 0.85),
];

const TRAIL: &[Endpoint] = &[
    ep(ParamKey::TrailMaxLength, 10.0, 70.0),
    ep(ParamKey::TrailSpawnDistance, 2.5, 0.5),
    ep(ParamKey::TrailDecayPress, 0.045, 0.005),
    ep(ParamKey::TrailDecayExp, 0.7, 0.94),
    ep(ParamKey::TrailIntensity, 0.3, 1.1),
    ep(ParamKey::TrailRadius, 0.025, 0.065),
];

const BURST: &[Endpoint] = &[
    ep(ParamKey::ScatterCount, 4.0, 20.0),
    ep(ParamKey::ScatterSpeed, 0.6, 2.6),
    ep(ParamKey::ScatterVelocityInherit, 0.1, 0.6),
    ep(ParamKey::ScatterDecay, 0.12, 0.02),
    ep(ParamKey::ScatterValueBoost, 0.2, 0.8),
    ep(ParamKey::ScatterFriction, 0.78, 0.94),
];

const PULSE: &[Endpoint] = &[
    ep(ParamKey::PulseAmount, 0.0, 0.24),
    ep(ParamKey::PulseFreqA, 0.3, 1.1),
    ep(ParamKey::PulseFreqB, 0.5, 2.1),
    ep(ParamKey::AccentMaxOpacity, 0.7, 1.0),
    ep(ParamKey::PuddleMaxRadius, 0.08, 0.24),
    ep(ParamKey::PuddleGrowFrames, 50.0, 10.0),
];

const GHOST: &[Endpoint] = &[
    ep(ParamKey::AfterglowDecay, 0.08, 0.01),
    ep(ParamKey::AfterglowIntensity, 0.3, 0.9),
    ep(ParamKey::AfterglowRadius, 0.05, 0.15),
    ep(ParamKey::AfterglowMorphAmpA, 0.04, 0.28),
    ep(ParamKey::AfterglowMorphAmpB, 0.0, 0.16),
    ep(ParamKey::AfterglowExpand, 0.2, 1.0),
];

const NOISE: &[Endpoint] = &[
    ep(ParamKey::SparkleSpawnChance, 0.05, 0.55),
    ep(ParamKey::SparkleMaxCount, 8.0, 40.0),
    ep(ParamKey::SparkleDecayRate, 0.14, 0.02),
    ep(ParamKey::SparkleThreshold, 0.35, 0.05),
    ep(ParamKey::Wave2Weight, 0.1, 0.5),
];

impl Macro {
    /// Canonical application order. When two macros govern the same key the
    /// later one wins.
    pub const ALL: [Macro; 8] = [
        Macro::Dither,
        Macro::Motion,
        Macro::Glow,
        Macro::Trail,
        Macro::Burst,
        Macro::Pulse,
        Macro::Ghost,
        Macro::Noise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Macro::Dither => "DITHER",
            Macro::Motion => "MOTION",
            Macro::Glow => "GLOW",
            Macro::Trail => "TRAIL",
            Macro::Burst => "BURST",
            Macro::Pulse => "PULSE",
            Macro::Ghost => "GHOST",
            Macro::Noise => "NOISE",
        }
    }

    pub fn from_name(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name().eq_ignore_ascii_case(raw))
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn endpoints(self) -> &'static [Endpoint] {
        match self {
            Macro::Dither => DITHER,
            Macro::Motion => MOTION,
            Macro::Glow => GLOW,
            Macro::Trail => TRAIL,
            Macro::Burst => BURST,
            Macro::Pulse => PULSE,
            Macro::Ghost => GHOST,
            Macro::Noise => NOISE,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MacroState {
    values: [f32; 8],
}

impl Default for MacroState {
    fn default() -> Self {
        Self { values: [0.5; 8] }
    }
}

impl MacroState {
    pub fn get(&self, m: Macro) -> f32 {
        self.values[m.index()]
    }

    pub fn set(&mut self, m: Macro, value: f32) {
        self.values[m.index()] = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.5
        };
    }

    pub fn nudge(&mut self, m: Macro, delta: f32) {
        let v = self.get(m) + delta;
        self.set(m, v);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Macro, f32)> + '_ {
        Macro::ALL.iter().map(move |&m| (m, self.get(m)))
    }
}

/// Expands the macro sliders into parameter overrides.
pub fn compute(state: &MacroState) -> ParamOverrides {
    let mut out = ParamOverrides::new();
    for (m, t) in state.iter() {
        for e in m.endpoints() {
            let mut v = lerp(e.low, e.high, t);
            if e.key.spec().kind == ParamKind::Count {
                v = v.round();
            }
            out.insert(e.key, v);
        }
    }
    out
}

pub fn randomize<R: Rng + ?Sized>(rng: &mut R) -> MacroState {
    let mut s = MacroState::default();
    for m in Macro::ALL {
        s.set(m, rng.gen_range(0.0..=1.0));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParameterSet;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::BTreeSet;

    #[test]
    fn centre_reproduces_defaults() {
        let o = compute(&MacroState::default());
        let defaults = ParameterSet::default();
        for m in Macro::ALL {
            for e in m.endpoints() {
                let got = o.get(e.key).unwrap();
                let want = defaults.get(e.key);
                assert!(
                    (got - want).abs() < 1e-5,
                    "{} {}: {got} != {want}",
                    m.name(),
                    e.key.name()
                );
            }
        }
    }

    #[test]
    fn endpoints_stay_inside_parameter_ranges() {
        for m in Macro::ALL {
            for e in m.endpoints() {
                let spec = e.key.spec();
                assert!(spec.contains(e.low), "{} low", e.key.name());
                assert!(spec.contains(e.high), "{} high", e.key.name());
            }
        }
    }

    #[test]
    fn macro_key_sets_are_disjoint() {
        let mut seen = BTreeSet::new();
        for m in Macro::ALL {
            for e in m.endpoints() {
                assert!(seen.insert(e.key), "{} owned twice", e.key.name());
            }
        }
    }

    #[test]
    fn randomized_macros_stay_between_endpoints() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let state = randomize(&mut rng);
            for (_, v) in state.iter() {
                assert!((0.0..=1.0).contains(&v));
            }
            let o = compute(&state);
            for m in Macro::ALL {
                for e in m.endpoints() {
                    let v = o.get(e.key).unwrap();
                    let (lo, hi) = if e.low <= e.high {
                        (e.low, e.high)
                    } else {
                        (e.high, e.low)
                    };
                    assert!(v >= lo - 1e-5 && v <= hi + 1e-5, "{} = {v}", e.key.name());
                }
            }
        }
    }

    #[test]
    fn count_parameters_come_out_whole() {
        let mut s = MacroState::default();
        s.set(Macro::Trail, 0.33);
        s.set(Macro::Burst, 0.71);
        let o = compute(&s);
        assert_eq!(o.get(ParamKey::TrailMaxLength).unwrap().fract(), 0.0);
        assert_eq!(o.get(ParamKey::ScatterCount).unwrap().fract(), 0.0);
    }

    #[test]
    fn extremes_hit_endpoints() {
        let mut s = MacroState::default();
        s.set(Macro::Motion, 0.0);
        s.set(Macro::Ghost, 1.0);
        let o = compute(&s);
        assert!((o.get(ParamKey::MasterSpeed).unwrap() - 0.25).abs() < 1e-6);
        assert!((o.get(ParamKey::AfterglowDecay).unwrap() - 0.01).abs() < 1e-6);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(Macro::from_name("glow"), Some(Macro::Glow));
        assert_eq!(Macro::from_name(" NOISE "), Some(Macro::Noise));
        assert_eq!(Macro::from_name("wobble"), None);
    }

    #[test]
    fn set_clamps_and_nudge_saturates() {
        let mut s = MacroState::default();
        s.set(Macro::Pulse, 3.0);
        assert_eq!(s.get(Macro::Pulse), 1.0);
        s.nudge(Macro::Pulse, -2.0);
        assert_eq!(s.get(Macro::Pulse), 0.0);
        s.set(Macro::Pulse, f32::NAN);
        assert_eq!(s.get(Macro::Pulse), 0.5);
    }
}
