//! Tunable parameters for the field engine.
//!
//! Every value is an `f32` with a default and an inclusive valid range. Radii
//! marked "diag" are fractions of the grid diagonal; rates are per 100 ms of
//! simulated time. Count-typed parameters are stored as floats and rounded
//! where they are used.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    Real,
    Count,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub default: f32,
    pub min: f32,
    pub max: f32,
    pub kind: ParamKind,
}

impl ParamSpec {
    /// Clamps into range and rounds counts. Non-finite input yields `None`.
    pub fn sanitize(&self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let v = value.clamp(self.min, self.max);
        Some(match self.kind {
            ParamKind::Real => v,
            ParamKind::Count => v.round(),
        })
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

macro_rules! parameter_table {
    ($( $field:ident, $variant:ident: $kind:ident = $default:expr, $min:expr => $max:expr; )*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct ParameterSet {
            $( pub $field: f32, )*
        }

        impl Default for ParameterSet {
            fn default() -> Self {
                Self { $( $field: $default, )* }
            }
        }

        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum ParamKey {
            $( $variant, )*
        }

        impl ParamKey {
            pub const ALL: &'static [ParamKey] = &[ $( ParamKey::$variant, )* ];

            pub fn name(self) -> &'static str {
                match self {
                    $( ParamKey::$variant => stringify!($field), )*
                }
            }

            pub fn spec(self) -> ParamSpec {
                match self {
                    $( ParamKey::$variant => ParamSpec {
                        default: $default,
                        min: $min,
                        max: $max,
                        kind: ParamKind::$kind,
                    }, )*
                }
            }
        }

        impl ParameterSet {
            pub fn get(&self, key: ParamKey) -> f32 {
                match key {
                    $( ParamKey::$variant => self.$field, )*
                }
            }

            pub fn set(&mut self, key: ParamKey, value: f32) {
                match key {
                    $( ParamKey::$variant => self.$field = value, )*
                }
            }
        }
    };
}

parameter_table! {
    // blob (radii: diag)
    blob_radius_hover, BlobRadiusHover: Real = 0.07, 0.0 => 0.3;
    blob_radius_press, BlobRadiusPress: Real = 0.11, 0.0 => 0.4;
    blob_intensity_hover, BlobIntensityHover: Real = 0.45, 0.0 => 1.0;
    blob_intensity_press, BlobIntensityPress: Real = 0.85, 0.0 => 1.0;
    blob_radius_lerp, BlobRadiusLerp: Real = 0.3, 0.01 => 1.0;
    blob_intensity_lerp, BlobIntensityLerp: Real = 0.25, 0.01 => 1.0;
    blob_fade_lerp, BlobFadeLerp: Real = 0.18, 0.01 => 1.0;
    fade_radius_epsilon, FadeRadiusEpsilon: Real = 0.5, 0.01 => 5.0;
    fade_intensity_epsilon, FadeIntensityEpsilon: Real = 0.02, 0.0 => 0.5;

    // pointer physics
    friction, Friction: Real = 0.9, 0.5 => 0.999;
    min_velocity, MinVelocity: Real = 0.15, 0.001 => 2.0;
    pointer_smoothing, PointerSmoothing: Real = 0.45, 0.01 => 1.0;

    // puddle (radii: diag, frames: 100 ms units)
    puddle_start_radius, PuddleStartRadius: Real = 0.02, 0.0 => 0.2;
    puddle_max_radius, PuddleMaxRadius: Real = 0.16, 0.01 => 0.5;
    puddle_grow_frames, PuddleGrowFrames: Count = 30.0, 1.0 => 300.0;

    // layer opacity
    base_opacity, BaseOpacity: Real = 0.6, 0.0 => 1.0;
    pulse_amount, PulseAmount: Real = 0.12, 0.0 => 0.5;
    accent_max_opacity, AccentMaxOpacity: Real = 0.85, 0.0 => 1.0;
    accent_press_lerp, AccentPressLerp: Real = 0.3, 0.01 => 1.0;
    accent_release_lerp, AccentReleaseLerp: Real = 0.12, 0.01 => 1.0;
    accent_epsilon, AccentEpsilon: Real = 0.01, 0.0 => 0.2;

    // scatter burst
    scatter_count, ScatterCount: Count = 12.0, 0.0 => 64.0;
    scatter_speed, ScatterSpeed: Real = 1.6, 0.0 => 6.0;
    scatter_friction, ScatterFriction: Real = 0.86, 0.5 => 1.0;
    scatter_decay, ScatterDecay: Real = 0.07, 0.005 => 0.5;
    scatter_velocity_inherit, ScatterVelocityInherit: Real = 0.35, 0.0 => 2.0;
    scatter_value_boost, ScatterValueBoost: Real = 0.5, 0.0 => 1.0;

    // trail
    trail_spawn_distance, TrailSpawnDistance: Real = 1.5, 0.25 => 10.0;
    trail_max_length, TrailMaxLength: Count = 40.0, 1.0 => 200.0;
    trail_decay_press, TrailDecayPress: Real = 0.025, 0.0 => 0.5;
    trail_decay_exp, TrailDecayExp: Real = 0.82, 0.3 => 1.0;
    trail_decay_linear, TrailDecayLinear: Real = 0.012, 0.0 => 0.2;
    trail_intensity, TrailIntensity: Real = 0.7, 0.0 => 2.0;

    // afterglow
    afterglow_decay, AfterglowDecay: Real = 0.045, 0.005 => 0.5;
    afterglow_intensity, AfterglowIntensity: Real = 0.6, 0.0 => 1.5;
    afterglow_expand, AfterglowExpand: Real = 0.6, 0.0 => 3.0;
    afterglow_morph_amp_a, AfterglowMorphAmpA: Real = 0.16, 0.0 => 0.6;
    afterglow_morph_amp_b, AfterglowMorphAmpB: Real = 0.08, 0.0 => 0.6;
    afterglow_morph_lobes_a, AfterglowMorphLobesA: Count = 3.0, 1.0 => 12.0;
    afterglow_morph_lobes_b, AfterglowMorphLobesB: Count = 5.0, 1.0 => 12.0;
    afterglow_morph_speed, AfterglowMorphSpeed: Real = 0.9, 0.0 => 5.0;

    // sparkles
    sparkle_spawn_chance, SparkleSpawnChance: Real = 0.3, 0.0 => 1.0;
    sparkle_max_count, SparkleMaxCount: Count = 24.0, 0.0 => 200.0;
    sparkle_decay_rate, SparkleDecayRate: Real = 0.08, 0.005 => 0.5;
    sparkle_threshold, SparkleThreshold: Real = 0.2, 0.0 => 1.0;

    // influence radii (diag)
    trail_radius, TrailRadius: Real = 0.045, 0.005 => 0.3;
    afterglow_radius, AfterglowRadius: Real = 0.1, 0.01 => 0.5;

    // waves
    wave1_freq, Wave1Freq: Real = 3.2, 0.0 => 20.0;
    wave1_cross, Wave1Cross: Real = 1.8, -20.0 => 20.0;
    wave1_weight, Wave1Weight: Real = 0.5, 0.0 => 1.0;
    wave1_speed, Wave1Speed: Real = 0.09, 0.0 => 1.0;
    wave2_freq, Wave2Freq: Real = 5.5, 0.0 => 20.0;
    wave2_cross, Wave2Cross: Real = -3.1, -20.0 => 20.0;
    wave2_weight, Wave2Weight: Real = 0.3, 0.0 => 1.0;
    wave2_speed, Wave2Speed: Real = 0.06, 0.0 => 1.0;
    wave3_freq, Wave3Freq: Real = 9.0, 0.0 => 20.0;
    wave3_cross, Wave3Cross: Real = 4.4, -20.0 => 20.0;
    wave3_weight, Wave3Weight: Real = 0.2, 0.0 => 1.0;
    wave3_speed, Wave3Speed: Real = 0.14, 0.0 => 1.0;

    // background
    center_falloff, CenterFalloff: Real = 0.9, 0.0 => 3.0;
    accent_hue, AccentHue: Real = 212.0, 0.0 => 360.0;
    font_size, FontSize: Real = 1.0, 0.5 => 4.0;

    // ambient pulse (rad/s)
    pulse_freq_a, PulseFreqA: Real = 0.7, 0.0 => 10.0;
    pulse_freq_b, PulseFreqB: Real = 1.3, 0.0 => 10.0;
    pulse_freq_c, PulseFreqC: Real = 2.9, 0.0 => 10.0;
    pulse_weight_a, PulseWeightA: Real = 0.5, 0.0 => 1.0;
    pulse_weight_b, PulseWeightB: Real = 0.3, 0.0 => 1.0;
    pulse_weight_c, PulseWeightC: Real = 0.2, 0.0 => 1.0;

    master_speed, MasterSpeed: Real = 1.0, 0.0 => 4.0;
}

impl ParamKey {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl ParameterSet {
    /// Copy of `self` with every override applied.
    pub fn with_overrides(&self, overrides: &ParamOverrides) -> Self {
        let mut out = *self;
        for (key, value) in overrides.iter() {
            out.set(key, value);
        }
        out
    }
}

/// Partial parameter set. Values are sanitized on insert, so anything stored
/// here is finite and inside its parameter's range.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamOverrides {
    values: BTreeMap<ParamKey, f32>,
}

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the value was rejected (non-finite).
    pub fn insert(&mut self, key: ParamKey, value: f32) -> bool {
        match key.spec().sanitize(value) {
            Some(v) => {
                self.values.insert(key, v);
                true
            }
            None => {
                log::warn!("ignoring non-finite override for {}", key.name());
                false
            }
        }
    }

    /// Inserts by parameter name; unknown names are skipped.
    pub fn insert_named(&mut self, name: &str, value: f32) -> bool {
        match ParamKey::from_name(name) {
            Some(key) => self.insert(key, value),
            None => {
                log::warn!("ignoring unknown parameter {name:?}");
                false
            }
        }
    }

    pub fn get(&self, key: ParamKey) -> Option<f32> {
        self.values.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamKey, f32)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Layers `other` on top of `self`.
    pub fn merge(&mut self, other: &ParamOverrides) {
        for (k, v) in other.iter() {
            self.values.insert(k, v);
        }
    }
}

impl FromIterator<(ParamKey, f32)> for ParamOverrides {
    fn from_iter<I: IntoIterator<Item = (ParamKey, f32)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

impl Serialize for ParamOverrides {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k.name(), v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OverridesVisitor;

        impl<'de> Visitor<'de> for OverridesVisitor {
            type Value = ParamOverrides;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of parameter names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out = ParamOverrides::new();
                while let Some((name, value)) = access.next_entry::<String, f32>()? {
                    out.insert_named(&name, value);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(OverridesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_inside_their_ranges() {
        let p = ParameterSet::default();
        for &key in ParamKey::ALL {
            let spec = key.spec();
            assert_eq!(p.get(key), spec.default, "{}", key.name());
            assert!(spec.min <= spec.max, "{}", key.name());
            assert!(spec.contains(spec.default), "{}", key.name());
            if spec.kind == ParamKind::Count {
                assert_eq!(spec.default.fract(), 0.0, "{}", key.name());
            }
        }
    }

    #[test]
    fn names_round_trip_through_keys() {
        for &key in ParamKey::ALL {
            assert_eq!(ParamKey::from_name(key.name()), Some(key));
        }
        assert_eq!(ParamKey::from_name("no_such_param"), None);
    }

    #[test]
    fn set_then_get_touches_only_one_field() {
        let mut p = ParameterSet::default();
        p.set(ParamKey::Friction, 0.75);
        assert_eq!(p.friction, 0.75);
        assert_eq!(p.min_velocity, ParameterSet::default().min_velocity);
    }

    #[test]
    fn default_set_survives_json_bit_for_bit() {
        let p = ParameterSet::default();
        let json = serde_json::to_string(&p).unwrap();
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        for &key in ParamKey::ALL {
            assert_eq!(p.get(key).to_bits(), back.get(key).to_bits(), "{}", key.name());
        }
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let back: ParameterSet = serde_json::from_str(r#"{"friction": 0.8}"#).unwrap();
        assert_eq!(back.friction, 0.8);
        assert_eq!(back.trail_max_length, 40.0);
    }

    #[test]
    fn overrides_clamp_and_round() {
        let mut o = ParamOverrides::new();
        assert!(o.insert(ParamKey::Friction, 5.0));
        assert!(o.insert(ParamKey::TrailMaxLength, 7.4));
        assert!(!o.insert(ParamKey::BaseOpacity, f32::NAN));
        assert_eq!(o.get(ParamKey::Friction), Some(0.999));
        assert_eq!(o.get(ParamKey::TrailMaxLength), Some(7.0));
        assert_eq!(o.get(ParamKey::BaseOpacity), None);

        let p = ParameterSet::default().with_overrides(&o);
        assert_eq!(p.friction, 0.999);
        assert_eq!(p.trail_max_length, 7.0);
        assert_eq!(p.base_opacity, 0.6);
    }

    #[test]
    fn overrides_json_skips_unknown_names() {
        let o: ParamOverrides =
            serde_json::from_str(r#"{"trail_max_length": 5, "sparkle_power": 3}"#).unwrap();
        assert_eq!(o.len(), 1);
        assert_eq!(o.get(ParamKey::TrailMaxLength), Some(5.0));

        let json = serde_json::to_string(&o).unwrap();
        assert_eq!(json, r#"{"trail_max_length":5.0}"#);
    }

    #[test]
    fn merge_prefers_the_later_layer() {
        let mut a: ParamOverrides = [(ParamKey::Friction, 0.6), (ParamKey::MasterSpeed, 2.0)]
            .into_iter()
            .collect();
        let b: ParamOverrides = [(ParamKey::Friction, 0.7)].into_iter().collect();
        a.merge(&b);
        assert_eq!(a.get(ParamKey::Friction), Some(0.7));
        assert_eq!(a.get(ParamKey::MasterSpeed), Some(2.0));
    }
}
