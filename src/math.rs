#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub fn add(self, o: Vec2) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
    pub fn sub(self, o: Vec2) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
    pub fn mul(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    pub fn len2(self) -> f32 {
        self.x * self.x + self.y * self.y
    }
    pub fn len(self) -> f32 {
        self.len2().sqrt()
    }
    pub fn dist(self, o: Vec2) -> f32 {
        self.sub(o).len()
    }
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[inline]
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Fraction of the remaining distance covered after `dt_norm` steps of an
/// exponential approach with per-step `rate`.
///
/// `current += (target - current) * ease_factor(rate, dt_norm)` gives the same
/// trajectory whether it is applied once for `dt_norm = 1` or ten times for
/// `dt_norm = 0.1`.
#[inline]
pub fn ease_factor(rate: f32, dt_norm: f32) -> f32 {
    let keep = 1.0 - clamp01(rate);
    1.0 - keep.powf(dt_norm.max(0.0))
}

#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt_norm: f32) -> f32 {
    current + (target - current) * ease_factor(rate, dt_norm)
}

/// Quadratic ease-out on `[0, 1]`.
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = clamp01(t);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Rounds a count-typed parameter; negative or non-finite values count as zero.
#[inline]
pub fn as_count(v: f32) -> usize {
    if v.is_finite() && v > 0.0 {
        v.round() as usize
    } else {
        0
    }
}
