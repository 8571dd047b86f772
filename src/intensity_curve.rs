//! User-adjustable intensity curves mapping normalized input to normalized output.

/// A mapping of normalized intensity `[0, 1]` to normalized display intensity `[0, 1]`.
pub trait IntensityMap {
    fn evaluate(&self, t: f32) -> f32;
}

impl<F> IntensityMap for F
where
    F: Fn(f32) -> f32,
{
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub t: f32,
    pub x: f32,
}

/// Samples per control-point interval used by [`IntensityCurve::is_monotonic`].
const MONOTONIC_SAMPLES: usize = 8;

/// A Kochanek-Bartels spline through ordered control points.
///
/// The curve uses zero tension and bias and a continuity of -1, so a curve
/// whose control points lie on a line reproduces that line exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityCurve {
    points: Vec<ControlPoint>,
    tension: f32,
    bias: f32,
    continuity: f32,
}

impl Default for IntensityCurve {
    fn default() -> Self {
        Self::new(4)
    }
}

impl IntensityCurve {
    /// A curve of `n` control points evenly spaced on the identity line.
    pub fn new(n: usize) -> Self {
        let mut curve = Self {
            points: Vec::new(),
            tension: 0.0,
            bias: 0.0,
            continuity: -1.0,
        };
        curve.initialize(n);
        curve
    }

    /// Reset to `n` control points evenly spaced on the identity line.
    ///
    /// # Panics
    ///
    /// Panics if `n < 2`.
    pub fn initialize(&mut self, n: usize) {
        assert!(n >= 2, "an intensity curve needs at least two control points");
        let interval = 1.0 / (n - 1) as f32;
        self.points = (0..n)
            .map(|i| {
                let t = i as f32 * interval;
                ControlPoint { t, x: t }
            })
            .collect();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn control_point(&self, index: usize) -> ControlPoint {
        self.points[index]
    }

    /// Move control point `index` to `(t, x)`.
    ///
    /// Returns `false` and leaves the curve unchanged if the move would put the
    /// point at or beyond one of its neighbours along `t`.
    pub fn update_control_point(&mut self, index: usize, t: f32, x: f32) -> bool {
        let after_previous = index == 0 || self.points[index - 1].t < t;
        let before_next = index + 1 >= self.points.len() || t < self.points[index + 1].t;
        if !(after_previous && before_next) {
            return false;
        }
        self.points[index] = ControlPoint { t, x };
        true
    }

    /// Remap the `t` coordinates affinely so that they span `[t_min, t_max]`.
    ///
    /// # Panics
    ///
    /// Panics unless `t_min < t_max`.
    pub fn scale_control_points_to_window(&mut self, t_min: f32, t_max: f32) {
        assert!(t_min < t_max, "window [{t_min}, {t_max}] is empty");
        let first = self.points[0].t;
        let last = self.points[self.points.len() - 1].t;
        let scale = (t_max - t_min) / (last - first);
        let offset = t_min - scale * first;
        for point in &mut self.points {
            point.t = point.t * scale + offset;
        }
    }

    /// Whether the curve is strictly increasing, checked by sampling each interval.
    pub fn is_monotonic(&self) -> bool {
        self.points.windows(2).all(|pair| {
            let step = (pair[1].t - pair[0].t) / (MONOTONIC_SAMPLES - 1) as f32;
            (0..MONOTONIC_SAMPLES - 1).all(|j| {
                let t0 = pair[0].t + j as f32 * step;
                self.evaluate_spline(t0) < self.evaluate_spline(t0 + step)
            })
        })
    }

    fn evaluate_spline(&self, t: f32) -> f32 {
        let n = self.points.len();
        let first = self.points[0];
        let last = self.points[n - 1];
        if t <= first.t {
            return first.x;
        }
        if t >= last.t {
            return last.x;
        }

        let segment = self
            .points
            .windows(2)
            .position(|pair| t <= pair[1].t)
            .unwrap_or(n - 2);
        let p0 = self.points[segment];
        let p1 = self.points[segment + 1];
        let width = p1.t - p0.t;
        if width <= 0.0 {
            return p0.x;
        }

        let u = (t - p0.t) / width;
        let u2 = u * u;
        let u3 = u2 * u;
        let h00 = 2.0 * u3 - 3.0 * u2 + 1.0;
        let h10 = u3 - 2.0 * u2 + u;
        let h01 = -2.0 * u3 + 3.0 * u2;
        let h11 = u3 - u2;

        h00 * p0.x
            + h10 * self.outgoing_tangent(segment)
            + h01 * p1.x
            + h11 * self.incoming_tangent(segment + 1)
    }

    // Tangent leaving point `i`, in units of the parameter of segment `i`.
    fn outgoing_tangent(&self, i: usize) -> f32 {
        let p = &self.points;
        if i == 0 {
            return p[1].x - p[0].x;
        }
        let (a, b) = self.kochanek_weights(1.0 - self.continuity, 1.0 + self.continuity);
        let n0 = p[i].t - p[i - 1].t;
        let n1 = p[i + 1].t - p[i].t;
        let tangent = a * (p[i].x - p[i - 1].x) + b * (p[i + 1].x - p[i].x);
        tangent * 2.0 * n1 / (n0 + n1)
    }

    // Tangent arriving at point `i`, in units of the parameter of segment `i - 1`.
    fn incoming_tangent(&self, i: usize) -> f32 {
        let p = &self.points;
        if i + 1 == p.len() {
            return p[i].x - p[i - 1].x;
        }
        let (a, b) = self.kochanek_weights(1.0 + self.continuity, 1.0 - self.continuity);
        let n0 = p[i].t - p[i - 1].t;
        let n1 = p[i + 1].t - p[i].t;
        let tangent = a * (p[i].x - p[i - 1].x) + b * (p[i + 1].x - p[i].x);
        tangent * 2.0 * n0 / (n0 + n1)
    }

    fn kochanek_weights(&self, c_prev: f32, c_next: f32) -> (f32, f32) {
        let t = 1.0 - self.tension;
        (
            0.5 * t * (1.0 + self.bias) * c_prev,
            0.5 * t * (1.0 - self.bias) * c_next,
        )
    }
}

impl IntensityMap for IntensityCurve {
    fn evaluate(&self, t: f32) -> f32 {
        self.evaluate_spline(t)
    }
}
