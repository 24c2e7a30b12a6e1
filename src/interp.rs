use std::ops::{Add, Mul};

//------------------------------------------------------------------------------
// Piecewise-linear interpolation
//------------------------------------------------------------------------------

/// Bracketing samples and weight for linear interpolation on an ascending grid.
///
/// The interpolated value is `(1 - w) * y[i0] + w * y[i1]`. Requests outside
/// the grid are clamped to the boundary sample and flagged with `clamped`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearWeights {
    pub i0: usize,
    pub i1: usize,
    pub w: f64,
    pub clamped: bool,
}

impl LinearWeights {
    #[inline]
    pub fn apply(&self, ys: &[f64]) -> f64 {
        (1. - self.w) * ys[self.i0] + self.w * ys[self.i1]
    }
}

/// Calculate linear interpolation weights of `x` on the ascending grid `xs`.
///
/// # Panics
/// Panics if `xs` is empty.
pub fn linear_weights(xs: &[f64], x: f64) -> LinearWeights {
    let n = xs.len();
    assert!(n > 0, "interpolation grid is empty");

    if !(x > xs[0]) || n == 1 {
        return LinearWeights {
            i0: 0,
            i1: 0,
            w: 0.,
            clamped: x < xs[0] || (n == 1 && x != xs[0]),
        };
    }
    if x >= xs[n - 1] {
        return LinearWeights {
            i0: n - 1,
            i1: n - 1,
            w: 0.,
            clamped: x > xs[n - 1],
        };
    }

    // First grid point strictly greater than x
    let i1 = xs.partition_point(|&v| v <= x);
    let i0 = i1 - 1;
    LinearWeights {
        i0,
        i1,
        w: (x - xs[i0]) / (xs[i1] - xs[i0]),
        clamped: false,
    }
}

/// Weights for bilinear interpolation on the tensor grid `xs` x `ys`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BilinearWeights {
    pub x: LinearWeights,
    pub y: LinearWeights,
}

impl BilinearWeights {
    /// Blend the corner values `f(i, j)`
    pub fn apply<T>(&self, f: impl Fn(usize, usize) -> T) -> T
    where
        T: Mul<f64, Output = T> + Add<Output = T>,
    {
        let (x, y) = (&self.x, &self.y);
        f(x.i0, y.i0) * ((1. - x.w) * (1. - y.w))
            + f(x.i1, y.i0) * (x.w * (1. - y.w))
            + f(x.i0, y.i1) * ((1. - x.w) * y.w)
            + f(x.i1, y.i1) * (x.w * y.w)
    }

    pub fn clamped(&self) -> bool {
        self.x.clamped || self.y.clamped
    }
}

pub fn bilinear_weights(xs: &[f64], x: f64, ys: &[f64], y: f64) -> BilinearWeights {
    BilinearWeights {
        x: linear_weights(xs, x),
        y: linear_weights(ys, y),
    }
}

//------------------------------------------------------------------------------
// Headings
//------------------------------------------------------------------------------

/// Wrap an angle in degrees into [0, 360)
pub fn wrap_heading(heading: f64) -> f64 {
    let h = heading.rem_euclid(360.);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360. {
        0.
    } else {
        h
    }
}

/// Shortest angular distance between two headings in degrees
pub fn heading_distance(a: f64, b: f64) -> f64 {
    let d = wrap_heading(a - b);
    d.min(360. - d)
}
