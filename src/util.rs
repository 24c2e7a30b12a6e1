use faer::prelude::*;

/// Returns the cross product of two vectors
#[inline]
pub fn cross(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// out += alpha * m * v
///
/// # Panics
/// Panics if `out.len() < m.nrows()` or `v.len() < m.ncols()`.
#[inline]
pub fn mat_vec_accumulate(out: &mut [f64], m: &Mat<f64>, v: &[f64], alpha: f64) {
    for j in 0..m.ncols() {
        let vj = alpha * v[j];
        if vj == 0. {
            continue;
        }
        for i in 0..m.nrows() {
            out[i] += m[(i, j)] * vj;
        }
    }
}

/// Move a force/moment pair from point `from` to point `to`; the force is
/// unchanged and the moment picks up `(from - to) x F`.
pub fn transfer_loads(loads: &[f64; 6], from: &[f64; 3], to: &[f64; 3]) -> [f64; 6] {
    let r = [from[0] - to[0], from[1] - to[1], from[2] - to[2]];
    let m = cross(&r, &[loads[0], loads[1], loads[2]]);
    [
        loads[0],
        loads[1],
        loads[2],
        loads[3] + m[0],
        loads[4] + m[1],
        loads[5] + m[2],
    ]
}

/// Copy a 6-DOF array into a column vector
pub fn col6(v: &[f64; 6]) -> Col<f64> {
    Col::from_fn(6, |i| v[i])
}

/// Returns true if every entry of the matrix is finite
pub fn mat_is_finite(m: &Mat<f64>) -> bool {
    (0..m.ncols()).all(|j| (0..m.nrows()).all(|i| m[(i, j)].is_finite()))
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_mat_vec_accumulate() {
        let m = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        let mut out = [1., 1.];
        mat_vec_accumulate(&mut out, &m, &[1., 2., 3.], 2.);
        // m * v = [8, 26]
        assert_relative_eq!(out[0], 17.);
        assert_relative_eq!(out[1], 53.);
    }

    #[test]
    fn test_transfer_loads() {
        // Vertical force at the origin seen from a point offset along x
        let loads = [0., 0., 10., 0., 0., 0.];
        let moved = transfer_loads(&loads, &[0., 0., 0.], &[2., 0., 0.]);
        assert_eq!(moved[..3], [0., 0., 10.]);
        assert_relative_eq!(moved[3], 0.);
        assert_relative_eq!(moved[4], 20.);
        assert_relative_eq!(moved[5], 0.);
    }

    #[test]
    fn test_mat_is_finite() {
        let mut m = Mat::<f64>::zeros(3, 3);
        assert!(mat_is_finite(&m));
        m[(1, 2)] = f64::NAN;
        assert!(!mat_is_finite(&m));
    }
}
