#[derive(Debug, Clone)]
pub struct Quadrature {
    pub points: Vec<f64>,
    pub weights: Vec<f64>,
}

impl Quadrature {
    /// Trapezoidal rule on the given ascending points (need not be uniform)
    ///
    /// # Panics
    /// Panics if fewer than two points are given.
    pub fn trapezoidal(s: &[f64]) -> Self {
        let n = s.len();
        if n < 2 {
            panic!("insufficient points")
        }

        // Calculate weights
        let mut weights = vec![0.; n];
        weights[0] = (s[1] - s[0]) / 2.;
        for i in 1..n - 1 {
            weights[i] = (s[i + 1] - s[i - 1]) / 2.;
        }
        weights[n - 1] = (s[n - 1] - s[n - 2]) / 2.;
        Self {
            points: s.to_vec(),
            weights,
        }
    }
}

#[cfg(test)]
mod tests {

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_trapezoidal_weights() {
        let q = Quadrature::trapezoidal(&[0., 1., 3.]);
        assert_eq!(q.weights, vec![0.5, 1.5, 1.0]);
    }

    #[test]
    fn test_trapezoidal_linear_is_exact() {
        let s = (0..11).map(|i| -1. + 0.3 * i as f64).collect::<Vec<_>>();
        let q = Quadrature::trapezoidal(&s);
        let integral = q
            .points
            .iter()
            .zip(q.weights.iter())
            .map(|(&x, &w)| w * (2. * x + 1.))
            .sum::<f64>();
        let (a, b) = (s[0], s[10]);
        assert_relative_eq!(integral, (b * b + b) - (a * a + a), epsilon = 1e-12);
    }
}
