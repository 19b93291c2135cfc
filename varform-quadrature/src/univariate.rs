//! Quadrature rules and interpolation nodes for the unit interval `[0, 1]`.

use crate::Rule;
use std::f64::consts::PI;

/// Legendre polynomial evaluation by the three-term recurrence.
///
/// The derivative formula divides by `x^2 - 1`, so derivatives are valid only
/// in the open interval `(-1, 1)`.
#[derive(Debug, Default)]
struct Legendre {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl Legendre {
    fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        let mut p3;
        for m in 1..=n {
            let m = m as f64;
            p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }
        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = self;
        let n = *n as f64;
        // dp_n/dx (x) = n (x p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }

    /// Second derivative from the Legendre differential equation,
    /// (1 - x^2) p'' = 2 x p' - n (n + 1) p.
    fn second_derivative(&self) -> f64 {
        let n = self.n as f64;
        (2.0 * self.x * self.derivative() - n * (n + 1.0) * self.value()) / (1.0 - self.x * self.x)
    }
}

fn map_to_unit_interval(weights: &mut [f64], points: &mut [f64]) {
    for w in weights.iter_mut() {
        *w *= 0.5;
    }
    for x in points.iter_mut() {
        *x = 0.5 * (*x + 1.0);
    }
}

/// Gauss-Legendre quadrature on the unit interval `[0, 1]`.
///
/// Given `n` points, the rule integrates polynomials of degree up to `2n - 1`
/// exactly. The points are the (mapped) roots of the Legendre polynomial of
/// degree `n`, returned in increasing order.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let m = (n + 1) / 2;
    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];

    // Find the first m roots of P_n by Newton iteration from a cosine initial
    // guess; the remaining roots follow by symmetry.
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut iterations = 0;
        loop {
            let legendre = Legendre::evaluate(n, x);
            let dx = -legendre.value() / legendre.derivative();
            x += dx;
            iterations += 1;
            if dx.abs() <= 1e-15 || iterations > 100 {
                break;
            }
        }

        let dp = Legendre::evaluate(n, x).derivative();
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // The cosine guesses enumerate roots in decreasing order
        points[n - 1 - i] = x;
        weights[n - 1 - i] = w;
        points[i] = -x;
        weights[i] = w;
    }

    map_to_unit_interval(&mut weights, &mut points);
    (weights, points.into_iter().map(|x| [x]).collect())
}

/// Gauss-Lobatto quadrature on the unit interval `[0, 1]`.
///
/// The endpoints 0 and 1 are always included. Given `n >= 2` points, the rule
/// integrates polynomials of degree up to `2n - 3` exactly. The interior
/// points are the (mapped) roots of the derivative of the Legendre polynomial
/// of degree `n - 1`.
///
/// # Panics
///
/// Panics if fewer than two points are requested.
pub fn gauss_lobatto(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n >= 2, "Lobatto rules require at least two points");

    let mut points = vec![0.0; n];
    let mut weights = vec![0.0; n];

    points[0] = -1.0;
    points[n - 1] = 1.0;

    // Interior nodes: roots of P'_{n-1}, found by Newton iteration on the
    // derivative with a Chebyshev-like initial guess.
    let degree = n - 1;
    for i in 1..n - 1 {
        let mut x = (PI * i as f64 / degree as f64).cos();
        let mut iterations = 0;
        loop {
            let legendre = Legendre::evaluate(degree, x);
            let dx = -legendre.derivative() / legendre.second_derivative();
            x += dx;
            iterations += 1;
            if dx.abs() <= 1e-15 || iterations > 100 {
                break;
            }
        }
        points[n - 1 - i] = x;
    }

    // w_i = 2 / (n (n - 1) P_{n-1}(x_i)^2)
    let scale = 2.0 / (n as f64 * degree as f64);
    for i in 0..n {
        let p = Legendre::evaluate(degree, points[i]).value();
        weights[i] = scale / (p * p);
    }

    map_to_unit_interval(&mut weights, &mut points);
    (weights, points.into_iter().map(|x| [x]).collect())
}

/// The Gauss-Legendre interpolation nodes on `[0, 1]`: an open node set with
/// no points on the boundary.
pub fn gauss_points(num_points: usize) -> Vec<f64> {
    gauss(num_points).1.into_iter().map(|[x]| x).collect()
}

/// The Gauss-Lobatto interpolation nodes on `[0, 1]`: a closed node set
/// including both endpoints.
pub fn gauss_lobatto_points(num_points: usize) -> Vec<f64> {
    gauss_lobatto(num_points).1.into_iter().map(|[x]| x).collect()
}
