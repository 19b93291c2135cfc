//! Hyperelastic material laws as pointwise functions of the displacement
//! gradient.

use serde::{Deserialize, Serialize};
use std::ops::Mul;
use varform::dual::Analytic;
use varform::tensor::{ddot, det, identity, inv, sym, tr, transpose, Matrix, SquareMatrix};

/// First Lame parameter `lambda` and shear modulus `mu`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LameParameters {
    pub mu: f64,
    pub lambda: f64,
}

impl Default for LameParameters {
    fn default() -> Self {
        Self { mu: 0.0, lambda: 0.0 }
    }
}

impl LameParameters {
    pub fn from_shear_and_bulk(shear: f64, bulk: f64) -> Self {
        Self {
            mu: shear,
            lambda: bulk - 2.0 * shear / 3.0,
        }
    }

    pub fn from_young_poisson(young: f64, poisson: f64) -> Self {
        let mu = 0.5 * young / (1.0 + poisson);
        let lambda = 2.0 * mu * poisson / (1.0 - 2.0 * poisson);
        Self { mu, lambda }
    }
}

/// Linear elastic stress
/// `sigma = lambda tr(eps) I + 2 mu eps`, with
/// `eps = sym(grad u)`.
pub fn linear_elastic_stress<T, const D: usize>(
    displacement_gradient: &Matrix<T, D, D>,
    parameters: &LameParameters,
) -> Matrix<T, D, D>
where
    T: Analytic,
    Matrix<T, D, D>: Mul<T, Output = Matrix<T, D, D>>,
{
    let eps = sym(*displacement_gradient);
    identity::<T, D>() * (tr(eps) * parameters.lambda) + (2.0 * parameters.mu) * eps
}

/// Linear elastic strain energy density
/// `psi = mu eps : eps + lambda / 2 tr(eps)^2`.
pub fn linear_elastic_energy<T, const D: usize>(
    displacement_gradient: &Matrix<T, D, D>,
    parameters: &LameParameters,
) -> T
where
    T: Analytic,
{
    let eps = sym(*displacement_gradient);
    let trace = tr(eps);
    ddot(eps, eps) * parameters.mu + trace * trace * (0.5 * parameters.lambda)
}

/// First Piola-Kirchhoff stress of the compressible Neo-Hookean model,
/// `P = mu (F - F^{-T}) + lambda ln(J) F^{-T}` with `F = I + grad u` and
/// `J = det F`.
///
/// Undefined for `J <= 0`; callers working near element inversion must guard
/// the state themselves.
pub fn neo_hookean_first_piola<T, const D: usize>(
    displacement_gradient: &Matrix<T, D, D>,
    parameters: &LameParameters,
) -> Matrix<T, D, D>
where
    T: Analytic,
    Matrix<T, D, D>: SquareMatrix<Scalar = T> + Mul<T, Output = Matrix<T, D, D>>,
{
    let f = identity::<T, D>() + *displacement_gradient;
    let f_inv_t = transpose(inv(&f));
    let log_j = det(&f).ln();
    parameters.mu * (f - f_inv_t) + f_inv_t * (log_j * parameters.lambda)
}

/// Strain energy density of the compressible Neo-Hookean model,
/// `psi = mu / 2 (I_C - d) - mu ln(J) + lambda / 2 ln(J)^2` where
/// `I_C = tr(F^T F)`.
pub fn neo_hookean_energy<T, const D: usize>(
    displacement_gradient: &Matrix<T, D, D>,
    parameters: &LameParameters,
) -> T
where
    T: Analytic,
    Matrix<T, D, D>: SquareMatrix<Scalar = T>,
{
    let f = identity::<T, D>() + *displacement_gradient;
    let log_j = det(&f).ln();
    let first_invariant = ddot(f, f);
    (first_invariant - T::one() * (D as f64)) * (0.5 * parameters.mu) - log_j * parameters.mu
        + log_j * log_j * (0.5 * parameters.lambda)
}
