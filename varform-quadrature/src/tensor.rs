//! Tensor-product rules for the unit square and unit cube.
//!
//! Quadrilateral and hexahedral reference domains admit quadrature rules that
//! are tensor products of 1D rules; the first coordinate varies fastest.

use crate::univariate::gauss;
use crate::Rule;

/// A Gauss-Legendre rule for the unit square, with `num_points_per_dim`
/// points along each axis.
pub fn quadrilateral_gauss(num_points_per_dim: usize) -> Rule<2> {
    let n = num_points_per_dim;
    let (weights1d, points1d) = gauss(n);
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d = || weights1d.iter().zip(&points1d);

    for (&wy, &[y]) in rule1d() {
        for (&wx, &[x]) in rule1d() {
            weights2d.push(wx * wy);
            points2d.push([x, y]);
        }
    }

    (weights2d, points2d)
}

/// A Gauss-Legendre rule for the unit cube, with `num_points_per_dim` points
/// along each axis.
pub fn hexahedron_gauss(num_points_per_dim: usize) -> Rule<3> {
    let n = num_points_per_dim;
    let (weights1d, points1d) = gauss(n);
    let mut weights3d = Vec::with_capacity(n * n * n);
    let mut points3d = Vec::with_capacity(n * n * n);

    let rule1d = || weights1d.iter().zip(&points1d);

    for (&wz, &[z]) in rule1d() {
        for (&wy, &[y]) in rule1d() {
            for (&wx, &[x]) in rule1d() {
                weights3d.push(wx * wy * wz);
                points3d.push([x, y, z]);
            }
        }
    }

    (weights3d, points3d)
}
