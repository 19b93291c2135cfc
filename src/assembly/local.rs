//! Element integration kernels and the pointwise assembly primitives.
//!
//! All three kernels share the same loop structure: for each element, gather
//! dofs, iterate the quadrature rule, map data through the element family's
//! preprocess/postprocess, and scatter the accumulated contributions back to
//! the packed output. The evaluation kernel additionally records the
//! q-function derivative at every quadrature point; the gradient kernels
//! replay those records, so they never see the q-function itself.

use crate::assembly::{AssemblyError, CoordinateTable, JacobianTable};
use crate::element::{NodalElement, TestElement, TrialElement};
use crate::qfunction::{ChainRule, ExtractDual, GradientBlocks, MakeDual};
use crate::quadrature::TensorRule;
use crate::tensor::{det, dot, inv, transpose, Dot, IsFinite, Matrix, SquareMatrix, Vector};
use itertools::izip;
use num::Zero;
use std::ops::Mul;

/// The volume (area, length) scaling of the geometry map: `det J` for a
/// square Jacobian.
///
/// A non-positive result means the element is degenerate or inverted; the
/// kernels treat that as a data error.
pub fn measure<const D: usize>(jacobian: &Matrix<f64, D, D>) -> f64
where
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
{
    det(jacobian)
}

/// The measure of a non-square (embedded) geometry map,
/// `sqrt(det(J^T J))`.
pub fn measure_embedded<const S: usize, const G: usize>(jacobian: &Matrix<f64, S, G>) -> f64
where
    Matrix<f64, G, G>: SquareMatrix<Scalar = f64>,
{
    det(&dot(transpose(*jacobian), *jacobian)).sqrt()
}

/// Interpolates a scalar nodal field on an embedded (surface or line)
/// element, where only the value is available.
///
/// Together with [`surface_postprocess`], this is the value-only primitive
/// pair for integrals with `spatial_dim != geometry_dim`. Gradient terms on
/// embedded elements are a planned extension.
pub fn surface_preprocess<E, const G: usize>(u: &E::Dofs, xi: &Vector<f64, G>) -> f64
where
    E: NodalElement<G>,
    E::Dofs: Dot<E::Shape, Output = f64>,
{
    dot(*u, E::shape(xi))
}

/// Integrates a pointwise value against the shape functions of an embedded
/// scalar nodal element.
pub fn surface_postprocess<E, const G: usize>(f: f64, xi: &Vector<f64, G>) -> E::Residual
where
    E: NodalElement<G>,
    E::Shape: Mul<f64, Output = E::Residual>,
{
    E::shape(xi) * f
}

/// Evaluates the residual contributions of one domain integral.
///
/// For every element and quadrature point, the trial field is interpolated,
/// lifted to dual numbers and passed to the q-function; the value channel of
/// the output is integrated against the test basis, and the derivative
/// channel is stored in `cache` for the gradient kernels.
///
/// On success, `cache` holds the linearization of the q-function at the
/// state `u_packed`.
#[allow(clippy::too_many_arguments)]
pub fn evaluation_kernel<Test, Trial, F, Out, const D: usize>(
    u_packed: &[f64],
    r_packed: &mut [f64],
    cache: &mut [Out::Jacobian],
    jacobians: &JacobianTable<D>,
    coordinates: &CoordinateTable<D>,
    rule: &TensorRule<D>,
    num_elements: usize,
    qf: &F,
) -> Result<(), AssemblyError>
where
    Test: TestElement<D>,
    Trial: TrialElement<D>,
    Trial::QInput: MakeDual,
    F: Fn(&Vector<f64, D>, <Trial::QInput as MakeDual>::Dualized) -> Out,
    Out: ExtractDual<Value = Test::QValue>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
{
    debug_assert_eq!(u_packed.len(), Trial::NDOF * Trial::COMPONENTS * num_elements);
    debug_assert_eq!(r_packed.len(), Test::NDOF * Test::COMPONENTS * num_elements);
    debug_assert_eq!(cache.len(), rule.len() * num_elements);

    for e in 0..num_elements {
        let u_elem = Trial::load(u_packed, e);
        let mut r_elem = <Test::Residual as Zero>::zero();

        for (q, (&w, xi)) in izip!(&rule.weights, &rule.points).enumerate() {
            let x_q = coordinates.point(q, e);
            let j_q = jacobians.jacobian(q, e);
            let volume = measure(&j_q);
            if volume <= 0.0 {
                return Err(AssemblyError::DegenerateElement { element: e, point: q });
            }
            let dx = volume * w;

            let arg = Trial::preprocess(&u_elem, xi, &j_q);
            let output = qf(&x_q, arg.make_dual());

            r_elem += Test::postprocess(&output.value(), xi, &j_q) * dx;
            cache[e * rule.len() + q] = output.jacobian();
        }

        if !r_elem.is_finite() {
            return Err(AssemblyError::NumericError { element: e });
        }
        Test::store_add(r_packed, e, &r_elem);
    }

    Ok(())
}

/// Applies the cached linearization to a perturbation of the trial field.
///
/// Precondition: [`evaluation_kernel`] has run at the current state since the
/// last state change; the cache is not validated here.
pub fn gradient_kernel<Test, Trial, Jac, const D: usize>(
    du_packed: &[f64],
    dr_packed: &mut [f64],
    cache: &[Jac],
    jacobians: &JacobianTable<D>,
    rule: &TensorRule<D>,
    num_elements: usize,
) -> Result<(), AssemblyError>
where
    Test: TestElement<D>,
    Trial: TrialElement<D>,
    Jac: ChainRule<Trial::QInput, Output = Test::QValue>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
{
    debug_assert_eq!(du_packed.len(), Trial::NDOF * Trial::COMPONENTS * num_elements);
    debug_assert_eq!(dr_packed.len(), Test::NDOF * Test::COMPONENTS * num_elements);
    debug_assert_eq!(cache.len(), rule.len() * num_elements);

    for e in 0..num_elements {
        let du_elem = Trial::load(du_packed, e);
        let mut dr_elem = <Test::Residual as Zero>::zero();

        for (q, (&w, xi)) in izip!(&rule.weights, &rule.points).enumerate() {
            let j_q = jacobians.jacobian(q, e);
            let volume = measure(&j_q);
            if volume <= 0.0 {
                return Err(AssemblyError::DegenerateElement { element: e, point: q });
            }
            let dx = volume * w;

            let darg = Trial::preprocess(&du_elem, xi, &j_q);
            let dq = cache[e * rule.len() + q].chain(&darg);

            dr_elem += Test::postprocess(&dq, xi, &j_q) * dx;
        }

        Test::store_add(dr_packed, e, &dr_elem);
    }

    Ok(())
}

/// Assembles the element stiffness matrices from the cached linearization.
///
/// Only nodal (H1-family) test and trial spaces are supported. Each of the
/// four blocks of the cached derivative record contributes one term per
/// (dof, component) pair; the element matrices land in `k_packed` as
/// row-major `(NDOF * COMPONENTS)^2` blocks, one per element.
pub fn gradient_matrix_kernel<Test, Trial, Jac, const D: usize>(
    k_packed: &mut [f64],
    cache: &[Jac],
    jacobians: &JacobianTable<D>,
    rule: &TensorRule<D>,
    num_elements: usize,
) -> Result<(), AssemblyError>
where
    Test: NodalElement<D>,
    Trial: NodalElement<D>,
    Jac: GradientBlocks<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
{
    let rows = Test::NDOF * Test::COMPONENTS;
    let cols = Trial::NDOF * Trial::COMPONENTS;
    debug_assert_eq!(k_packed.len(), rows * cols * num_elements);
    debug_assert_eq!(cache.len(), rule.len() * num_elements);

    for e in 0..num_elements {
        let block = &mut k_packed[e * rows * cols..(e + 1) * rows * cols];

        for (q, (&w, xi)) in izip!(&rule.weights, &rule.points).enumerate() {
            let j_q = jacobians.jacobian(q, e);
            let volume = measure(&j_q);
            if volume <= 0.0 {
                return Err(AssemblyError::DegenerateElement { element: e, point: q });
            }
            let dx = volume * w;
            let j_inv = inv(&j_q);

            let m = Test::shape(xi);
            let n = Trial::shape(xi);
            let dm_dx = Test::physical_gradients(xi, &j_inv);
            let dn_dx = Trial::physical_gradients(xi, &j_inv);
            let record = &cache[e * rule.len() + q];

            for i in 0..Test::NDOF {
                for id in 0..Test::COMPONENTS {
                    let row = i * Test::COMPONENTS + id;
                    for j in 0..Trial::NDOF {
                        for jd in 0..Trial::COMPONENTS {
                            let col = j * Trial::COMPONENTS + jd;
                            let mut value = m[i] * record.source_value(id, jd) * n[j];
                            for k in 0..D {
                                value += m[i] * record.source_deriv(id, jd, k) * dn_dx[j][k];
                                value += dm_dx[i][k] * record.flux_value(id, k, jd) * n[j];
                                for l in 0..D {
                                    value += dm_dx[i][k]
                                        * record.flux_deriv(id, k, jd, l)
                                        * dn_dx[j][l];
                                }
                            }
                            block[row * cols + col] += value * dx;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
