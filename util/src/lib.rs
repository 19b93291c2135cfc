//! Shared test support: reference integrators, a conjugate gradient solver
//! and comparison helpers.
//!
//! The reference integrators assemble the classical bilinear forms (mass,
//! diffusion, elasticity, vector-FE mass, curl-curl) with hand-written dense
//! element loops, independently of the variational form engine's kernels and
//! automatic differentiation. Engine output is validated against them.

use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;

pub mod reference;

/// `||a - b|| / ||b||` in the Euclidean norm.
pub fn relative_l2_error(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    assert_eq!(a.len(), b.len());
    (a - b).norm() / b.norm()
}

/// Sparse matrix-vector product for CSR matrices.
pub fn csr_mul(a: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    assert_eq!(a.ncols(), x.len());
    let mut y = DVector::zeros(a.nrows());
    for (i, row) in a.row_iter().enumerate() {
        let mut sum = 0.0;
        for (&j, &v) in row.col_indices().iter().zip(row.values()) {
            sum += v * x[j];
        }
        y[i] = sum;
    }
    y
}

/// Conjugate gradient iteration for symmetric positive definite systems,
/// with a relative residual stopping criterion.
pub fn solve_cg(
    a: &CsrMatrix<f64>,
    b: &DVector<f64>,
    tol: f64,
    max_iterations: usize,
) -> Result<DVector<f64>, String> {
    assert_eq!(a.nrows(), a.ncols());
    assert_eq!(a.nrows(), b.len());

    let b_norm = b.norm();
    if b_norm == 0.0 {
        return Ok(DVector::zeros(b.len()));
    }

    let mut x = DVector::zeros(b.len());
    let mut r = b.clone();
    let mut p = r.clone();
    let mut r_dot = r.dot(&r);

    for iteration in 0..max_iterations {
        if r_dot.sqrt() <= tol * b_norm {
            debug!("cg converged in {} iterations", iteration);
            return Ok(x);
        }
        let ap = csr_mul(a, &p);
        let alpha = r_dot / p.dot(&ap);
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);
        let r_dot_next = r.dot(&r);
        let beta = r_dot_next / r_dot;
        r_dot = r_dot_next;
        p = &r + &p * beta;
    }

    if r_dot.sqrt() <= tol * b_norm {
        Ok(x)
    } else {
        Err(format!(
            "cg failed to converge within {} iterations (residual {:.3e})",
            max_iterations,
            r_dot.sqrt() / b_norm
        ))
    }
}

/// Applies essential boundary conditions to a linear system in place: unit
/// diagonal rows/columns and matching right-hand side entries.
pub fn eliminate_essential_dofs(
    a: &CsrMatrix<f64>,
    b: &mut DVector<f64>,
    essential: &[usize],
) -> CsrMatrix<f64> {
    let mut is_essential = vec![false; a.nrows()];
    for &dof in essential {
        is_essential[dof] = true;
        b[dof] = 0.0;
    }

    let mut coo = nalgebra_sparse::CooMatrix::new(a.nrows(), a.ncols());
    for (i, row) in a.row_iter().enumerate() {
        for (&j, &v) in row.col_indices().iter().zip(row.values()) {
            if !is_essential[i] && !is_essential[j] {
                coo.push(i, j, v);
            }
        }
    }
    for &dof in essential {
        coo.push(dof, dof, 1.0);
    }
    CsrMatrix::from(&coo)
}
