//! Residual, gradient and matrix assembly from q-functions.
//!
//! The submodules are layered: [`local`] holds the element kernels and the
//! preprocess/postprocess/measure primitives, [`integral`] binds a kernel
//! specialization into a type-erased [`integral::Integral`] handle, and
//! [`global`] aggregates integrals into the [`global::WeakForm`] operator
//! facade.

use crate::tensor::{Matrix, Vector};
use std::fmt;

pub mod global;
pub mod integral;
pub mod local;

pub use global::{WeakForm, WeakFormGradient};
pub use integral::Integral;

/// Runtime assembly failures.
///
/// Shape and family mismatches are compile-time errors and do not appear
/// here; these variants are data errors surfaced while integrating.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// The geometry map has non-positive volume at a quadrature point; the
    /// mesh is degenerate or inverted.
    DegenerateElement { element: usize, point: usize },
    /// A q-function produced non-finite output on this element.
    NumericError { element: usize },
    /// The element stiffness matrix is only assembled for nodal (H1-family)
    /// test spaces.
    UnsupportedGradientMatrix,
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssemblyError::DegenerateElement { element, point } => write!(
                f,
                "degenerate geometry in element {} at quadrature point {}",
                element, point
            ),
            AssemblyError::NumericError { element } => {
                write!(f, "non-finite q-function output in element {}", element)
            }
            AssemblyError::UnsupportedGradientMatrix => {
                write!(f, "gradient matrix assembly requires a nodal test space")
            }
        }
    }
}

impl std::error::Error for AssemblyError {}

/// Borrowed view of a host-supplied Jacobian table with layout
/// `[num_points, D, D, num_elements]`, quadrature index fastest.
#[derive(Debug, Copy, Clone)]
pub struct JacobianTable<'a, const D: usize> {
    data: &'a [f64],
    num_points: usize,
}

impl<'a, const D: usize> JacobianTable<'a, D> {
    pub fn new(data: &'a [f64], num_points: usize, num_elements: usize) -> Self {
        assert_eq!(data.len(), num_points * D * D * num_elements);
        Self { data, num_points }
    }

    /// The Jacobian of the geometry map at quadrature point `q` of element
    /// `e`.
    pub fn jacobian(&self, q: usize, e: usize) -> Matrix<f64, D, D> {
        Matrix::from_fn(|i, j| self.data[q + self.num_points * (i + D * (j + D * e))])
    }
}

/// Borrowed view of a host-supplied physical coordinate table with layout
/// `[num_points, D, num_elements]`, quadrature index fastest.
#[derive(Debug, Copy, Clone)]
pub struct CoordinateTable<'a, const D: usize> {
    data: &'a [f64],
    num_points: usize,
}

impl<'a, const D: usize> CoordinateTable<'a, D> {
    pub fn new(data: &'a [f64], num_points: usize, num_elements: usize) -> Self {
        assert_eq!(data.len(), num_points * D * num_elements);
        Self { data, num_points }
    }

    /// The physical position of quadrature point `q` of element `e`.
    pub fn point(&self, q: usize, e: usize) -> Vector<f64, D> {
        Vector::from_fn(|i| self.data[q + self.num_points * (i + D * e)])
    }
}
