//! A variational form engine for nonlinear finite element computations.
//!
//! The engine turns a user-supplied *q-function* (the pointwise integrand
//! of a weak form, written as ordinary Rust over tensor values) into a
//! residual operator, the action of its Frechet derivative, and assembled
//! element stiffness matrices. Derivatives come from forward-mode automatic
//! differentiation through the [`tensor`]/[`dual`] algebra, so no element
//! loops or analytic Jacobians are written by hand.
//!
//! The layering, leaves to root:
//!
//! - [`tensor`], [`dual`]: fixed-shape tensor values and dual numbers.
//! - [`qfunction`]: the q-function input/output model, dual seeding and the
//!   chain rule over cached derivative records.
//! - [`element`]: compile-time shape function tables per (geometry, family,
//!   order, components); [`quadrature`]: Gauss rules on the reference cells.
//! - [`assembly::local`]: the three element integration kernels.
//! - [`assembly::integral`]: the type-erased per-integral handle owning the
//!   derivative cache.
//! - [`assembly::global`]: the [`assembly::WeakForm`] facade exposing a
//!   nonlinear operator and its Jacobian to outer solvers.
//! - [`mesh`], [`space`]: a thin structured-mesh host layer supplying
//!   Jacobian tables, dof numbering and restriction operators.

pub mod assembly;
pub mod dual;
pub mod element;
pub mod mesh;
pub mod qfunction;
pub mod quadrature;
pub mod space;
pub mod tensor;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate varform_quadrature;
