//! Quadrature rules and interpolation nodes for finite element reference domains.
//!
//! All rules and node sets in this crate are given on the *unit* reference
//! domains `[0, 1]^d`. This matches the parent-element convention of the
//! `varform` engine; rules for the symmetric interval `[-1, 1]` are computed
//! internally and mapped affinely.
//!
//! The crate is deliberately dependency-free and `f64`-only so that it can be
//! used independently of the rest of the workspace. Rule construction is
//! infallible; requesting a nonsensical point count (zero points, or fewer
//! than two Lobatto points) is a programming error and panics.

pub mod tensor;
pub mod univariate;

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional quadrature rule: weights and points, in matching order.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional quadrature rule on the unit interval.
pub type Rule1d = Rule<1>;

/// A two-dimensional quadrature rule on the unit square.
pub type Rule2d = Rule<2>;

/// A three-dimensional quadrature rule on the unit cube.
pub type Rule3d = Rule<3>;
