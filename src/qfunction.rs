//! The data model connecting q-functions to the integration kernels.
//!
//! A q-function is a pointwise description of the integrand of a weak form:
//! it receives the interpolated trial field (a [`QInput`]) at a quadrature
//! point and returns a [`QOutput`] whose `source` term is integrated against
//! test functions and whose `flux` term is integrated against test function
//! derivatives.
//!
//! The kernels call the q-function with *dual* inputs produced by
//! [`make_dual`], so a single invocation yields both the output value and the
//! full derivative record ([`QJacobian`]) of the output with respect to the
//! input. The derivative record is cached per quadrature point and later
//! replayed by [`chain_rule`] to apply the linearization to perturbations.

use crate::dual::Dual;
use crate::tensor::{ddot, dot, Matrix, Tensor3, Tensor4, Vector};
use num::Zero;
use std::ops::{Add, Mul, Neg, Sub};

/// The trial-field data handed to a q-function at one quadrature point.
///
/// For nodal (H1/L2) spaces `deriv` is the field gradient; for H(curl)
/// spaces it is the curl.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QInput<V, D> {
    pub value: V,
    pub deriv: D,
}

/// The q-function result at one quadrature point.
///
/// `source` is integrated against test functions, `flux` against test
/// function gradients (or curls, for H(curl) test spaces).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QOutput<S, F> {
    pub source: S,
    pub flux: F,
}

/// The derivative of a q-function output with respect to its input: a 2x2
/// block of tensors, one block per (output slot, input slot) pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QJacobian<SV, SD, FV, FD> {
    /// d source / d value
    pub source_value: SV,
    /// d source / d deriv
    pub source_deriv: SD,
    /// d flux / d value
    pub flux_value: FV,
    /// d flux / d deriv
    pub flux_deriv: FD,
}

/// Argument shape for a scalar nodal field in `D` dimensions.
pub type ScalarArg<const D: usize> = QInput<f64, Vector<f64, D>>;

/// Argument shape for a `C`-component nodal field in `D` dimensions.
pub type VectorArg<const C: usize, const D: usize> = QInput<Vector<f64, C>, Matrix<f64, C, D>>;

/// Argument shape for an H(curl) field in two dimensions (scalar curl).
pub type CurlArg2d = QInput<Vector<f64, 2>, f64>;

/// Argument shape for an H(curl) field in three dimensions (vector curl).
pub type CurlArg3d = QInput<Vector<f64, 3>, Vector<f64, 3>>;

// QInput doubles as the gradient carrier of the dual numbers seeded from it,
// so it needs the arithmetic of a gradient value.

impl<V: Copy + Zero, D: Copy + Zero> Zero for QInput<V, D> {
    fn zero() -> Self {
        Self {
            value: V::zero(),
            deriv: D::zero(),
        }
    }
    fn is_zero(&self) -> bool {
        self.value.is_zero() && self.deriv.is_zero()
    }
}

impl<V: Add<Output = V>, D: Add<Output = D>> Add for QInput<V, D> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
            deriv: self.deriv + rhs.deriv,
        }
    }
}

impl<V: Sub<Output = V>, D: Sub<Output = D>> Sub for QInput<V, D> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
            deriv: self.deriv - rhs.deriv,
        }
    }
}

impl<V: Neg<Output = V>, D: Neg<Output = D>> Neg for QInput<V, D> {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            value: -self.value,
            deriv: -self.deriv,
        }
    }
}

impl<V: Mul<f64, Output = V>, D: Mul<f64, Output = D>> Mul<f64> for QInput<V, D> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            value: self.value * rhs,
            deriv: self.deriv * rhs,
        }
    }
}

impl<SV: Copy + Zero, SD: Copy + Zero, FV: Copy + Zero, FD: Copy + Zero> Zero
    for QJacobian<SV, SD, FV, FD>
{
    fn zero() -> Self {
        Self {
            source_value: SV::zero(),
            source_deriv: SD::zero(),
            flux_value: FV::zero(),
            flux_deriv: FD::zero(),
        }
    }
    fn is_zero(&self) -> bool {
        self.source_value.is_zero()
            && self.source_deriv.is_zero()
            && self.flux_value.is_zero()
            && self.flux_deriv.is_zero()
    }
}

impl<SV: Add<Output = SV>, SD: Add<Output = SD>, FV: Add<Output = FV>, FD: Add<Output = FD>> Add
    for QJacobian<SV, SD, FV, FD>
{
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            source_value: self.source_value + rhs.source_value,
            source_deriv: self.source_deriv + rhs.source_deriv,
            flux_value: self.flux_value + rhs.flux_value,
            flux_deriv: self.flux_deriv + rhs.flux_deriv,
        }
    }
}

/// Lifts a q-function input to dual numbers with identity seeding: every
/// scalar slot of the input receives its own unit seed.
pub trait MakeDual: Copy {
    type Dualized;
    fn make_dual(self) -> Self::Dualized;
}

/// Free-function form of [`MakeDual::make_dual`].
pub fn make_dual<T: MakeDual>(x: T) -> T::Dualized {
    x.make_dual()
}

impl<const D: usize> MakeDual for ScalarArg<D> {
    type Dualized = QInput<Dual<Self>, Vector<Dual<Self>, D>>;

    fn make_dual(self) -> Self::Dualized {
        QInput {
            value: Dual {
                value: self.value,
                gradient: QInput {
                    value: 1.0,
                    deriv: Vector::zero(),
                },
            },
            deriv: Vector::from_fn(|i| Dual {
                value: self.deriv[i],
                gradient: QInput {
                    value: 0.0,
                    deriv: Vector::from_fn(|j| if i == j { 1.0 } else { 0.0 }),
                },
            }),
        }
    }
}

impl<const C: usize, const D: usize> MakeDual for VectorArg<C, D> {
    type Dualized = QInput<Vector<Dual<Self>, C>, Matrix<Dual<Self>, C, D>>;

    fn make_dual(self) -> Self::Dualized {
        QInput {
            value: Vector::from_fn(|i| Dual {
                value: self.value[i],
                gradient: QInput {
                    value: Vector::from_fn(|j| if i == j { 1.0 } else { 0.0 }),
                    deriv: Matrix::zero(),
                },
            }),
            deriv: Matrix::from_fn(|i, j| Dual {
                value: self.deriv[i][j],
                gradient: QInput {
                    value: Vector::zero(),
                    deriv: Matrix::from_fn(|k, l| if k == i && l == j { 1.0 } else { 0.0 }),
                },
            }),
        }
    }
}

impl MakeDual for CurlArg2d {
    type Dualized = QInput<Vector<Dual<Self>, 2>, Dual<Self>>;

    fn make_dual(self) -> Self::Dualized {
        QInput {
            value: Vector::from_fn(|i| Dual {
                value: self.value[i],
                gradient: QInput {
                    value: Vector::from_fn(|j| if i == j { 1.0 } else { 0.0 }),
                    deriv: 0.0,
                },
            }),
            deriv: Dual {
                value: self.deriv,
                gradient: QInput {
                    value: Vector::zero(),
                    deriv: 1.0,
                },
            },
        }
    }
}

impl MakeDual for CurlArg3d {
    type Dualized = QInput<Vector<Dual<Self>, 3>, Vector<Dual<Self>, 3>>;

    fn make_dual(self) -> Self::Dualized {
        QInput {
            value: Vector::from_fn(|i| Dual {
                value: self.value[i],
                gradient: QInput {
                    value: Vector::from_fn(|j| if i == j { 1.0 } else { 0.0 }),
                    deriv: Vector::zero(),
                },
            }),
            deriv: Vector::from_fn(|i| Dual {
                value: self.deriv[i],
                gradient: QInput {
                    value: Vector::zero(),
                    deriv: Vector::from_fn(|j| if i == j { 1.0 } else { 0.0 }),
                },
            }),
        }
    }
}

/// Projects the value and the derivative record out of a dual-valued
/// q-function output.
pub trait ExtractDual {
    type Value;
    type Jacobian;
    fn value(&self) -> Self::Value;
    fn jacobian(&self) -> Self::Jacobian;
}

/// The plain value channel of a dual q-function output.
pub fn get_value<T: ExtractDual>(out: &T) -> T::Value {
    out.value()
}

/// The derivative record of a dual q-function output.
pub fn get_gradient<T: ExtractDual>(out: &T) -> T::Jacobian {
    out.jacobian()
}

impl<const D: usize> ExtractDual for QOutput<Dual<ScalarArg<D>>, Vector<Dual<ScalarArg<D>>, D>> {
    type Value = QOutput<f64, Vector<f64, D>>;
    type Jacobian = QJacobian<f64, Vector<f64, D>, Vector<f64, D>, Matrix<f64, D, D>>;

    fn value(&self) -> Self::Value {
        QOutput {
            source: self.source.value,
            flux: Vector::from_fn(|i| self.flux[i].value),
        }
    }

    fn jacobian(&self) -> Self::Jacobian {
        QJacobian {
            source_value: self.source.gradient.value,
            source_deriv: self.source.gradient.deriv,
            flux_value: Vector::from_fn(|i| self.flux[i].gradient.value),
            flux_deriv: Matrix::from_fn(|i, j| self.flux[i].gradient.deriv[j]),
        }
    }
}

impl<const C: usize, const D: usize> ExtractDual
    for QOutput<Vector<Dual<VectorArg<C, D>>, C>, Matrix<Dual<VectorArg<C, D>>, C, D>>
{
    type Value = QOutput<Vector<f64, C>, Matrix<f64, C, D>>;
    type Jacobian = QJacobian<
        Matrix<f64, C, C>,
        Tensor3<f64, C, C, D>,
        Tensor3<f64, C, D, C>,
        Tensor4<f64, C, D, C, D>,
    >;

    fn value(&self) -> Self::Value {
        QOutput {
            source: Vector::from_fn(|i| self.source[i].value),
            flux: Matrix::from_fn(|i, k| self.flux[i][k].value),
        }
    }

    fn jacobian(&self) -> Self::Jacobian {
        QJacobian {
            source_value: Matrix::from_fn(|i, j| self.source[i].gradient.value[j]),
            source_deriv: Tensor3::from_fn(|i, j, k| self.source[i].gradient.deriv[j][k]),
            flux_value: Tensor3::from_fn(|i, k, j| self.flux[i][k].gradient.value[j]),
            flux_deriv: Tensor4::from_fn(|i, k, j, l| self.flux[i][k].gradient.deriv[j][l]),
        }
    }
}

impl ExtractDual for QOutput<Vector<Dual<CurlArg2d>, 2>, Dual<CurlArg2d>> {
    type Value = QOutput<Vector<f64, 2>, f64>;
    type Jacobian = QJacobian<Matrix<f64, 2, 2>, Vector<f64, 2>, Vector<f64, 2>, f64>;

    fn value(&self) -> Self::Value {
        QOutput {
            source: Vector::from_fn(|i| self.source[i].value),
            flux: self.flux.value,
        }
    }

    fn jacobian(&self) -> Self::Jacobian {
        QJacobian {
            source_value: Matrix::from_fn(|i, j| self.source[i].gradient.value[j]),
            source_deriv: Vector::from_fn(|i| self.source[i].gradient.deriv),
            flux_value: self.flux.gradient.value,
            flux_deriv: self.flux.gradient.deriv,
        }
    }
}

impl ExtractDual for QOutput<Vector<Dual<CurlArg3d>, 3>, Vector<Dual<CurlArg3d>, 3>> {
    type Value = QOutput<Vector<f64, 3>, Vector<f64, 3>>;
    type Jacobian =
        QJacobian<Matrix<f64, 3, 3>, Matrix<f64, 3, 3>, Matrix<f64, 3, 3>, Matrix<f64, 3, 3>>;

    fn value(&self) -> Self::Value {
        QOutput {
            source: Vector::from_fn(|i| self.source[i].value),
            flux: Vector::from_fn(|i| self.flux[i].value),
        }
    }

    fn jacobian(&self) -> Self::Jacobian {
        QJacobian {
            source_value: Matrix::from_fn(|i, j| self.source[i].gradient.value[j]),
            source_deriv: Matrix::from_fn(|i, j| self.source[i].gradient.deriv[j]),
            flux_value: Matrix::from_fn(|i, j| self.flux[i].gradient.value[j]),
            flux_deriv: Matrix::from_fn(|i, j| self.flux[i].gradient.deriv[j]),
        }
    }
}

/// Applies a cached derivative record to an input perturbation, producing
/// the first-order change of the q-function output.
pub trait ChainRule<Input> {
    type Output;
    fn chain(&self, perturbation: &Input) -> Self::Output;
}

/// Free-function form of [`ChainRule::chain`].
pub fn chain_rule<J, X>(jacobian: &J, perturbation: &X) -> J::Output
where
    J: ChainRule<X>,
{
    jacobian.chain(perturbation)
}

impl<const D: usize> ChainRule<ScalarArg<D>>
    for QJacobian<f64, Vector<f64, D>, Vector<f64, D>, Matrix<f64, D, D>>
{
    type Output = QOutput<f64, Vector<f64, D>>;

    fn chain(&self, d: &ScalarArg<D>) -> Self::Output {
        QOutput {
            source: self.source_value * d.value + dot(self.source_deriv, d.deriv),
            flux: self.flux_value * d.value + dot(self.flux_deriv, d.deriv),
        }
    }
}

impl<const C: usize, const D: usize> ChainRule<VectorArg<C, D>>
    for QJacobian<
        Matrix<f64, C, C>,
        Tensor3<f64, C, C, D>,
        Tensor3<f64, C, D, C>,
        Tensor4<f64, C, D, C, D>,
    >
{
    type Output = QOutput<Vector<f64, C>, Matrix<f64, C, D>>;

    fn chain(&self, d: &VectorArg<C, D>) -> Self::Output {
        QOutput {
            source: dot(self.source_value, d.value) + ddot(self.source_deriv, d.deriv),
            flux: dot(self.flux_value, d.value) + ddot(self.flux_deriv, d.deriv),
        }
    }
}

impl ChainRule<CurlArg2d> for QJacobian<Matrix<f64, 2, 2>, Vector<f64, 2>, Vector<f64, 2>, f64> {
    type Output = QOutput<Vector<f64, 2>, f64>;

    fn chain(&self, d: &CurlArg2d) -> Self::Output {
        QOutput {
            source: dot(self.source_value, d.value) + self.source_deriv * d.deriv,
            flux: dot(self.flux_value, d.value) + self.flux_deriv * d.deriv,
        }
    }
}

impl ChainRule<CurlArg3d>
    for QJacobian<Matrix<f64, 3, 3>, Matrix<f64, 3, 3>, Matrix<f64, 3, 3>, Matrix<f64, 3, 3>>
{
    type Output = QOutput<Vector<f64, 3>, Vector<f64, 3>>;

    fn chain(&self, d: &CurlArg3d) -> Self::Output {
        QOutput {
            source: dot(self.source_value, d.value) + dot(self.source_deriv, d.deriv),
            flux: dot(self.flux_value, d.value) + dot(self.flux_deriv, d.deriv),
        }
    }
}

/// Uniform entrywise access to the four blocks of a derivative record, used
/// by the stiffness-matrix kernel. The scalar (single-component) record is
/// the only shape-special-cased implementation: its component indices are
/// always zero.
pub trait GradientBlocks<const D: usize> {
    fn source_value(&self, id: usize, jd: usize) -> f64;
    fn source_deriv(&self, id: usize, jd: usize, k: usize) -> f64;
    fn flux_value(&self, id: usize, k: usize, jd: usize) -> f64;
    fn flux_deriv(&self, id: usize, k: usize, jd: usize, l: usize) -> f64;
}

impl<const D: usize> GradientBlocks<D>
    for QJacobian<f64, Vector<f64, D>, Vector<f64, D>, Matrix<f64, D, D>>
{
    fn source_value(&self, id: usize, jd: usize) -> f64 {
        debug_assert!(id == 0 && jd == 0);
        self.source_value
    }
    fn source_deriv(&self, id: usize, jd: usize, k: usize) -> f64 {
        debug_assert!(id == 0 && jd == 0);
        self.source_deriv[k]
    }
    fn flux_value(&self, id: usize, k: usize, jd: usize) -> f64 {
        debug_assert!(id == 0 && jd == 0);
        self.flux_value[k]
    }
    fn flux_deriv(&self, id: usize, k: usize, jd: usize, l: usize) -> f64 {
        debug_assert!(id == 0 && jd == 0);
        self.flux_deriv[k][l]
    }
}

impl<const C: usize, const D: usize> GradientBlocks<D>
    for QJacobian<
        Matrix<f64, C, C>,
        Tensor3<f64, C, C, D>,
        Tensor3<f64, C, D, C>,
        Tensor4<f64, C, D, C, D>,
    >
{
    fn source_value(&self, id: usize, jd: usize) -> f64 {
        self.source_value[id][jd]
    }
    fn source_deriv(&self, id: usize, jd: usize, k: usize) -> f64 {
        self.source_deriv[id][jd][k]
    }
    fn flux_value(&self, id: usize, k: usize, jd: usize) -> f64 {
        self.flux_value[id][k][jd]
    }
    fn flux_deriv(&self, id: usize, k: usize, jd: usize, l: usize) -> f64 {
        self.flux_deriv[id][k][jd][l]
    }
}
