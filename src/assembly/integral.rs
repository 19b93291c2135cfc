//! The type-erased handle for one domain integral.
//!
//! An [`Integral`] is constructed from a concrete (test, trial, dimension,
//! q-function) combination. Construction deduces the quadrature rule from the
//! space orders, sizes the derivative cache from the q-function's dual return
//! type, and captures the three kernel specializations behind uniformly-typed
//! call thunks sharing that cache. This keeps the kernels monomorphic and
//! inlinable while letting the facade store a homogeneous collection.

use crate::assembly::local::{evaluation_kernel, gradient_kernel, gradient_matrix_kernel};
use crate::assembly::{AssemblyError, CoordinateTable, JacobianTable};
use crate::element::{NodalElement, TestElement, TrialElement, H1, Hcurl, L2};
use crate::qfunction::{ChainRule, ExtractDual, GradientBlocks, MakeDual};
use crate::quadrature::{points_per_dim, Dimension, ReferenceRule, TensorRule};
use crate::tensor::{Matrix, SquareMatrix, Vector};
use num::Zero;
use std::cell::RefCell;
use std::rc::Rc;

type EvalThunk = Box<dyn Fn(&[f64], &mut [f64]) -> Result<(), AssemblyError>>;
type MatrixThunk = Box<dyn Fn(&mut [f64]) -> Result<(), AssemblyError>>;

/// Provides the stiffness-matrix thunk for a test space, where supported.
///
/// Nodal test (and trial) families produce a thunk wrapping
/// [`gradient_matrix_kernel`]; H(curl) test spaces have no element stiffness
/// assembly in this engine and yield `None`. Mixed nodal/H(curl) pairs are
/// unsupported and fail to compile at the `Integral` construction site.
pub trait StiffnessKernel<Trial, Jac, const D: usize> {
    fn stiffness_thunk(
        cache: Rc<RefCell<Vec<Jac>>>,
        jacobians: Rc<Vec<f64>>,
        rule: Rc<TensorRule<D>>,
        num_elements: usize,
    ) -> Option<MatrixThunk>;
}

macro_rules! impl_stiffness_kernel_nodal {
    ($space:ident) => {
        impl<Trial, Jac, const P: usize, const C: usize, const D: usize>
            StiffnessKernel<Trial, Jac, D> for $space<P, C>
        where
            $space<P, C>: NodalElement<D>,
            Trial: NodalElement<D> + 'static,
            Jac: GradientBlocks<D> + 'static,
            Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
        {
            fn stiffness_thunk(
                cache: Rc<RefCell<Vec<Jac>>>,
                jacobians: Rc<Vec<f64>>,
                rule: Rc<TensorRule<D>>,
                num_elements: usize,
            ) -> Option<MatrixThunk> {
                Some(Box::new(move |k_packed: &mut [f64]| {
                    let jacobian_table =
                        JacobianTable::new(&jacobians, rule.len(), num_elements);
                    gradient_matrix_kernel::<Self, Trial, Jac, D>(
                        k_packed,
                        &cache.borrow(),
                        &jacobian_table,
                        &rule,
                        num_elements,
                    )
                }))
            }
        }
    };
}

impl_stiffness_kernel_nodal!(H1);
impl_stiffness_kernel_nodal!(L2);

impl<Trial, Jac, const P: usize, const D: usize> StiffnessKernel<Trial, Jac, D> for Hcurl<P> {
    fn stiffness_thunk(
        _cache: Rc<RefCell<Vec<Jac>>>,
        _jacobians: Rc<Vec<f64>>,
        _rule: Rc<TensorRule<D>>,
        _num_elements: usize,
    ) -> Option<MatrixThunk> {
        None
    }
}

/// One domain integral bound to a concrete kernel specialization.
///
/// The handle owns the Jacobian and coordinate tables for its elements and
/// the derivative cache; the cache is written by [`Integral::mult`] and read
/// by the gradient operations. Callers are responsible for the
/// `mult -> gradient_mult` ordering: applying the gradient before an
/// evaluation at the current state yields a stale linearization.
pub struct Integral {
    num_elements: usize,
    trial_packed_len: usize,
    test_packed_len: usize,
    element_matrix_dims: (usize, usize),
    evaluation: EvalThunk,
    gradient: EvalThunk,
    gradient_matrix: Option<MatrixThunk>,
}

impl Integral {
    /// Binds a q-function over a set of elements described by their Jacobian
    /// and physical coordinate tables (layouts `[q, i, j, e]` and
    /// `[q, i, e]`, quadrature index fastest, built with this integral's own
    /// quadrature rule).
    pub fn new_domain<Test, Trial, F, Out, const D: usize>(
        num_elements: usize,
        jacobians: Vec<f64>,
        coordinates: Vec<f64>,
        qf: F,
    ) -> Self
    where
        Test: TestElement<D> + StiffnessKernel<Trial, Out::Jacobian, D> + 'static,
        Trial: TrialElement<D> + 'static,
        Trial::QInput: MakeDual + 'static,
        F: Fn(&Vector<f64, D>, <Trial::QInput as MakeDual>::Dualized) -> Out + 'static,
        Out: ExtractDual<Value = Test::QValue> + 'static,
        Out::Jacobian: ChainRule<Trial::QInput, Output = Test::QValue> + Copy + Zero + 'static,
        Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
        Dimension<D>: ReferenceRule<D>,
    {
        let rule = Rc::new(TensorRule::<D>::gauss(points_per_dim(
            Test::ORDER,
            Trial::ORDER,
        )));
        assert_eq!(jacobians.len(), rule.len() * D * D * num_elements);
        assert_eq!(coordinates.len(), rule.len() * D * num_elements);

        // One derivative record per quadrature point, allocated once and
        // refreshed by every evaluation.
        let cache = Rc::new(RefCell::new(vec![
            <Out::Jacobian as Zero>::zero();
            rule.len() * num_elements
        ]));
        let jacobians = Rc::new(jacobians);
        let coordinates = Rc::new(coordinates);

        let evaluation: EvalThunk = {
            let cache = Rc::clone(&cache);
            let jacobians = Rc::clone(&jacobians);
            let coordinates = Rc::clone(&coordinates);
            let rule = Rc::clone(&rule);
            Box::new(move |u_packed: &[f64], r_packed: &mut [f64]| {
                let jacobian_table = JacobianTable::new(&jacobians, rule.len(), num_elements);
                let coordinate_table =
                    CoordinateTable::new(&coordinates, rule.len(), num_elements);
                evaluation_kernel::<Test, Trial, F, Out, D>(
                    u_packed,
                    r_packed,
                    &mut cache.borrow_mut(),
                    &jacobian_table,
                    &coordinate_table,
                    &rule,
                    num_elements,
                    &qf,
                )
            })
        };

        let gradient: EvalThunk = {
            let cache = Rc::clone(&cache);
            let jacobians = Rc::clone(&jacobians);
            let rule = Rc::clone(&rule);
            Box::new(move |du_packed: &[f64], dr_packed: &mut [f64]| {
                let jacobian_table = JacobianTable::new(&jacobians, rule.len(), num_elements);
                gradient_kernel::<Test, Trial, Out::Jacobian, D>(
                    du_packed,
                    dr_packed,
                    &cache.borrow(),
                    &jacobian_table,
                    &rule,
                    num_elements,
                )
            })
        };

        let gradient_matrix = <Test as StiffnessKernel<Trial, Out::Jacobian, D>>::stiffness_thunk(
            Rc::clone(&cache),
            Rc::clone(&jacobians),
            Rc::clone(&rule),
            num_elements,
        );

        Self {
            num_elements,
            trial_packed_len: Trial::NDOF * Trial::COMPONENTS * num_elements,
            test_packed_len: Test::NDOF * Test::COMPONENTS * num_elements,
            element_matrix_dims: (
                Test::NDOF * Test::COMPONENTS,
                Trial::NDOF * Trial::COMPONENTS,
            ),
            evaluation,
            gradient,
            gradient_matrix,
        }
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Length of a trial-side element-packed vector.
    pub fn trial_packed_len(&self) -> usize {
        self.trial_packed_len
    }

    /// Length of a test-side element-packed vector.
    pub fn test_packed_len(&self) -> usize {
        self.test_packed_len
    }

    /// `(rows, cols)` of one element stiffness block.
    pub fn element_matrix_dims(&self) -> (usize, usize) {
        self.element_matrix_dims
    }

    /// Length of the packed element stiffness output.
    pub fn matrix_packed_len(&self) -> usize {
        let (rows, cols) = self.element_matrix_dims;
        rows * cols * self.num_elements
    }

    /// Evaluates the residual contributions into `r_packed` (accumulating)
    /// and refreshes the derivative cache at the state `u_packed`.
    pub fn mult(&self, u_packed: &[f64], r_packed: &mut [f64]) -> Result<(), AssemblyError> {
        (self.evaluation)(u_packed, r_packed)
    }

    /// Applies the cached linearization to `du_packed`, accumulating into
    /// `dr_packed`.
    pub fn gradient_mult(
        &self,
        du_packed: &[f64],
        dr_packed: &mut [f64],
    ) -> Result<(), AssemblyError> {
        (self.gradient)(du_packed, dr_packed)
    }

    /// Whether this integral supports element stiffness assembly.
    pub fn has_gradient_matrix(&self) -> bool {
        self.gradient_matrix.is_some()
    }

    /// Assembles the element stiffness blocks from the cached linearization,
    /// accumulating into `k_packed`.
    pub fn gradient_matrix(&self, k_packed: &mut [f64]) -> Result<(), AssemblyError> {
        match &self.gradient_matrix {
            Some(thunk) => thunk(k_packed),
            None => Err(AssemblyError::UnsupportedGradientMatrix),
        }
    }
}
