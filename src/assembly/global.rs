//! The weak form operator facade.
//!
//! A [`WeakForm`] aggregates domain integrals over a (test, trial) space
//! pair and presents them as a nonlinear operator `U -> R(U)` with an
//! attached linearization. Restriction and prolongation between global and
//! element-packed vectors go through the function spaces; essential
//! (Dirichlet) dofs are eliminated on the way out: residual entries are
//! zeroed, and the gradient operator acts as the identity on essential
//! rows and columns.

use crate::assembly::integral::{Integral, StiffnessKernel};
use crate::element::{TestElement, TrialElement};
use crate::mesh::DomainMesh;
use crate::qfunction::{ChainRule, ExtractDual, MakeDual};
use crate::quadrature::{points_per_dim, Dimension, ReferenceRule, TensorRule};
use crate::space::FunctionSpace;
use crate::tensor::{Matrix, SquareMatrix, Vector};
use eyre::ensure;
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use num::Zero;
use std::marker::PhantomData;

/// A collection of integrals acting as a nonlinear residual operator.
///
/// The `Test` and `Trial` tags fix the element families; the function
/// spaces carry the matching global dof numbering. The legal call order for
/// a state `U` is `residual(U)` followed by the gradient operations: the
/// gradient reuses the linearization recorded by the last residual
/// evaluation.
pub struct WeakForm<'a, Test, Trial> {
    test_space: &'a FunctionSpace,
    trial_space: &'a FunctionSpace,
    integrals: Vec<Integral>,
    essential_dofs: Vec<usize>,
    marker: PhantomData<fn() -> (Test, Trial)>,
}

impl<'a, Test, Trial> WeakForm<'a, Test, Trial> {
    pub fn new(test_space: &'a FunctionSpace, trial_space: &'a FunctionSpace) -> Self {
        Self {
            test_space,
            trial_space,
            integrals: Vec::new(),
            essential_dofs: Vec::new(),
            marker: PhantomData,
        }
    }

    /// Declares the essential (Dirichlet) dofs, as global dof indices.
    pub fn set_essential_dofs(&mut self, mut dofs: Vec<usize>) {
        dofs.sort_unstable();
        dofs.dedup();
        self.essential_dofs = dofs;
    }

    /// Adds a domain integral with the given q-function over the volumetric
    /// elements of `mesh`.
    pub fn add_domain_integral<M, F, Out, const D: usize>(&mut self, mesh: &M, qf: F)
    where
        M: DomainMesh<D>,
        Test: TestElement<D> + StiffnessKernel<Trial, Out::Jacobian, D> + 'static,
        Trial: TrialElement<D> + 'static,
        Trial::QInput: MakeDual + 'static,
        F: Fn(&Vector<f64, D>, <Trial::QInput as MakeDual>::Dualized) -> Out + 'static,
        Out: ExtractDual<Value = Test::QValue> + 'static,
        Out::Jacobian: ChainRule<Trial::QInput, Output = Test::QValue> + Copy + Zero + 'static,
        Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
        Dimension<D>: ReferenceRule<D>,
    {
        debug_assert_eq!(self.trial_space.ndof_per_element(), Trial::NDOF);
        debug_assert_eq!(self.trial_space.components(), Trial::COMPONENTS);
        debug_assert_eq!(self.test_space.ndof_per_element(), Test::NDOF);
        debug_assert_eq!(self.test_space.components(), Test::COMPONENTS);
        debug_assert_eq!(self.trial_space.num_elements(), mesh.num_elements());

        let rule = TensorRule::<D>::gauss(points_per_dim(Test::ORDER, Trial::ORDER));
        let jacobians = mesh.jacobian_table(&rule);
        let coordinates = mesh.coordinate_table(&rule);
        debug!(
            "adding domain integral: {} elements, {} quadrature points each",
            mesh.num_elements(),
            rule.len()
        );
        self.integrals.push(Integral::new_domain::<Test, Trial, F, Out, D>(
            mesh.num_elements(),
            jacobians,
            coordinates,
            qf,
        ));
    }

    /// Evaluates the residual `R(U)`, refreshing the linearization of every
    /// integral at the state `u`.
    pub fn residual(&self, u: &DVector<f64>) -> eyre::Result<DVector<f64>> {
        ensure!(
            u.len() == self.trial_space.num_dofs(),
            "state vector has length {}, expected {}",
            u.len(),
            self.trial_space.num_dofs()
        );
        let u_packed = self.trial_space.gather(u);
        let mut r = DVector::zeros(self.test_space.num_dofs());
        let mut r_packed = vec![0.0; self.test_space.packed_len()];
        for integral in &self.integrals {
            r_packed.fill(0.0);
            integral.mult(&u_packed, &mut r_packed)?;
            self.test_space.scatter_add(&r_packed, &mut r);
        }
        for &dof in &self.essential_dofs {
            r[dof] = 0.0;
        }
        Ok(r)
    }

    /// The linearization of the residual at the state of the most recent
    /// [`WeakForm::residual`] call.
    ///
    /// The state argument documents the linearization point; the cached
    /// derivative data is only valid if `residual` was evaluated at the same
    /// state since the last state change.
    pub fn gradient(&self, u: &DVector<f64>) -> WeakFormGradient<'_, 'a, Test, Trial> {
        debug_assert_eq!(u.len(), self.trial_space.num_dofs());
        WeakFormGradient { form: self }
    }
}

/// Linear operator view of a weak form's Jacobian.
pub struct WeakFormGradient<'b, 'a, Test, Trial> {
    form: &'b WeakForm<'a, Test, Trial>,
}

impl<'b, 'a, Test, Trial> WeakFormGradient<'b, 'a, Test, Trial> {
    /// Applies the Jacobian to a direction `du`.
    pub fn mult(&self, du: &DVector<f64>) -> eyre::Result<DVector<f64>> {
        let form = self.form;
        ensure!(
            du.len() == form.trial_space.num_dofs(),
            "direction vector has length {}, expected {}",
            du.len(),
            form.trial_space.num_dofs()
        );

        // Essential columns are eliminated from the action, essential rows
        // pass the input through unchanged.
        let mut du_interior = du.clone();
        for &dof in &form.essential_dofs {
            du_interior[dof] = 0.0;
        }

        let du_packed = form.trial_space.gather(&du_interior);
        let mut dr = DVector::zeros(form.test_space.num_dofs());
        let mut dr_packed = vec![0.0; form.test_space.packed_len()];
        for integral in &form.integrals {
            dr_packed.fill(0.0);
            integral.gradient_mult(&du_packed, &mut dr_packed)?;
            form.test_space.scatter_add(&dr_packed, &mut dr);
        }
        for &dof in &form.essential_dofs {
            dr[dof] = du[dof];
        }
        Ok(dr)
    }

    /// Assembles the global Jacobian as a sparse matrix.
    ///
    /// Element stiffness blocks are computed per integral and summed into
    /// the global matrix; essential rows and columns are eliminated and
    /// replaced by a unit diagonal.
    pub fn assemble_matrix(&self) -> eyre::Result<CsrMatrix<f64>> {
        let form = self.form;
        let num_rows = form.test_space.num_dofs();
        let num_cols = form.trial_space.num_dofs();

        let mut essential = vec![false; num_rows.max(num_cols)];
        for &dof in &form.essential_dofs {
            essential[dof] = true;
        }

        let mut coo = CooMatrix::new(num_rows, num_cols);
        for integral in &form.integrals {
            ensure!(
                integral.has_gradient_matrix(),
                "matrix assembly requires a nodal test space for every integral"
            );
            let mut k_packed = vec![0.0; integral.matrix_packed_len()];
            integral.gradient_matrix(&mut k_packed)?;

            let (rows, cols) = integral.element_matrix_dims();
            let test_c = form.test_space.components();
            let trial_c = form.trial_space.components();
            for e in 0..integral.num_elements() {
                let block = &k_packed[e * rows * cols..(e + 1) * rows * cols];
                for row in 0..rows {
                    let row_dof = form.test_space.global_dof(e, row / test_c, row % test_c);
                    if essential[row_dof] {
                        continue;
                    }
                    for col in 0..cols {
                        let col_dof =
                            form.trial_space.global_dof(e, col / trial_c, col % trial_c);
                        if essential[col_dof] {
                            continue;
                        }
                        let value = block[row * cols + col];
                        if value != 0.0 {
                            coo.push(row_dof, col_dof, value);
                        }
                    }
                }
            }
        }

        for &dof in &form.essential_dofs {
            coo.push(dof, dof, 1.0);
        }

        // The conversion combines duplicate entries by summation.
        let csr = CsrMatrix::from(&coo);
        debug!(
            "assembled {}x{} Jacobian with {} structural nonzeros",
            num_rows,
            num_cols,
            csr.nnz()
        );
        Ok(csr)
    }
}
