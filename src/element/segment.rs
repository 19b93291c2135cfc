//! Shape function tables for segment elements on `[0, 1]`.

use crate::element::{
    lagrange_derivatives, lagrange_values, nodes, FiniteElement, NodalElement, TestElement,
    TrialElement, H1, L2,
};
use crate::qfunction::{QInput, QOutput, ScalarArg};
use crate::tensor::{dot, inv, Matrix, Vector};

macro_rules! impl_nodal_segment_scalar {
    ($space:ty, $p:literal, $ndof:literal, $nodes:expr) => {
        impl FiniteElement<1> for $space {
            const ORDER: usize = $p;
            const NDOF: usize = $ndof;
            const COMPONENTS: usize = 1;

            type Dofs = Vector<f64, $ndof>;
            type Residual = Vector<f64, $ndof>;

            fn load(u_packed: &[f64], element: usize) -> Self::Dofs {
                Vector::from_fn(|i| u_packed[element * $ndof + i])
            }

            fn store_add(r_packed: &mut [f64], element: usize, values: &Self::Residual) {
                for i in 0..$ndof {
                    r_packed[element * $ndof + i] += values[i];
                }
            }
        }

        impl NodalElement<1> for $space {
            type Shape = Vector<f64, $ndof>;
            type ShapeGrad = Matrix<f64, $ndof, 1>;

            fn shape(xi: &Vector<f64, 1>) -> Self::Shape {
                Vector(lagrange_values(&$nodes, xi[0]))
            }

            fn shape_gradients(xi: &Vector<f64, 1>) -> Self::ShapeGrad {
                let derivatives = lagrange_derivatives(&$nodes, xi[0]);
                Matrix::from_fn(|i, _| derivatives[i])
            }

            fn physical_gradients(
                xi: &Vector<f64, 1>,
                jacobian_inv: &Matrix<f64, 1, 1>,
            ) -> Self::ShapeGrad {
                dot(Self::shape_gradients(xi), *jacobian_inv)
            }
        }

        impl TrialElement<1> for $space {
            type QInput = ScalarArg<1>;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 1>,
                jacobian: &Matrix<f64, 1, 1>,
            ) -> Self::QInput {
                let jacobian_inv = inv(jacobian);
                QInput {
                    value: dot(*u, Self::shape(xi)),
                    deriv: dot(*u, Self::physical_gradients(xi, &jacobian_inv)),
                }
            }
        }

        impl TestElement<1> for $space {
            type QValue = QOutput<f64, Vector<f64, 1>>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 1>,
                jacobian: &Matrix<f64, 1, 1>,
            ) -> Self::Residual {
                let jacobian_inv = inv(jacobian);
                Self::shape(xi) * f.source
                    + dot(Self::physical_gradients(xi, &jacobian_inv), f.flux)
            }
        }
    };
}

impl_nodal_segment_scalar!(H1<1>, 1, 2, nodes::LOBATTO_2);
impl_nodal_segment_scalar!(H1<2>, 2, 3, nodes::LOBATTO_3);
impl_nodal_segment_scalar!(H1<3>, 3, 4, nodes::LOBATTO_4);

impl_nodal_segment_scalar!(L2<1>, 1, 2, nodes::LEGENDRE_2);
