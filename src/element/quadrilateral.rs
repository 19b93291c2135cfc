//! Shape function tables for quadrilateral elements on `[0, 1]^2`.
//!
//! Nodal bases are tensor products of 1D Lagrange polynomials: Gauss-Lobatto
//! nodes for H1, Gauss-Legendre nodes for L2. The H(curl) family uses
//! first-kind Nedelec tensor products with open points along the tangential
//! direction and closed points across it; edge dofs point along +x/+y.

use crate::element::{
    lagrange_derivatives, lagrange_values, nodes, CurlElement, FiniteElement, Hcurl, NodalElement,
    TestElement, TrialElement, H1, L2,
};
use crate::qfunction::{CurlArg2d, QInput, QOutput, ScalarArg, VectorArg};
use crate::tensor::{det, dot, inv, outer, transpose, Matrix, Vector};

macro_rules! impl_nodal_quadrilateral_scalar {
    ($space:ty, $p:literal, $n1d:literal, $ndof:literal, $nodes:expr) => {
        impl FiniteElement<2> for $space {
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

        impl NodalElement<2> for $space {
            type Shape = Vector<f64, $ndof>;
            type ShapeGrad = Matrix<f64, $ndof, 2>;

            fn shape(xi: &Vector<f64, 2>) -> Self::Shape {
                let nx = lagrange_values(&$nodes, xi[0]);
                let ny = lagrange_values(&$nodes, xi[1]);
                let mut values = [0.0; $ndof];
                let mut count = 0;
                for j in 0..$n1d {
                    for i in 0..$n1d {
                        values[count] = nx[i] * ny[j];
                        count += 1;
                    }
                }
                Vector(values)
            }

            fn shape_gradients(xi: &Vector<f64, 2>) -> Self::ShapeGrad {
                let nx = lagrange_values(&$nodes, xi[0]);
                let ny = lagrange_values(&$nodes, xi[1]);
                let dnx = lagrange_derivatives(&$nodes, xi[0]);
                let dny = lagrange_derivatives(&$nodes, xi[1]);
                let mut gradients = [[0.0; 2]; $ndof];
                let mut count = 0;
                for j in 0..$n1d {
                    for i in 0..$n1d {
                        gradients[count] = [dnx[i] * ny[j], nx[i] * dny[j]];
                        count += 1;
                    }
                }
                Matrix(gradients)
            }

            fn physical_gradients(
                xi: &Vector<f64, 2>,
                jacobian_inv: &Matrix<f64, 2, 2>,
            ) -> Self::ShapeGrad {
                dot(Self::shape_gradients(xi), *jacobian_inv)
            }
        }

        impl TrialElement<2> for $space {
            type QInput = ScalarArg<2>;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 2>,
                jacobian: &Matrix<f64, 2, 2>,
            ) -> Self::QInput {
                let jacobian_inv = inv(jacobian);
                QInput {
                    value: dot(*u, Self::shape(xi)),
                    deriv: dot(*u, Self::physical_gradients(xi, &jacobian_inv)),
                }
            }
        }

        impl TestElement<2> for $space {
            type QValue = QOutput<f64, Vector<f64, 2>>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 2>,
                jacobian: &Matrix<f64, 2, 2>,
            ) -> Self::Residual {
                let jacobian_inv = inv(jacobian);
                Self::shape(xi) * f.source
                    + dot(Self::physical_gradients(xi, &jacobian_inv), f.flux)
            }
        }
    };
}

macro_rules! impl_nodal_quadrilateral_vector {
    ($space:ty, $p:literal, $c:literal, $n1d:literal, $ndof:literal, $nodes:expr) => {
        impl FiniteElement<2> for $space {
            const ORDER: usize = $p;
            const NDOF: usize = $ndof;
            const COMPONENTS: usize = $c;

            type Dofs = Matrix<f64, $c, $ndof>;
            type Residual = Matrix<f64, $ndof, $c>;

            fn load(u_packed: &[f64], element: usize) -> Self::Dofs {
                Matrix::from_fn(|comp, i| u_packed[i + $ndof * (comp + $c * element)])
            }

            fn store_add(r_packed: &mut [f64], element: usize, values: &Self::Residual) {
                for i in 0..$ndof {
                    for comp in 0..$c {
                        r_packed[i + $ndof * (comp + $c * element)] += values[i][comp];
                    }
                }
            }
        }

        impl NodalElement<2> for $space {
            type Shape = Vector<f64, $ndof>;
            type ShapeGrad = Matrix<f64, $ndof, 2>;

            fn shape(xi: &Vector<f64, 2>) -> Self::Shape {
                <H1<$p, 1> as NodalElement<2>>::shape(xi)
            }

            fn shape_gradients(xi: &Vector<f64, 2>) -> Self::ShapeGrad {
                <H1<$p, 1> as NodalElement<2>>::shape_gradients(xi)
            }

            fn physical_gradients(
                xi: &Vector<f64, 2>,
                jacobian_inv: &Matrix<f64, 2, 2>,
            ) -> Self::ShapeGrad {
                dot(Self::shape_gradients(xi), *jacobian_inv)
            }
        }

        impl TrialElement<2> for $space {
            type QInput = VectorArg<$c, 2>;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 2>,
                jacobian: &Matrix<f64, 2, 2>,
            ) -> Self::QInput {
                let jacobian_inv = inv(jacobian);
                QInput {
                    value: dot(*u, Self::shape(xi)),
                    deriv: dot(*u, Self::physical_gradients(xi, &jacobian_inv)),
                }
            }
        }

        impl TestElement<2> for $space {
            type QValue = QOutput<Vector<f64, $c>, Matrix<f64, $c, 2>>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 2>,
                jacobian: &Matrix<f64, 2, 2>,
            ) -> Self::Residual {
                let jacobian_inv = inv(jacobian);
                outer(Self::shape(xi), f.source)
                    + dot(
                        Self::physical_gradients(xi, &jacobian_inv),
                        transpose(f.flux),
                    )
            }
        }
    };
}

macro_rules! impl_hcurl_quadrilateral {
    ($p:literal, $no:literal, $nc:literal, $ndof:literal, $open:expr, $closed:expr) => {
        impl FiniteElement<2> for Hcurl<$p> {
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

        impl CurlElement<2> for Hcurl<$p> {
            type ShapeVec = Matrix<f64, $ndof, 2>;
            type Curl = Vector<f64, $ndof>;

            fn shape_vectors(xi: &Vector<f64, 2>) -> Self::ShapeVec {
                let lx = lagrange_values(&$open, xi[0]);
                let cy = lagrange_values(&$closed, xi[1]);
                let cx = lagrange_values(&$closed, xi[0]);
                let ly = lagrange_values(&$open, xi[1]);
                let mut values = [[0.0; 2]; $ndof];
                let mut count = 0;
                for j in 0..$nc {
                    for i in 0..$no {
                        values[count] = [lx[i] * cy[j], 0.0];
                        count += 1;
                    }
                }
                for j in 0..$no {
                    for i in 0..$nc {
                        values[count] = [0.0, cx[i] * ly[j]];
                        count += 1;
                    }
                }
                Matrix(values)
            }

            fn shape_curls(xi: &Vector<f64, 2>) -> Self::Curl {
                // curl N = d N_y / d xi_0 - d N_x / d xi_1
                let lx = lagrange_values(&$open, xi[0]);
                let dcy = lagrange_derivatives(&$closed, xi[1]);
                let dcx = lagrange_derivatives(&$closed, xi[0]);
                let ly = lagrange_values(&$open, xi[1]);
                let mut values = [0.0; $ndof];
                let mut count = 0;
                for j in 0..$nc {
                    for i in 0..$no {
                        values[count] = -lx[i] * dcy[j];
                        count += 1;
                    }
                }
                for j in 0..$no {
                    for i in 0..$nc {
                        values[count] = dcx[i] * ly[j];
                        count += 1;
                    }
                }
                Vector(values)
            }
        }

        impl TrialElement<2> for Hcurl<$p> {
            type QInput = CurlArg2d;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 2>,
                jacobian: &Matrix<f64, 2, 2>,
            ) -> Self::QInput {
                QInput {
                    value: dot(*u, dot(Self::shape_vectors(xi), inv(jacobian))),
                    deriv: dot(*u, Self::shape_curls(xi) / det(jacobian)),
                }
            }
        }

        impl TestElement<2> for Hcurl<$p> {
            type QValue = QOutput<Vector<f64, 2>, f64>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 2>,
                jacobian: &Matrix<f64, 2, 2>,
            ) -> Self::Residual {
                let w = dot(Self::shape_vectors(xi), inv(jacobian));
                let curl_w = Self::shape_curls(xi) / det(jacobian);
                dot(w, f.source) + curl_w * f.flux
            }
        }
    };
}

impl_nodal_quadrilateral_scalar!(H1<1>, 1, 2, 4, nodes::LOBATTO_2);
impl_nodal_quadrilateral_scalar!(H1<2>, 2, 3, 9, nodes::LOBATTO_3);
impl_nodal_quadrilateral_scalar!(H1<3>, 3, 4, 16, nodes::LOBATTO_4);

impl_nodal_quadrilateral_scalar!(L2<0>, 0, 1, 1, nodes::LEGENDRE_1);
impl_nodal_quadrilateral_scalar!(L2<1>, 1, 2, 4, nodes::LEGENDRE_2);
impl_nodal_quadrilateral_scalar!(L2<2>, 2, 3, 9, nodes::LEGENDRE_3);

impl_nodal_quadrilateral_vector!(H1<1, 2>, 1, 2, 2, 4, nodes::LOBATTO_2);
impl_nodal_quadrilateral_vector!(H1<2, 2>, 2, 2, 3, 9, nodes::LOBATTO_3);

impl_hcurl_quadrilateral!(1, 1, 2, 4, nodes::LEGENDRE_1, nodes::LOBATTO_2);
impl_hcurl_quadrilateral!(2, 2, 3, 12, nodes::LEGENDRE_2, nodes::LOBATTO_3);
