//! Shape function tables for hexahedral elements on `[0, 1]^3`.
//!
//! The construction parallels the quadrilateral tables: nodal bases are
//! tensor products of 1D Lagrange polynomials (Gauss-Lobatto nodes for H1,
//! Gauss-Legendre for L2), and the H(curl) family uses first-kind Nedelec
//! tensor products with edge dofs oriented along +x/+y/+z.

use crate::element::{
    lagrange_derivatives, lagrange_values, nodes, CurlElement, FiniteElement, Hcurl, NodalElement,
    TestElement, TrialElement, H1, L2,
};
use crate::qfunction::{CurlArg3d, QInput, QOutput, ScalarArg, VectorArg};
use crate::tensor::{det, dot, inv, outer, transpose, Matrix, Vector};

macro_rules! impl_nodal_hexahedron_scalar {
    ($space:ty, $p:literal, $n1d:literal, $ndof:literal, $nodes:expr) => {
        impl FiniteElement<3> for $space {
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

        impl NodalElement<3> for $space {
            type Shape = Vector<f64, $ndof>;
            type ShapeGrad = Matrix<f64, $ndof, 3>;

            fn shape(xi: &Vector<f64, 3>) -> Self::Shape {
                let nx = lagrange_values(&$nodes, xi[0]);
                let ny = lagrange_values(&$nodes, xi[1]);
                let nz = lagrange_values(&$nodes, xi[2]);
                let mut values = [0.0; $ndof];
                let mut count = 0;
                for k in 0..$n1d {
                    for j in 0..$n1d {
                        for i in 0..$n1d {
                            values[count] = nx[i] * ny[j] * nz[k];
                            count += 1;
                        }
                    }
                }
                Vector(values)
            }

            fn shape_gradients(xi: &Vector<f64, 3>) -> Self::ShapeGrad {
                let nx = lagrange_values(&$nodes, xi[0]);
                let ny = lagrange_values(&$nodes, xi[1]);
                let nz = lagrange_values(&$nodes, xi[2]);
                let dnx = lagrange_derivatives(&$nodes, xi[0]);
                let dny = lagrange_derivatives(&$nodes, xi[1]);
                let dnz = lagrange_derivatives(&$nodes, xi[2]);
                let mut gradients = [[0.0; 3]; $ndof];
                let mut count = 0;
                for k in 0..$n1d {
                    for j in 0..$n1d {
                        for i in 0..$n1d {
                            gradients[count] = [
                                dnx[i] * ny[j] * nz[k],
                                nx[i] * dny[j] * nz[k],
                                nx[i] * ny[j] * dnz[k],
                            ];
                            count += 1;
                        }
                    }
                }
                Matrix(gradients)
            }

            fn physical_gradients(
                xi: &Vector<f64, 3>,
                jacobian_inv: &Matrix<f64, 3, 3>,
            ) -> Self::ShapeGrad {
                dot(Self::shape_gradients(xi), *jacobian_inv)
            }
        }

        impl TrialElement<3> for $space {
            type QInput = ScalarArg<3>;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 3>,
                jacobian: &Matrix<f64, 3, 3>,
            ) -> Self::QInput {
                let jacobian_inv = inv(jacobian);
                QInput {
                    value: dot(*u, Self::shape(xi)),
                    deriv: dot(*u, Self::physical_gradients(xi, &jacobian_inv)),
                }
            }
        }

        impl TestElement<3> for $space {
            type QValue = QOutput<f64, Vector<f64, 3>>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 3>,
                jacobian: &Matrix<f64, 3, 3>,
            ) -> Self::Residual {
                let jacobian_inv = inv(jacobian);
                Self::shape(xi) * f.source
                    + dot(Self::physical_gradients(xi, &jacobian_inv), f.flux)
            }
        }
    };
}

macro_rules! impl_nodal_hexahedron_vector {
    ($space:ty, $p:literal, $c:literal, $ndof:literal) => {
        impl FiniteElement<3> for $space {
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

        impl NodalElement<3> for $space {
            type Shape = Vector<f64, $ndof>;
            type ShapeGrad = Matrix<f64, $ndof, 3>;

            fn shape(xi: &Vector<f64, 3>) -> Self::Shape {
                <H1<$p, 1> as NodalElement<3>>::shape(xi)
            }

            fn shape_gradients(xi: &Vector<f64, 3>) -> Self::ShapeGrad {
                <H1<$p, 1> as NodalElement<3>>::shape_gradients(xi)
            }

            fn physical_gradients(
                xi: &Vector<f64, 3>,
                jacobian_inv: &Matrix<f64, 3, 3>,
            ) -> Self::ShapeGrad {
                dot(Self::shape_gradients(xi), *jacobian_inv)
            }
        }

        impl TrialElement<3> for $space {
            type QInput = VectorArg<$c, 3>;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 3>,
                jacobian: &Matrix<f64, 3, 3>,
            ) -> Self::QInput {
                let jacobian_inv = inv(jacobian);
                QInput {
                    value: dot(*u, Self::shape(xi)),
                    deriv: dot(*u, Self::physical_gradients(xi, &jacobian_inv)),
                }
            }
        }

        impl TestElement<3> for $space {
            type QValue = QOutput<Vector<f64, $c>, Matrix<f64, $c, 3>>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 3>,
                jacobian: &Matrix<f64, 3, 3>,
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

macro_rules! impl_hcurl_hexahedron {
    ($p:literal, $no:literal, $nc:literal, $ndof:literal, $open:expr, $closed:expr) => {
        impl FiniteElement<3> for Hcurl<$p> {
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

        impl CurlElement<3> for Hcurl<$p> {
            type ShapeVec = Matrix<f64, $ndof, 3>;
            type Curl = Matrix<f64, $ndof, 3>;

            fn shape_vectors(xi: &Vector<f64, 3>) -> Self::ShapeVec {
                let lx = lagrange_values(&$open, xi[0]);
                let ly = lagrange_values(&$open, xi[1]);
                let lz = lagrange_values(&$open, xi[2]);
                let cx = lagrange_values(&$closed, xi[0]);
                let cy = lagrange_values(&$closed, xi[1]);
                let cz = lagrange_values(&$closed, xi[2]);
                let mut values = [[0.0; 3]; $ndof];
                let mut count = 0;
                for k in 0..$nc {
                    for j in 0..$nc {
                        for i in 0..$no {
                            values[count] = [lx[i] * cy[j] * cz[k], 0.0, 0.0];
                            count += 1;
                        }
                    }
                }
                for k in 0..$nc {
                    for j in 0..$no {
                        for i in 0..$nc {
                            values[count] = [0.0, cx[i] * ly[j] * cz[k], 0.0];
                            count += 1;
                        }
                    }
                }
                for k in 0..$no {
                    for j in 0..$nc {
                        for i in 0..$nc {
                            values[count] = [0.0, 0.0, cx[i] * cy[j] * lz[k]];
                            count += 1;
                        }
                    }
                }
                Matrix(values)
            }

            fn shape_curls(xi: &Vector<f64, 3>) -> Self::Curl {
                let lx = lagrange_values(&$open, xi[0]);
                let ly = lagrange_values(&$open, xi[1]);
                let lz = lagrange_values(&$open, xi[2]);
                let cx = lagrange_values(&$closed, xi[0]);
                let cy = lagrange_values(&$closed, xi[1]);
                let cz = lagrange_values(&$closed, xi[2]);
                let dcx = lagrange_derivatives(&$closed, xi[0]);
                let dcy = lagrange_derivatives(&$closed, xi[1]);
                let dcz = lagrange_derivatives(&$closed, xi[2]);
                let mut values = [[0.0; 3]; $ndof];
                let mut count = 0;
                // curl (f, 0, 0) = (0, df/dz, -df/dy)
                for k in 0..$nc {
                    for j in 0..$nc {
                        for i in 0..$no {
                            values[count] =
                                [0.0, lx[i] * cy[j] * dcz[k], -lx[i] * dcy[j] * cz[k]];
                            count += 1;
                        }
                    }
                }
                // curl (0, f, 0) = (-df/dz, 0, df/dx)
                for k in 0..$nc {
                    for j in 0..$no {
                        for i in 0..$nc {
                            values[count] =
                                [-cx[i] * ly[j] * dcz[k], 0.0, dcx[i] * ly[j] * cz[k]];
                            count += 1;
                        }
                    }
                }
                // curl (0, 0, f) = (df/dy, -df/dx, 0)
                for k in 0..$no {
                    for j in 0..$nc {
                        for i in 0..$nc {
                            values[count] =
                                [cx[i] * dcy[j] * lz[k], -dcx[i] * cy[j] * lz[k], 0.0];
                            count += 1;
                        }
                    }
                }
                Matrix(values)
            }
        }

        impl TrialElement<3> for Hcurl<$p> {
            type QInput = CurlArg3d;

            fn preprocess(
                u: &Self::Dofs,
                xi: &Vector<f64, 3>,
                jacobian: &Matrix<f64, 3, 3>,
            ) -> Self::QInput {
                let value = dot(*u, dot(Self::shape_vectors(xi), inv(jacobian)));
                let curl = dot(*u, Self::shape_curls(xi) / det(jacobian));
                QInput {
                    value,
                    deriv: dot(curl, transpose(*jacobian)),
                }
            }
        }

        impl TestElement<3> for Hcurl<$p> {
            type QValue = QOutput<Vector<f64, 3>, Vector<f64, 3>>;

            fn postprocess(
                f: &Self::QValue,
                xi: &Vector<f64, 3>,
                jacobian: &Matrix<f64, 3, 3>,
            ) -> Self::Residual {
                let w = dot(Self::shape_vectors(xi), inv(jacobian));
                let curl_w = dot(
                    Self::shape_curls(xi) / det(jacobian),
                    transpose(*jacobian),
                );
                dot(w, f.source) + dot(curl_w, f.flux)
            }
        }
    };
}

impl_nodal_hexahedron_scalar!(H1<1>, 1, 2, 8, nodes::LOBATTO_2);
impl_nodal_hexahedron_scalar!(H1<2>, 2, 3, 27, nodes::LOBATTO_3);

impl_nodal_hexahedron_scalar!(L2<1>, 1, 2, 8, nodes::LEGENDRE_2);

impl_nodal_hexahedron_vector!(H1<1, 3>, 1, 3, 8);

impl_hcurl_hexahedron!(1, 1, 2, 12, nodes::LEGENDRE_1, nodes::LOBATTO_2);
