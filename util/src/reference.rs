//! Hand-written reference integrators.
//!
//! Classical dense element loops for the bilinear forms used by the
//! comparison tests. These share the shape function tables with the engine
//! (the tables themselves are validated separately by partition-of-unity and
//! interpolation tests) but none of its kernels, dual numbers or caching, so
//! agreement between the two paths validates the engine machinery.

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::ops::Index;
use varform::assembly::{CoordinateTable, JacobianTable};
use varform::element::{CurlElement, NodalElement};
use varform::mesh::DomainMesh;
use varform::quadrature::{points_per_dim, Dimension, ReferenceRule, TensorRule};
use varform::space::FunctionSpace;
use varform::tensor::{det, inv, transpose, Matrix, SquareMatrix, Vector};

/// Element matrices of `a M + b K` (mass plus diffusion) for a scalar nodal
/// space, packed as row-major `NDOF x NDOF` blocks, one per element.
pub fn scalar_element_matrices<E, M, const D: usize>(
    mesh: &M,
    mass_coefficient: f64,
    diffusion_coefficient: f64,
) -> Vec<f64>
where
    E: NodalElement<D>,
    M: DomainMesh<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
    Dimension<D>: ReferenceRule<D>,
{
    let rule = TensorRule::<D>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let table = JacobianTable::<D>::new(&jacobians, rule.len(), mesh.num_elements());
    let n = E::NDOF;

    let mut blocks = vec![0.0; n * n * mesh.num_elements()];
    for e in 0..mesh.num_elements() {
        let block = &mut blocks[e * n * n..(e + 1) * n * n];
        for (q, (w, xi)) in rule.iter().enumerate() {
            let jacobian = table.jacobian(q, e);
            let jacobian_inv = inv(&jacobian);
            let dx = det(&jacobian) * w;
            let shape = E::shape(&xi);
            let gradients = E::physical_gradients(&xi, &jacobian_inv);
            for i in 0..n {
                for j in 0..n {
                    let mut value = mass_coefficient * shape[i] * shape[j];
                    let mut gradient_dot = 0.0;
                    for k in 0..D {
                        gradient_dot += gradients[i][k] * gradients[j][k];
                    }
                    value += diffusion_coefficient * gradient_dot;
                    block[i * n + j] += value * dx;
                }
            }
        }
    }
    blocks
}

/// Global `a M + b K` for a scalar nodal space.
pub fn scalar_mass_diffusion<E, M, const D: usize>(
    mesh: &M,
    space: &FunctionSpace,
    mass_coefficient: f64,
    diffusion_coefficient: f64,
) -> CsrMatrix<f64>
where
    E: NodalElement<D>,
    M: DomainMesh<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
    Dimension<D>: ReferenceRule<D>,
{
    let blocks =
        scalar_element_matrices::<E, M, D>(mesh, mass_coefficient, diffusion_coefficient);
    let n = E::NDOF;
    let mut coo = CooMatrix::new(space.num_dofs(), space.num_dofs());
    for e in 0..mesh.num_elements() {
        for i in 0..n {
            for j in 0..n {
                coo.push(
                    space.global_dof(e, i, 0),
                    space.global_dof(e, j, 0),
                    blocks[e * n * n + i * n + j],
                );
            }
        }
    }
    CsrMatrix::from(&coo)
}

/// Global load vector `F_i = integral N_i f(x) dx` for a scalar nodal space.
pub fn scalar_load<E, M, const D: usize>(
    mesh: &M,
    space: &FunctionSpace,
    f: impl Fn(&Vector<f64, D>) -> f64,
) -> DVector<f64>
where
    E: NodalElement<D>,
    M: DomainMesh<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
    Dimension<D>: ReferenceRule<D>,
{
    let rule = TensorRule::<D>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let coordinates = mesh.coordinate_table(&rule);
    let jacobian_table = JacobianTable::<D>::new(&jacobians, rule.len(), mesh.num_elements());
    let coordinate_table =
        CoordinateTable::<D>::new(&coordinates, rule.len(), mesh.num_elements());

    let mut load = DVector::zeros(space.num_dofs());
    for e in 0..mesh.num_elements() {
        for (q, (w, xi)) in rule.iter().enumerate() {
            let dx = det(&jacobian_table.jacobian(q, e)) * w;
            let value = f(&coordinate_table.point(q, e));
            let shape = E::shape(&xi);
            for i in 0..E::NDOF {
                load[space.global_dof(e, i, 0)] += shape[i] * value * dx;
            }
        }
    }
    load
}

/// Element matrices of `a M + Elasticity(lambda, mu)` for a vector nodal
/// space, packed as row-major `(NDOF C) x (NDOF C)` blocks with interleaved
/// components.
pub fn vector_element_matrices<E, M, const D: usize>(
    mesh: &M,
    mass_coefficient: f64,
    lambda: f64,
    mu: f64,
) -> Vec<f64>
where
    E: NodalElement<D>,
    M: DomainMesh<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
    Dimension<D>: ReferenceRule<D>,
{
    let rule = TensorRule::<D>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let table = JacobianTable::<D>::new(&jacobians, rule.len(), mesh.num_elements());
    let n = E::NDOF;
    let c = E::COMPONENTS;
    let size = n * c;

    let mut blocks = vec![0.0; size * size * mesh.num_elements()];
    for e in 0..mesh.num_elements() {
        let block = &mut blocks[e * size * size..(e + 1) * size * size];
        for (q, (w, xi)) in rule.iter().enumerate() {
            let jacobian = table.jacobian(q, e);
            let jacobian_inv = inv(&jacobian);
            let dx = det(&jacobian) * w;
            let shape = E::shape(&xi);
            let gradients = E::physical_gradients(&xi, &jacobian_inv);
            for i in 0..n {
                for j in 0..n {
                    let mut gradient_dot = 0.0;
                    for k in 0..D {
                        gradient_dot += gradients[i][k] * gradients[j][k];
                    }
                    for id in 0..c {
                        for jd in 0..c {
                            let mut value =
                                lambda * gradients[i][id] * gradients[j][jd]
                                    + mu * gradients[i][jd] * gradients[j][id];
                            if id == jd {
                                value += mass_coefficient * shape[i] * shape[j]
                                    + mu * gradient_dot;
                            }
                            block[(i * c + id) * size + (j * c + jd)] += value * dx;
                        }
                    }
                }
            }
        }
    }
    blocks
}

/// Global `a M + Elasticity(lambda, mu)` for a vector nodal space.
pub fn vector_mass_elasticity<E, M, const D: usize>(
    mesh: &M,
    space: &FunctionSpace,
    mass_coefficient: f64,
    lambda: f64,
    mu: f64,
) -> CsrMatrix<f64>
where
    E: NodalElement<D>,
    M: DomainMesh<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
    Dimension<D>: ReferenceRule<D>,
{
    let blocks = vector_element_matrices::<E, M, D>(mesh, mass_coefficient, lambda, mu);
    let n = E::NDOF;
    let c = E::COMPONENTS;
    let size = n * c;
    let mut coo = CooMatrix::new(space.num_dofs(), space.num_dofs());
    for e in 0..mesh.num_elements() {
        for i in 0..n {
            for id in 0..c {
                for j in 0..n {
                    for jd in 0..c {
                        coo.push(
                            space.global_dof(e, i, id),
                            space.global_dof(e, j, jd),
                            blocks[e * size * size + (i * c + id) * size + (j * c + jd)],
                        );
                    }
                }
            }
        }
    }
    CsrMatrix::from(&coo)
}

/// Global load vector for a vector nodal space; `f(x, component)` gives the
/// body force components.
pub fn vector_load<E, M, const D: usize>(
    mesh: &M,
    space: &FunctionSpace,
    f: impl Fn(&Vector<f64, D>, usize) -> f64,
) -> DVector<f64>
where
    E: NodalElement<D>,
    M: DomainMesh<D>,
    Matrix<f64, D, D>: SquareMatrix<Scalar = f64>,
    Dimension<D>: ReferenceRule<D>,
{
    let rule = TensorRule::<D>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let coordinates = mesh.coordinate_table(&rule);
    let jacobian_table = JacobianTable::<D>::new(&jacobians, rule.len(), mesh.num_elements());
    let coordinate_table =
        CoordinateTable::<D>::new(&coordinates, rule.len(), mesh.num_elements());

    let mut load = DVector::zeros(space.num_dofs());
    for e in 0..mesh.num_elements() {
        for (q, (w, xi)) in rule.iter().enumerate() {
            let dx = det(&jacobian_table.jacobian(q, e)) * w;
            let x = coordinate_table.point(q, e);
            let shape = E::shape(&xi);
            for i in 0..E::NDOF {
                for comp in 0..E::COMPONENTS {
                    load[space.global_dof(e, i, comp)] += shape[i] * f(&x, comp) * dx;
                }
            }
        }
    }
    load
}

/// Global `a M + b CurlCurl` for a 2D H(curl) space.
pub fn hcurl_mass_curlcurl_2d<E, M>(
    mesh: &M,
    space: &FunctionSpace,
    mass_coefficient: f64,
    curl_coefficient: f64,
) -> CsrMatrix<f64>
where
    E: CurlElement<2>,
    E::ShapeVec: Index<usize, Output = [f64; 2]>,
    E::Curl: Index<usize, Output = f64>,
    M: DomainMesh<2>,
{
    let rule = TensorRule::<2>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let table = JacobianTable::<2>::new(&jacobians, rule.len(), mesh.num_elements());
    let n = E::NDOF;

    let mut coo = CooMatrix::new(space.num_dofs(), space.num_dofs());
    let mut block = vec![0.0; n * n];
    for e in 0..mesh.num_elements() {
        block.fill(0.0);
        for (q, (w, xi)) in rule.iter().enumerate() {
            let jacobian = table.jacobian(q, e);
            let jacobian_inv = inv(&jacobian);
            let det_j = det(&jacobian);
            let dx = det_j * w;
            let vectors = E::shape_vectors(&xi);
            let curls = E::shape_curls(&xi);

            // Covariant transform: w_i = N_i J^{-1}, curl w_i = curl N_i / det J
            let physical = |i: usize| {
                let row = vectors[i];
                [
                    row[0] * jacobian_inv[0][0] + row[1] * jacobian_inv[1][0],
                    row[0] * jacobian_inv[0][1] + row[1] * jacobian_inv[1][1],
                ]
            };

            for i in 0..n {
                let wi = physical(i);
                let curl_i = curls[i] / det_j;
                for j in 0..n {
                    let wj = physical(j);
                    let curl_j = curls[j] / det_j;
                    let value = mass_coefficient * (wi[0] * wj[0] + wi[1] * wj[1])
                        + curl_coefficient * curl_i * curl_j;
                    block[i * n + j] += value * dx;
                }
            }
        }
        for i in 0..n {
            for j in 0..n {
                coo.push(
                    space.global_dof(e, i, 0),
                    space.global_dof(e, j, 0),
                    block[i * n + j],
                );
            }
        }
    }
    CsrMatrix::from(&coo)
}

/// Global load vector `F_i = integral w_i . f(x) dx` for a 2D H(curl) space.
pub fn hcurl_load_2d<E, M>(
    mesh: &M,
    space: &FunctionSpace,
    f: impl Fn(&Vector<f64, 2>) -> [f64; 2],
) -> DVector<f64>
where
    E: CurlElement<2>,
    E::ShapeVec: Index<usize, Output = [f64; 2]>,
    M: DomainMesh<2>,
{
    let rule = TensorRule::<2>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let coordinates = mesh.coordinate_table(&rule);
    let jacobian_table = JacobianTable::<2>::new(&jacobians, rule.len(), mesh.num_elements());
    let coordinate_table =
        CoordinateTable::<2>::new(&coordinates, rule.len(), mesh.num_elements());

    let mut load = DVector::zeros(space.num_dofs());
    for e in 0..mesh.num_elements() {
        for (q, (w, xi)) in rule.iter().enumerate() {
            let jacobian = jacobian_table.jacobian(q, e);
            let jacobian_inv = inv(&jacobian);
            let dx = det(&jacobian) * w;
            let value = f(&coordinate_table.point(q, e));
            let vectors = E::shape_vectors(&xi);
            for i in 0..E::NDOF {
                let row = vectors[i];
                let wi = [
                    row[0] * jacobian_inv[0][0] + row[1] * jacobian_inv[1][0],
                    row[0] * jacobian_inv[0][1] + row[1] * jacobian_inv[1][1],
                ];
                load[space.global_dof(e, i, 0)] += (wi[0] * value[0] + wi[1] * value[1]) * dx;
            }
        }
    }
    load
}

/// Global `a M + b CurlCurl` for a 3D H(curl) space.
pub fn hcurl_mass_curlcurl_3d<E, M>(
    mesh: &M,
    space: &FunctionSpace,
    mass_coefficient: f64,
    curl_coefficient: f64,
) -> CsrMatrix<f64>
where
    E: CurlElement<3>,
    E::ShapeVec: Index<usize, Output = [f64; 3]>,
    E::Curl: Index<usize, Output = [f64; 3]>,
    M: DomainMesh<3>,
{
    let rule = TensorRule::<3>::gauss(points_per_dim(E::ORDER, E::ORDER));
    let jacobians = mesh.jacobian_table(&rule);
    let table = JacobianTable::<3>::new(&jacobians, rule.len(), mesh.num_elements());
    let n = E::NDOF;

    let mut coo = CooMatrix::new(space.num_dofs(), space.num_dofs());
    let mut block = vec![0.0; n * n];
    for e in 0..mesh.num_elements() {
        block.fill(0.0);
        for (q, (w, xi)) in rule.iter().enumerate() {
            let jacobian = table.jacobian(q, e);
            let jacobian_inv = inv(&jacobian);
            let jacobian_t = transpose(jacobian);
            let det_j = det(&jacobian);
            let dx = det_j * w;
            let vectors = E::shape_vectors(&xi);
            let curls = E::shape_curls(&xi);

            // w_i = N_i J^{-1}; curl w_i = (curl N_i / det J) J^T
            let physical_value = |i: usize| {
                let row = vectors[i];
                let mut out = [0.0; 3];
                for k in 0..3 {
                    for m in 0..3 {
                        out[k] += row[m] * jacobian_inv[m][k];
                    }
                }
                out
            };
            let physical_curl = |i: usize| {
                let row = curls[i];
                let mut out = [0.0; 3];
                for k in 0..3 {
                    for m in 0..3 {
                        out[k] += row[m] / det_j * jacobian_t[m][k];
                    }
                }
                out
            };

            for i in 0..n {
                let wi = physical_value(i);
                let ci = physical_curl(i);
                for j in 0..n {
                    let wj = physical_value(j);
                    let cj = physical_curl(j);
                    let mut value = 0.0;
                    for k in 0..3 {
                        value += mass_coefficient * wi[k] * wj[k]
                            + curl_coefficient * ci[k] * cj[k];
                    }
                    block[i * n + j] += value * dx;
                }
            }
        }
        for i in 0..n {
            for j in 0..n {
                coo.push(
                    space.global_dof(e, i, 0),
                    space.global_dof(e, j, 0),
                    block[i * n + j],
                );
            }
        }
    }
    CsrMatrix::from(&coo)
}
