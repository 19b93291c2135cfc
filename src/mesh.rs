//! Structured quadrilateral and hexahedral meshes.
//!
//! These meshes stand in for the host FE library of a full application: they
//! supply element counts, geometry-map Jacobian tables and physical
//! coordinate tables to the assembly layer. Connectivity is always a
//! Cartesian lattice (element `e` decomposes as `ex + nx * (ey + ny * ez)`),
//! but vertex positions are free, so distorted geometries exercise the
//! non-affine code paths.

use crate::element::{Geometry, NodalElement, H1};
use crate::quadrature::TensorRule;
use crate::tensor::{Matrix, Vector};

/// Meshes that can drive a domain integral of reference dimension `D`.
pub trait DomainMesh<const D: usize> {
    fn num_elements(&self) -> usize;
    fn geometry(&self) -> Geometry;

    /// Geometry-map Jacobians at every quadrature point of every element,
    /// layout `[q, i, j, e]` with the quadrature index fastest.
    fn jacobian_table(&self, rule: &TensorRule<D>) -> Vec<f64>;

    /// Physical quadrature point positions, layout `[q, i, e]` with the
    /// quadrature index fastest.
    fn coordinate_table(&self, rule: &TensorRule<D>) -> Vec<f64>;
}

/// A structured quadrilateral mesh with bilinear geometry.
#[derive(Debug, Clone)]
pub struct QuadMesh {
    num_cells: [usize; 2],
    extents: [f64; 2],
    vertices: Vec<[f64; 2]>,
}

/// A structured hexahedral mesh with trilinear geometry.
#[derive(Debug, Clone)]
pub struct HexMesh {
    num_cells: [usize; 3],
    extents: [f64; 3],
    vertices: Vec<[f64; 3]>,
}

/// Creates a `width x height` rectangle meshed by `nx x ny` quadrilaterals.
pub fn create_rectangle_mesh(nx: usize, ny: usize, width: f64, height: f64) -> QuadMesh {
    assert!(nx > 0 && ny > 0, "cell counts must be positive");
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push([
                width * i as f64 / nx as f64,
                height * j as f64 / ny as f64,
            ]);
        }
    }
    QuadMesh {
        num_cells: [nx, ny],
        extents: [width, height],
        vertices,
    }
}

/// Creates a `wx x wy x wz` box meshed by `nx x ny x nz` hexahedra.
pub fn create_box_mesh(
    nx: usize,
    ny: usize,
    nz: usize,
    wx: f64,
    wy: f64,
    wz: f64,
) -> HexMesh {
    assert!(nx > 0 && ny > 0 && nz > 0, "cell counts must be positive");
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
    for k in 0..=nz {
        for j in 0..=ny {
            for i in 0..=nx {
                vertices.push([
                    wx * i as f64 / nx as f64,
                    wy * j as f64 / ny as f64,
                    wz * k as f64 / nz as f64,
                ]);
            }
        }
    }
    HexMesh {
        num_cells: [nx, ny, nz],
        extents: [wx, wy, wz],
        vertices,
    }
}

impl QuadMesh {
    pub fn num_cells(&self) -> [usize; 2] {
        self.num_cells
    }

    pub fn extents(&self) -> [f64; 2] {
        self.extents
    }

    /// Displaces interior vertices by a smooth, boundary-preserving bump so
    /// that element Jacobians vary over the domain. The amplitude should stay
    /// well below half the cell size to keep the mesh valid.
    pub fn distorted(mut self, amplitude: f64) -> Self {
        use std::f64::consts::PI;
        let [w, h] = self.extents;
        for v in &mut self.vertices {
            let [x, y] = *v;
            v[0] = x + amplitude * (PI * x / w).sin() * (2.0 * PI * y / h).sin();
            v[1] = y + amplitude * (2.0 * PI * x / w).sin() * (PI * y / h).sin();
        }
        self
    }

    /// The four corner positions of element `e` in lexicographic order.
    fn element_vertices(&self, e: usize) -> [[f64; 2]; 4] {
        let [nx, _ny] = self.num_cells;
        let ex = e % nx;
        let ey = e / nx;
        let v = |i: usize, j: usize| self.vertices[i + (nx + 1) * j];
        [
            v(ex, ey),
            v(ex + 1, ey),
            v(ex, ey + 1),
            v(ex + 1, ey + 1),
        ]
    }

    /// Maps a reference point of element `e` to physical coordinates.
    pub fn map_reference(&self, e: usize, xi: &Vector<f64, 2>) -> Vector<f64, 2> {
        let corners = self.element_vertices(e);
        let n = <H1<1> as NodalElement<2>>::shape(xi);
        Vector::from_fn(|i| (0..4).map(|c| corners[c][i] * n[c]).sum())
    }

    /// The Jacobian of the geometry map of element `e` at a reference point.
    pub fn reference_jacobian(&self, e: usize, xi: &Vector<f64, 2>) -> Matrix<f64, 2, 2> {
        let corners = self.element_vertices(e);
        let dn = <H1<1> as NodalElement<2>>::shape_gradients(xi);
        Matrix::from_fn(|i, j| (0..4).map(|c| corners[c][i] * dn[c][j]).sum())
    }
}

impl DomainMesh<2> for QuadMesh {
    fn num_elements(&self) -> usize {
        self.num_cells[0] * self.num_cells[1]
    }

    fn geometry(&self) -> Geometry {
        Geometry::Quadrilateral
    }

    fn jacobian_table(&self, rule: &TensorRule<2>) -> Vec<f64> {
        let nq = rule.len();
        let ne = self.num_elements();
        let mut table = vec![0.0; nq * 2 * 2 * ne];
        for e in 0..ne {
            for (q, xi) in rule.points.iter().enumerate() {
                let jacobian = self.reference_jacobian(e, xi);
                for i in 0..2 {
                    for j in 0..2 {
                        table[q + nq * (i + 2 * (j + 2 * e))] = jacobian[i][j];
                    }
                }
            }
        }
        table
    }

    fn coordinate_table(&self, rule: &TensorRule<2>) -> Vec<f64> {
        let nq = rule.len();
        let ne = self.num_elements();
        let mut table = vec![0.0; nq * 2 * ne];
        for e in 0..ne {
            for (q, xi) in rule.points.iter().enumerate() {
                let x = self.map_reference(e, xi);
                for i in 0..2 {
                    table[q + nq * (i + 2 * e)] = x[i];
                }
            }
        }
        table
    }
}

impl HexMesh {
    pub fn num_cells(&self) -> [usize; 3] {
        self.num_cells
    }

    pub fn extents(&self) -> [f64; 3] {
        self.extents
    }

    /// Smooth, boundary-preserving vertex displacement; see
    /// [`QuadMesh::distorted`].
    pub fn distorted(mut self, amplitude: f64) -> Self {
        use std::f64::consts::PI;
        let [wx, wy, wz] = self.extents;
        for v in &mut self.vertices {
            let [x, y, z] = *v;
            let sx = (PI * x / wx).sin();
            let sy = (PI * y / wy).sin();
            let sz = (PI * z / wz).sin();
            v[0] = x + amplitude * sx * (2.0 * PI * y / wy).sin() * sz;
            v[1] = y + amplitude * (2.0 * PI * x / wx).sin() * sy * sz;
            v[2] = z + amplitude * sx * sy * (2.0 * PI * z / wz).sin();
        }
        self
    }

    /// The eight corner positions of element `e` in lexicographic order.
    fn element_vertices(&self, e: usize) -> [[f64; 3]; 8] {
        let [nx, ny, _nz] = self.num_cells;
        let ex = e % nx;
        let ey = (e / nx) % ny;
        let ez = e / (nx * ny);
        let v = |i: usize, j: usize, k: usize| {
            self.vertices[i + (nx + 1) * (j + (ny + 1) * k)]
        };
        [
            v(ex, ey, ez),
            v(ex + 1, ey, ez),
            v(ex, ey + 1, ez),
            v(ex + 1, ey + 1, ez),
            v(ex, ey, ez + 1),
            v(ex + 1, ey, ez + 1),
            v(ex, ey + 1, ez + 1),
            v(ex + 1, ey + 1, ez + 1),
        ]
    }

    /// Maps a reference point of element `e` to physical coordinates.
    pub fn map_reference(&self, e: usize, xi: &Vector<f64, 3>) -> Vector<f64, 3> {
        let corners = self.element_vertices(e);
        let n = <H1<1> as NodalElement<3>>::shape(xi);
        Vector::from_fn(|i| (0..8).map(|c| corners[c][i] * n[c]).sum())
    }

    /// The Jacobian of the geometry map of element `e` at a reference point.
    pub fn reference_jacobian(&self, e: usize, xi: &Vector<f64, 3>) -> Matrix<f64, 3, 3> {
        let corners = self.element_vertices(e);
        let dn = <H1<1> as NodalElement<3>>::shape_gradients(xi);
        Matrix::from_fn(|i, j| (0..8).map(|c| corners[c][i] * dn[c][j]).sum())
    }
}

impl DomainMesh<3> for HexMesh {
    fn num_elements(&self) -> usize {
        self.num_cells[0] * self.num_cells[1] * self.num_cells[2]
    }

    fn geometry(&self) -> Geometry {
        Geometry::Hexahedron
    }

    fn jacobian_table(&self, rule: &TensorRule<3>) -> Vec<f64> {
        let nq = rule.len();
        let ne = self.num_elements();
        let mut table = vec![0.0; nq * 3 * 3 * ne];
        for e in 0..ne {
            for (q, xi) in rule.points.iter().enumerate() {
                let jacobian = self.reference_jacobian(e, xi);
                for i in 0..3 {
                    for j in 0..3 {
                        table[q + nq * (i + 3 * (j + 3 * e))] = jacobian[i][j];
                    }
                }
            }
        }
        table
    }

    fn coordinate_table(&self, rule: &TensorRule<3>) -> Vec<f64> {
        let nq = rule.len();
        let ne = self.num_elements();
        let mut table = vec![0.0; nq * 3 * ne];
        for e in 0..ne {
            for (q, xi) in rule.points.iter().enumerate() {
                let x = self.map_reference(e, xi);
                for i in 0..3 {
                    table[q + nq * (i + 3 * e)] = x[i];
                }
            }
        }
        table
    }
}
