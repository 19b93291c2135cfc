//! Function spaces over structured meshes.
//!
//! A [`FunctionSpace`] assigns global dof numbers to the element-local dofs
//! of one of the supported families and provides the restriction operator
//! between global vectors and element-packed vectors. The element-local dof
//! ordering agrees with the lexicographic convention of the shape function
//! tables; vector-valued spaces interleave components
//! (`global index = scalar_dof * components + component`).

use crate::element::nodes;
use crate::mesh::{HexMesh, QuadMesh};
use nalgebra::DVector;

/// Global dof numbering and restriction for one space over one mesh.
#[derive(Debug, Clone)]
pub struct FunctionSpace {
    components: usize,
    ndof_per_element: usize,
    num_scalar_dofs: usize,
    num_elements: usize,
    /// `[e * ndof_per_element + i] -> global scalar dof`
    element_dofs: Vec<usize>,
    boundary_scalar_dofs: Vec<usize>,
}

impl FunctionSpace {
    /// Continuous nodal space of the given order over a quadrilateral mesh.
    pub fn h1_quadrilateral(mesh: &QuadMesh, order: usize, components: usize) -> Self {
        assert!(order >= 1);
        let [nx, ny] = mesh.num_cells();
        let nodes_x = order * nx + 1;
        let nodes_y = order * ny + 1;
        let ndof = (order + 1) * (order + 1);

        let mut element_dofs = Vec::with_capacity(nx * ny * ndof);
        for ey in 0..ny {
            for ex in 0..nx {
                for j in 0..=order {
                    for i in 0..=order {
                        element_dofs.push((order * ex + i) + nodes_x * (order * ey + j));
                    }
                }
            }
        }

        let mut boundary = Vec::new();
        for jy in 0..nodes_y {
            for ix in 0..nodes_x {
                if ix == 0 || ix == nodes_x - 1 || jy == 0 || jy == nodes_y - 1 {
                    boundary.push(ix + nodes_x * jy);
                }
            }
        }

        Self {
            components,
            ndof_per_element: ndof,
            num_scalar_dofs: nodes_x * nodes_y,
            num_elements: nx * ny,
            element_dofs,
            boundary_scalar_dofs: boundary,
        }
    }

    /// Discontinuous nodal space of the given order over a quadrilateral
    /// mesh; every element owns its dofs.
    pub fn l2_quadrilateral(mesh: &QuadMesh, order: usize) -> Self {
        let [nx, ny] = mesh.num_cells();
        let ndof = (order + 1) * (order + 1);
        let num_elements = nx * ny;
        Self {
            components: 1,
            ndof_per_element: ndof,
            num_scalar_dofs: num_elements * ndof,
            num_elements,
            element_dofs: (0..num_elements * ndof).collect(),
            boundary_scalar_dofs: Vec::new(),
        }
    }

    /// Nedelec space of the given order over a quadrilateral mesh. All edge
    /// dofs are oriented along +x/+y, so the restriction needs no sign flips
    /// on a structured grid.
    pub fn hcurl_quadrilateral(mesh: &QuadMesh, order: usize) -> Self {
        assert!(order >= 1);
        let p = order;
        let [nx, ny] = mesh.num_cells();
        // x-directed dofs: open along x, closed across y
        let x_cols = p * nx;
        let x_rows = p * ny + 1;
        let num_x = x_cols * x_rows;
        // y-directed dofs: closed across x, open along y
        let y_cols = p * nx + 1;
        let y_rows = p * ny;
        let num_y = y_cols * y_rows;
        let ndof = 2 * p * (p + 1);

        let mut element_dofs = Vec::with_capacity(nx * ny * ndof);
        for ey in 0..ny {
            for ex in 0..nx {
                for j in 0..=p {
                    for i in 0..p {
                        element_dofs.push((p * ex + i) + x_cols * (p * ey + j));
                    }
                }
                for j in 0..p {
                    for i in 0..=p {
                        element_dofs.push(num_x + (p * ex + i) + y_cols * (p * ey + j));
                    }
                }
            }
        }

        // Tangential dofs on the outer boundary
        let mut boundary = Vec::new();
        for jy in [0, x_rows - 1] {
            for ix in 0..x_cols {
                boundary.push(ix + x_cols * jy);
            }
        }
        for jy in 0..y_rows {
            for ix in [0, y_cols - 1] {
                boundary.push(num_x + ix + y_cols * jy);
            }
        }
        boundary.sort_unstable();

        Self {
            components: 1,
            ndof_per_element: ndof,
            num_scalar_dofs: num_x + num_y,
            num_elements: nx * ny,
            element_dofs,
            boundary_scalar_dofs: boundary,
        }
    }

    /// Continuous nodal space of the given order over a hexahedral mesh.
    pub fn h1_hexahedron(mesh: &HexMesh, order: usize, components: usize) -> Self {
        assert!(order >= 1);
        let [nx, ny, nz] = mesh.num_cells();
        let nodes_x = order * nx + 1;
        let nodes_y = order * ny + 1;
        let nodes_z = order * nz + 1;
        let ndof = (order + 1) * (order + 1) * (order + 1);

        let mut element_dofs = Vec::with_capacity(nx * ny * nz * ndof);
        for ez in 0..nz {
            for ey in 0..ny {
                for ex in 0..nx {
                    for k in 0..=order {
                        for j in 0..=order {
                            for i in 0..=order {
                                element_dofs.push(
                                    (order * ex + i)
                                        + nodes_x
                                            * ((order * ey + j) + nodes_y * (order * ez + k)),
                                );
                            }
                        }
                    }
                }
            }
        }

        let mut boundary = Vec::new();
        for kz in 0..nodes_z {
            for jy in 0..nodes_y {
                for ix in 0..nodes_x {
                    if ix == 0
                        || ix == nodes_x - 1
                        || jy == 0
                        || jy == nodes_y - 1
                        || kz == 0
                        || kz == nodes_z - 1
                    {
                        boundary.push(ix + nodes_x * (jy + nodes_y * kz));
                    }
                }
            }
        }

        Self {
            components,
            ndof_per_element: ndof,
            num_scalar_dofs: nodes_x * nodes_y * nodes_z,
            num_elements: nx * ny * nz,
            element_dofs,
            boundary_scalar_dofs: boundary,
        }
    }

    /// Discontinuous nodal space over a hexahedral mesh.
    pub fn l2_hexahedron(mesh: &HexMesh, order: usize) -> Self {
        let [nx, ny, nz] = mesh.num_cells();
        let ndof = (order + 1) * (order + 1) * (order + 1);
        let num_elements = nx * ny * nz;
        Self {
            components: 1,
            ndof_per_element: ndof,
            num_scalar_dofs: num_elements * ndof,
            num_elements,
            element_dofs: (0..num_elements * ndof).collect(),
            boundary_scalar_dofs: Vec::new(),
        }
    }

    /// Lowest-order Nedelec (edge) space over a hexahedral mesh, edge dofs
    /// oriented along +x/+y/+z.
    pub fn hcurl_hexahedron(mesh: &HexMesh) -> Self {
        let [nx, ny, nz] = mesh.num_cells();
        let num_x = nx * (ny + 1) * (nz + 1);
        let num_y = (nx + 1) * ny * (nz + 1);
        let num_z = (nx + 1) * (ny + 1) * nz;

        let mut element_dofs = Vec::with_capacity(nx * ny * nz * 12);
        for ez in 0..nz {
            for ey in 0..ny {
                for ex in 0..nx {
                    for k in 0..2 {
                        for j in 0..2 {
                            element_dofs
                                .push(ex + nx * ((ey + j) + (ny + 1) * (ez + k)));
                        }
                    }
                    for k in 0..2 {
                        for i in 0..2 {
                            element_dofs
                                .push(num_x + (ex + i) + (nx + 1) * (ey + ny * (ez + k)));
                        }
                    }
                    for j in 0..2 {
                        for i in 0..2 {
                            element_dofs.push(
                                num_x + num_y + (ex + i) + (nx + 1) * ((ey + j) + (ny + 1) * ez),
                            );
                        }
                    }
                }
            }
        }

        Self {
            components: 1,
            ndof_per_element: 12,
            num_scalar_dofs: num_x + num_y + num_z,
            num_elements: nx * ny * nz,
            element_dofs,
            boundary_scalar_dofs: Vec::new(),
        }
    }

    pub fn components(&self) -> usize {
        self.components
    }

    pub fn ndof_per_element(&self) -> usize {
        self.ndof_per_element
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Number of global scalar dofs (before component expansion).
    pub fn num_scalar_dofs(&self) -> usize {
        self.num_scalar_dofs
    }

    /// Number of global dofs including components.
    pub fn num_dofs(&self) -> usize {
        self.num_scalar_dofs * self.components
    }

    /// Length of an element-packed vector for this space.
    pub fn packed_len(&self) -> usize {
        self.ndof_per_element * self.components * self.num_elements
    }

    /// The global scalar dof of local dof `i` of element `e`.
    pub fn element_scalar_dof(&self, e: usize, i: usize) -> usize {
        self.element_dofs[e * self.ndof_per_element + i]
    }

    /// The global dof of (element, local dof, component).
    pub fn global_dof(&self, e: usize, i: usize, component: usize) -> usize {
        self.element_scalar_dof(e, i) * self.components + component
    }

    /// Restriction: gathers a global vector into element packing
    /// `[ndof, (components,) num_elements]`.
    pub fn gather(&self, u: &DVector<f64>) -> Vec<f64> {
        assert_eq!(u.len(), self.num_dofs());
        let ndof = self.ndof_per_element;
        let c = self.components;
        let mut packed = vec![0.0; self.packed_len()];
        for e in 0..self.num_elements {
            for i in 0..ndof {
                let dof = self.element_dofs[e * ndof + i];
                for comp in 0..c {
                    packed[i + ndof * (comp + c * e)] = u[dof * c + comp];
                }
            }
        }
        packed
    }

    /// Prolongation (transpose restriction): accumulates an element-packed
    /// vector into a global vector.
    pub fn scatter_add(&self, packed: &[f64], out: &mut DVector<f64>) {
        assert_eq!(packed.len(), self.packed_len());
        assert_eq!(out.len(), self.num_dofs());
        let ndof = self.ndof_per_element;
        let c = self.components;
        for e in 0..self.num_elements {
            for i in 0..ndof {
                let dof = self.element_dofs[e * ndof + i];
                for comp in 0..c {
                    out[dof * c + comp] += packed[i + ndof * (comp + c * e)];
                }
            }
        }
    }

    /// Global scalar dofs on the mesh boundary (empty for L2 spaces).
    pub fn boundary_scalar_dofs(&self) -> &[usize] {
        &self.boundary_scalar_dofs
    }

    /// All components of the boundary scalar dofs, as global dof indices.
    pub fn boundary_dofs(&self) -> Vec<usize> {
        self.expand_dofs(&self.boundary_scalar_dofs)
    }

    /// Expands scalar dofs to global dof indices for every component.
    pub fn expand_dofs(&self, scalar_dofs: &[usize]) -> Vec<usize> {
        let mut dofs = Vec::with_capacity(scalar_dofs.len() * self.components);
        for &dof in scalar_dofs {
            for comp in 0..self.components {
                dofs.push(dof * self.components + comp);
            }
        }
        dofs.sort_unstable();
        dofs
    }
}

fn nodal_points_1d(order: usize) -> Vec<f64> {
    match order {
        1 => nodes::LOBATTO_2.to_vec(),
        2 => nodes::LOBATTO_3.to_vec(),
        3 => nodes::LOBATTO_4.to_vec(),
        _ => panic!("unsupported nodal order {}", order),
    }
}

/// Physical positions of the scalar dofs of an H1 space over a
/// quadrilateral mesh, via the geometry map of the owning elements.
pub fn h1_quadrilateral_node_positions(
    mesh: &QuadMesh,
    space: &FunctionSpace,
    order: usize,
) -> Vec<[f64; 2]> {
    use crate::tensor::Vector;
    let points = nodal_points_1d(order);
    let mut positions = vec![[0.0; 2]; space.num_scalar_dofs()];
    for e in 0..space.num_elements() {
        let mut local = 0;
        for j in 0..=order {
            for i in 0..=order {
                let xi = Vector([points[i], points[j]]);
                let x = mesh.map_reference(e, &xi);
                positions[space.element_scalar_dof(e, local)] = [x[0], x[1]];
                local += 1;
            }
        }
    }
    positions
}

/// Physical positions of the scalar dofs of an H1 space over a hexahedral
/// mesh.
pub fn h1_hexahedron_node_positions(
    mesh: &HexMesh,
    space: &FunctionSpace,
    order: usize,
) -> Vec<[f64; 3]> {
    use crate::tensor::Vector;
    let points = nodal_points_1d(order);
    let mut positions = vec![[0.0; 3]; space.num_scalar_dofs()];
    for e in 0..space.num_elements() {
        let mut local = 0;
        for k in 0..=order {
            for j in 0..=order {
                for i in 0..=order {
                    let xi = Vector([points[i], points[j], points[k]]);
                    let x = mesh.map_reference(e, &xi);
                    positions[space.element_scalar_dof(e, local)] = [x[0], x[1], x[2]];
                    local += 1;
                }
            }
        }
    }
    positions
}
