use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use varform::element::{nodes, CurlElement, Hcurl, NodalElement, H1, L2};
use varform::tensor::Vector;

fn point_in_unit_square() -> impl Strategy<Value = Vector<f64, 2>> {
    [0.0..=1.0, 0.0..=1.0].prop_map(|[x, y]| Vector([x, y]))
}

fn point_in_unit_cube() -> impl Strategy<Value = Vector<f64, 3>> {
    [0.0..=1.0, 0.0..=1.0, 0.0..=1.0].prop_map(|[x, y, z]| Vector([x, y, z]))
}

#[test]
fn hardcoded_nodes_match_computed_rules() {
    let lobatto = varform_quadrature::univariate::gauss_lobatto_points(4);
    for (a, b) in nodes::LOBATTO_4.iter().zip(&lobatto) {
        assert_scalar_eq!(*a, *b, comp = abs, tol = 1e-14);
    }
    let legendre = varform_quadrature::univariate::gauss_points(3);
    for (a, b) in nodes::LEGENDRE_3.iter().zip(&legendre) {
        assert_scalar_eq!(*a, *b, comp = abs, tol = 1e-14);
    }
    let legendre = varform_quadrature::univariate::gauss_points(2);
    for (a, b) in nodes::LEGENDRE_2.iter().zip(&legendre) {
        assert_scalar_eq!(*a, *b, comp = abs, tol = 1e-14);
    }
}

macro_rules! partition_of_unity_quad_test {
    ($test_name:ident, $element:ty) => {
        proptest! {
            #[test]
            fn $test_name(xi in point_in_unit_square()) {
                let shape = <$element as NodalElement<2>>::shape(&xi);
                let mut sum = 0.0;
                let mut gradient_sum = [0.0; 2];
                let gradients = <$element as NodalElement<2>>::shape_gradients(&xi);
                let ndof = <$element as varform::element::FiniteElement<2>>::NDOF;
                for i in 0..ndof {
                    sum += shape[i];
                    gradient_sum[0] += gradients[i][0];
                    gradient_sum[1] += gradients[i][1];
                }
                prop_assert!((sum - 1.0).abs() <= 1e-12);
                prop_assert!(gradient_sum[0].abs() <= 1e-11);
                prop_assert!(gradient_sum[1].abs() <= 1e-11);
            }
        }
    };
}

partition_of_unity_quad_test!(partition_of_unity_h1_quad_linear, H1<1>);
partition_of_unity_quad_test!(partition_of_unity_h1_quad_quadratic, H1<2>);
partition_of_unity_quad_test!(partition_of_unity_h1_quad_cubic, H1<3>);
partition_of_unity_quad_test!(partition_of_unity_l2_quad_linear, L2<1>);
partition_of_unity_quad_test!(partition_of_unity_l2_quad_quadratic, L2<2>);

proptest! {
    #[test]
    fn partition_of_unity_h1_hex_quadratic(xi in point_in_unit_cube()) {
        let shape = <H1<2> as NodalElement<3>>::shape(&xi);
        let sum: f64 = (0..27).map(|i| shape[i]).sum();
        prop_assert!((sum - 1.0).abs() <= 1e-12);
    }
}

#[test]
fn constant_l2_element_has_a_single_unit_shape_function() {
    let shape = <L2<0> as NodalElement<2>>::shape(&Vector([0.3, 0.8]));
    assert_scalar_eq!(shape[0], 1.0, comp = abs, tol = 1e-15);
    let gradients = <L2<0> as NodalElement<2>>::shape_gradients(&Vector([0.3, 0.8]));
    assert_scalar_eq!(gradients[0][0], 0.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(gradients[0][1], 0.0, comp = abs, tol = 1e-15);
}

#[test]
fn nodal_bases_interpolate_at_their_nodes() {
    // N_i(x_j) = delta_ij on the lexicographic node lattice.
    let points = nodes::LOBATTO_3;
    for j in 0..3 {
        for i in 0..3 {
            let xi = Vector([points[i], points[j]]);
            let shape = <H1<2> as NodalElement<2>>::shape(&xi);
            for b in 0..9 {
                let expected = if b == i + 3 * j { 1.0 } else { 0.0 };
                assert_scalar_eq!(shape[b], expected, comp = abs, tol = 1e-13);
            }
        }
    }
}

#[test]
fn quadratic_basis_reproduces_quadratic_functions() {
    let f = |x: f64, y: f64| 1.0 + 2.0 * x - y + 0.5 * x * x + x * y + 2.0 * y * y;
    let points = nodes::LOBATTO_3;
    let mut nodal_values = [0.0; 9];
    let mut count = 0;
    for j in 0..3 {
        for i in 0..3 {
            nodal_values[count] = f(points[i], points[j]);
            count += 1;
        }
    }

    for &(x, y) in &[(0.21, 0.13), (0.77, 0.52), (0.05, 0.94)] {
        let shape = <H1<2> as NodalElement<2>>::shape(&Vector([x, y]));
        let interpolated: f64 = (0..9).map(|i| nodal_values[i] * shape[i]).sum();
        assert_scalar_eq!(interpolated, f(x, y), comp = abs, tol = 1e-13);
    }
}

#[test]
fn gradients_match_finite_differences_of_shape_values() {
    let xi = Vector([0.37, 0.61]);
    let h = 1e-6;
    let gradients = <H1<3> as NodalElement<2>>::shape_gradients(&xi);
    for axis in 0..2 {
        let mut plus = xi;
        let mut minus = xi;
        plus[axis] += h;
        minus[axis] -= h;
        let shape_plus = <H1<3> as NodalElement<2>>::shape(&plus);
        let shape_minus = <H1<3> as NodalElement<2>>::shape(&minus);
        for i in 0..16 {
            let difference = (shape_plus[i] - shape_minus[i]) / (2.0 * h);
            assert_scalar_eq!(gradients[i][axis], difference, comp = abs, tol = 1e-8);
        }
    }
}

#[test]
fn quad_curl_matches_finite_differences() {
    // curl N = d N_y / d x - d N_x / d y, checked per basis function.
    let xi = Vector([0.42, 0.58]);
    let h = 1e-6;
    let curls = <Hcurl<2> as CurlElement<2>>::shape_curls(&xi);

    let xp = <Hcurl<2> as CurlElement<2>>::shape_vectors(&Vector([xi[0] + h, xi[1]]));
    let xm = <Hcurl<2> as CurlElement<2>>::shape_vectors(&Vector([xi[0] - h, xi[1]]));
    let yp = <Hcurl<2> as CurlElement<2>>::shape_vectors(&Vector([xi[0], xi[1] + h]));
    let ym = <Hcurl<2> as CurlElement<2>>::shape_vectors(&Vector([xi[0], xi[1] - h]));

    for i in 0..12 {
        let dny_dx = (xp[i][1] - xm[i][1]) / (2.0 * h);
        let dnx_dy = (yp[i][0] - ym[i][0]) / (2.0 * h);
        assert_scalar_eq!(curls[i], dny_dx - dnx_dy, comp = abs, tol = 1e-8);
    }
}

#[test]
fn hex_curl_matches_finite_differences() {
    let xi = Vector([0.31, 0.47, 0.65]);
    let h = 1e-6;
    let curls = <Hcurl<1> as CurlElement<3>>::shape_curls(&xi);

    let sample = |axis: usize, sign: f64| {
        let mut p = xi;
        p[axis] += sign * h;
        <Hcurl<1> as CurlElement<3>>::shape_vectors(&p)
    };
    let d = |axis: usize, comp: usize, i: usize| {
        (sample(axis, 1.0)[i][comp] - sample(axis, -1.0)[i][comp]) / (2.0 * h)
    };

    for i in 0..12 {
        // curl F = (dFz/dy - dFy/dz, dFx/dz - dFz/dx, dFy/dx - dFx/dy)
        assert_scalar_eq!(curls[i][0], d(1, 2, i) - d(2, 1, i), comp = abs, tol = 1e-8);
        assert_scalar_eq!(curls[i][1], d(2, 0, i) - d(0, 2, i), comp = abs, tol = 1e-8);
        assert_scalar_eq!(curls[i][2], d(0, 1, i) - d(1, 0, i), comp = abs, tol = 1e-8);
    }
}

#[test]
fn hcurl_quad_tangential_traces_are_nodal() {
    // The x-directed functions of the lowest-order quad element restrict to
    // constants on the bottom/top edges and vanish on the opposite edge.
    let bottom = Vector([0.4, 0.0]);
    let shape = <Hcurl<1> as CurlElement<2>>::shape_vectors(&bottom);
    // dof 0: x-family, closed node at y = 0
    assert_scalar_eq!(shape[0][0], 1.0, comp = abs, tol = 1e-14);
    // dof 1: x-family, closed node at y = 1
    assert_scalar_eq!(shape[1][0], 0.0, comp = abs, tol = 1e-14);
    // y-family functions carry no x component
    assert_scalar_eq!(shape[2][0], 0.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(shape[3][0], 0.0, comp = abs, tol = 1e-14);
}
