use matrixcompare::assert_scalar_eq;
use varform::assembly::local::{measure, measure_embedded, surface_postprocess, surface_preprocess};
use varform::assembly::{AssemblyError, Integral};
use varform::element::{Hcurl, NodalElement, H1};
use varform::mesh::{create_rectangle_mesh, DomainMesh};
use varform::qfunction::QOutput;
use varform::quadrature::{points_per_dim, TensorRule};
use varform::tensor::{Matrix, Vector};

#[test]
fn measure_of_square_and_embedded_jacobians() {
    let jacobian = Matrix([[0.5, 0.0], [0.0, 0.25]]);
    assert_scalar_eq!(measure(&jacobian), 0.125, comp = abs, tol = 1e-15);

    // A segment mapped into the plane with tangent (3, 4) has length scale 5.
    let embedded = Matrix([[3.0], [4.0]]);
    assert_scalar_eq!(measure_embedded(&embedded), 5.0, comp = abs, tol = 1e-14);
}

#[test]
fn surface_primitives_interpolate_values_only() {
    // A quadratic segment field evaluated at midpoint-ish coordinates.
    let dofs = Vector([1.0, 2.0, 4.0]);
    let xi = Vector([0.3]);
    let value = surface_preprocess::<H1<2>, 1>(&dofs, &xi);
    let shape = <H1<2> as NodalElement<1>>::shape(&xi);
    assert_scalar_eq!(
        value,
        dofs[0] * shape[0] + dofs[1] * shape[1] + dofs[2] * shape[2],
        comp = abs,
        tol = 1e-14
    );

    let residual = surface_postprocess::<H1<2>, 1>(2.0, &xi);
    for i in 0..3 {
        assert_scalar_eq!(residual[i], 2.0 * shape[i], comp = abs, tol = 1e-14);
    }
}

fn scalar_test_integral(mesh: &varform::mesh::QuadMesh) -> Integral {
    let rule = TensorRule::<2>::gauss(points_per_dim(1, 1));
    Integral::new_domain::<H1<1>, H1<1>, _, _, 2>(
        mesh.num_elements(),
        mesh.jacobian_table(&rule),
        mesh.coordinate_table(&rule),
        |_x: &Vector<f64, 2>, arg| QOutput {
            source: arg.value * 1.0,
            flux: arg.deriv * 1.0,
        },
    )
}

#[test]
fn inverted_elements_are_reported_as_degenerate() {
    // A mesh built with negative extent has negative Jacobian determinants.
    let mesh = create_rectangle_mesh(2, 2, -1.0, 1.0);
    let integral = scalar_test_integral(&mesh);

    let u = vec![1.0; integral.trial_packed_len()];
    let mut r = vec![0.0; integral.test_packed_len()];
    let result = integral.mult(&u, &mut r);
    assert!(matches!(
        result,
        Err(AssemblyError::DegenerateElement { element: 0, .. })
    ));
}

#[test]
fn non_finite_qfunction_output_is_reported() {
    let mesh = create_rectangle_mesh(2, 2, 1.0, 1.0);
    let rule = TensorRule::<2>::gauss(points_per_dim(1, 1));
    let integral = Integral::new_domain::<H1<1>, H1<1>, _, _, 2>(
        mesh.num_elements(),
        mesh.jacobian_table(&rule),
        mesh.coordinate_table(&rule),
        |_x: &Vector<f64, 2>, arg| QOutput {
            source: arg.value * 1.0 + f64::NAN,
            flux: arg.deriv * 1.0,
        },
    );

    let u = vec![1.0; integral.trial_packed_len()];
    let mut r = vec![0.0; integral.test_packed_len()];
    assert!(matches!(
        integral.mult(&u, &mut r),
        Err(AssemblyError::NumericError { element: 0 })
    ));
}

#[test]
fn gradient_before_evaluation_yields_zero_output() {
    // The derivative cache starts zeroed, so applying the gradient before
    // any evaluation is well-defined but meaningless.
    let mesh = create_rectangle_mesh(2, 2, 1.0, 1.0);
    let integral = scalar_test_integral(&mesh);

    let du = vec![1.0; integral.trial_packed_len()];
    let mut dr = vec![0.0; integral.test_packed_len()];
    integral.gradient_mult(&du, &mut dr).unwrap();
    assert!(dr.iter().all(|&x| x == 0.0));
}

#[test]
fn curl_test_spaces_have_no_stiffness_assembly() {
    let mesh = create_rectangle_mesh(2, 2, 1.0, 1.0);
    let rule = TensorRule::<2>::gauss(points_per_dim(1, 1));
    let integral = Integral::new_domain::<Hcurl<1>, Hcurl<1>, _, _, 2>(
        mesh.num_elements(),
        mesh.jacobian_table(&rule),
        mesh.coordinate_table(&rule),
        |_x: &Vector<f64, 2>, arg| QOutput {
            source: 1.0 * arg.value,
            flux: arg.deriv * 1.0,
        },
    );

    assert!(!integral.has_gradient_matrix());
    let mut k = vec![0.0; integral.matrix_packed_len()];
    assert!(matches!(
        integral.gradient_matrix(&mut k),
        Err(AssemblyError::UnsupportedGradientMatrix)
    ));
}

#[test]
fn assembly_errors_format_with_source_location_detail() {
    let degenerate = AssemblyError::DegenerateElement {
        element: 7,
        point: 3,
    };
    assert!(degenerate.to_string().contains("element 7"));
    assert!(degenerate.to_string().contains("point 3"));

    let numeric = AssemblyError::NumericError { element: 2 };
    assert!(numeric.to_string().contains("element 2"));
}
