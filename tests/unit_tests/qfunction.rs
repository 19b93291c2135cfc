use matrixcompare::assert_scalar_eq;
use varform::dual::Dual;
use varform::qfunction::{
    chain_rule, get_gradient, get_value, make_dual, CurlArg2d, QInput, QOutput, ScalarArg,
    VectorArg,
};
use varform::tensor::{Matrix, Vector};

type ScalarDual = Dual<ScalarArg<2>>;

fn scalar_qf(
    x: &Vector<f64, 2>,
    arg: QInput<ScalarDual, Vector<ScalarDual, 2>>,
) -> QOutput<ScalarDual, Vector<ScalarDual, 2>> {
    let u = arg.value;
    let du = arg.deriv;
    QOutput {
        source: u * u * u - 100.0 * x[0] * x[1],
        flux: du * 2.1,
    }
}

#[test]
fn make_dual_uses_identity_seeding() {
    let arg = ScalarArg::<2> {
        value: 0.4,
        deriv: Vector([1.5, -0.3]),
    };
    let dual = make_dual(arg);

    assert_scalar_eq!(dual.value.value, 0.4, comp = abs, tol = 0.0);
    assert_scalar_eq!(dual.value.gradient.value, 1.0, comp = abs, tol = 0.0);
    assert_scalar_eq!(dual.value.gradient.deriv[0], 0.0, comp = abs, tol = 0.0);

    for i in 0..2 {
        assert_scalar_eq!(dual.deriv[i].value, arg.deriv[i], comp = abs, tol = 0.0);
        assert_scalar_eq!(dual.deriv[i].gradient.value, 0.0, comp = abs, tol = 0.0);
        for j in 0..2 {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(
                dual.deriv[i].gradient.deriv[j],
                expected,
                comp = abs,
                tol = 0.0
            );
        }
    }
}

#[test]
fn value_channel_survives_the_dual_round_trip() {
    let x = Vector([0.3, 0.8]);
    let arg = ScalarArg::<2> {
        value: 1.2,
        deriv: Vector([0.5, -0.25]),
    };
    let output = scalar_qf(&x, make_dual(arg));
    let value = get_value(&output);

    // Same arithmetic on plain f64
    let expected_source = 1.2f64 * 1.2 * 1.2 - 100.0 * 0.3 * 0.8;
    assert_eq!(value.source, expected_source);
    assert_eq!(value.flux[0], 0.5 * 2.1);
    assert_eq!(value.flux[1], -0.25 * 2.1);
}

#[test]
fn jacobian_of_scalar_qfunction() {
    let x = Vector([0.1, 0.2]);
    let u = 0.9;
    let arg = ScalarArg::<2> {
        value: u,
        deriv: Vector([0.4, -0.7]),
    };
    let jacobian = get_gradient(&scalar_qf(&x, make_dual(arg)));

    // d source / d u = 3 u^2, d source / d grad = 0
    assert_scalar_eq!(jacobian.source_value, 3.0 * u * u, comp = abs, tol = 1e-14);
    assert_scalar_eq!(jacobian.source_deriv[0], 0.0, comp = abs, tol = 0.0);
    // d flux / d u = 0, d flux / d grad = 2.1 I
    assert_scalar_eq!(jacobian.flux_value[0], 0.0, comp = abs, tol = 0.0);
    for i in 0..2 {
        for j in 0..2 {
            let expected = if i == j { 2.1 } else { 0.0 };
            assert_scalar_eq!(jacobian.flux_deriv[i][j], expected, comp = abs, tol = 0.0);
        }
    }
}

#[test]
fn chain_rule_matches_directional_difference_quotient() {
    let x = Vector([0.6, 0.4]);
    let arg = ScalarArg::<2> {
        value: 0.8,
        deriv: Vector([0.2, 0.1]),
    };
    let direction = ScalarArg::<2> {
        value: -0.3,
        deriv: Vector([0.7, 0.5]),
    };

    let jacobian = get_gradient(&scalar_qf(&x, make_dual(arg)));
    let linearized = chain_rule(&jacobian, &direction);

    let eps = 1e-7;
    let perturbed = ScalarArg::<2> {
        value: arg.value + eps * direction.value,
        deriv: arg.deriv + direction.deriv * eps,
    };
    let f0 = get_value(&scalar_qf(&x, make_dual(arg)));
    let f1 = get_value(&scalar_qf(&x, make_dual(perturbed)));

    assert_scalar_eq!(
        linearized.source,
        (f1.source - f0.source) / eps,
        comp = abs,
        tol = 1e-6
    );
    for i in 0..2 {
        assert_scalar_eq!(
            linearized.flux[i],
            (f1.flux[i] - f0.flux[i]) / eps,
            comp = abs,
            tol = 1e-6
        );
    }
}

#[test]
fn vector_argument_jacobian_block_layout() {
    // A linear q-function with hand-picked coefficients exposes the index
    // convention of every derivative block.
    type Arg = VectorArg<2, 2>;
    let qf = |arg: QInput<Vector<Dual<Arg>, 2>, Matrix<Dual<Arg>, 2, 2>>| {
        let u = arg.value;
        let du = arg.deriv;
        QOutput {
            // source_i = 2 u_i + du_{i,0}
            source: Vector::from_fn(|i| u[i] * 2.0 + du[i][0]),
            // flux_{i,k} = 3 du_{i,k} + u_i (only for k = 1)
            flux: Matrix::from_fn(|i, k| {
                if k == 1 {
                    du[i][k] * 3.0 + u[i]
                } else {
                    du[i][k] * 3.0
                }
            }),
        }
    };

    let arg = Arg {
        value: Vector([0.3, -0.2]),
        deriv: Matrix([[0.1, 0.2], [0.3, 0.4]]),
    };
    let jacobian = qf(make_dual(arg));
    let jacobian = jacobian_of(&jacobian);

    for i in 0..2 {
        for j in 0..2 {
            let expected = if i == j { 2.0 } else { 0.0 };
            assert_scalar_eq!(jacobian.source_value[i][j], expected, comp = abs, tol = 0.0);
            for k in 0..2 {
                let expected = if i == j && k == 0 { 1.0 } else { 0.0 };
                assert_scalar_eq!(
                    jacobian.source_deriv[i][j][k],
                    expected,
                    comp = abs,
                    tol = 0.0
                );
                let expected = if i == j && k == 1 { 1.0 } else { 0.0 };
                assert_scalar_eq!(
                    jacobian.flux_value[i][k][j],
                    expected,
                    comp = abs,
                    tol = 0.0
                );
                for l in 0..2 {
                    let expected = if i == j && k == l { 3.0 } else { 0.0 };
                    assert_scalar_eq!(
                        jacobian.flux_deriv[i][k][j][l],
                        expected,
                        comp = abs,
                        tol = 0.0
                    );
                }
            }
        }
    }
}

// Small helper so the test above reads naturally.
fn jacobian_of<T: varform::qfunction::ExtractDual>(out: &T) -> T::Jacobian {
    get_gradient(out)
}

#[test]
fn curl_argument_chain_rule_with_coupled_blocks() {
    // All four blocks nonzero: f0 couples to the curl, f1 couples to the
    // value. The chain rule must match a directional difference quotient.
    let qf = |arg: QInput<Vector<Dual<CurlArg2d>, 2>, Dual<CurlArg2d>>| QOutput {
        source: 1.7 * arg.value + Vector([0.2, -0.1]) * arg.deriv,
        flux: arg.deriv * 2.1 + arg.value[0] * 0.15,
    };

    let arg = CurlArg2d {
        value: Vector([0.5, -1.0]),
        deriv: 0.25,
    };
    let direction = CurlArg2d {
        value: Vector([-0.4, 0.9]),
        deriv: 0.6,
    };

    let jacobian = get_gradient(&qf(make_dual(arg)));
    let linearized = chain_rule(&jacobian, &direction);

    // The q-function is linear, so the chain rule is exact.
    let shifted = CurlArg2d {
        value: arg.value + direction.value,
        deriv: arg.deriv + direction.deriv,
    };
    let f0 = get_value(&qf(make_dual(arg)));
    let f1 = get_value(&qf(make_dual(shifted)));
    assert_scalar_eq!(
        linearized.source[0],
        f1.source[0] - f0.source[0],
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(
        linearized.source[1],
        f1.source[1] - f0.source[1],
        comp = abs,
        tol = 1e-14
    );
    assert_scalar_eq!(linearized.flux, f1.flux - f0.flux, comp = abs, tol = 1e-14);
}

#[test]
fn curl_argument_chain_rule() {
    // f0 = 1.7 A, f1 = 2.1 curl A: the linearization is the q-function
    // itself.
    let qf = |arg: QInput<Vector<Dual<CurlArg2d>, 2>, Dual<CurlArg2d>>| QOutput {
        source: 1.7 * arg.value,
        flux: arg.deriv * 2.1,
    };

    let arg = CurlArg2d {
        value: Vector([0.5, -1.0]),
        deriv: 0.25,
    };
    let jacobian = get_gradient(&qf(make_dual(arg)));
    let linearized = chain_rule(&jacobian, &arg);

    assert_scalar_eq!(linearized.source[0], 1.7 * 0.5, comp = abs, tol = 1e-15);
    assert_scalar_eq!(linearized.source[1], -1.7, comp = abs, tol = 1e-15);
    assert_scalar_eq!(linearized.flux, 2.1 * 0.25, comp = abs, tol = 1e-15);
}
