use matrixcompare::assert_scalar_eq;
use varform::tensor::{
    ddot, det, dot, identity, inv, outer, sym, tr, transpose, Matrix, Tensor3, Tensor4, Vector,
};

#[test]
fn dot_contracts_innermost_indices() {
    let a = Vector([1.0, 2.0, 3.0]);
    let b = Vector([4.0, -1.0, 0.5]);
    assert_scalar_eq!(dot(a, b), 4.0 - 2.0 + 1.5, comp = abs, tol = 1e-15);

    let m = Matrix([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
    let mv = dot(m, Vector([1.0, -1.0]));
    assert_scalar_eq!(mv[0], -1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(mv[1], -1.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(mv[2], -1.0, comp = abs, tol = 1e-15);

    let vm = dot(a, m);
    assert_scalar_eq!(vm[0], 1.0 + 6.0 + 15.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(vm[1], 2.0 + 8.0 + 18.0, comp = abs, tol = 1e-15);
}

#[test]
fn matrix_product_against_hand_computed_values() {
    let a = Matrix([[1.0, 2.0], [3.0, 4.0]]);
    let b = Matrix([[0.0, 1.0], [1.0, 0.0]]);
    let ab = dot(a, b);
    assert_eq!(ab, Matrix([[2.0, 1.0], [4.0, 3.0]]));
}

#[test]
fn outer_product_has_rank_one_structure() {
    let a = Vector([1.0, 2.0]);
    let b = Vector([3.0, 5.0, 7.0]);
    let m = outer(a, b);
    for i in 0..2 {
        for j in 0..3 {
            assert_scalar_eq!(m[i][j], a[i] * b[j], comp = abs, tol = 1e-15);
        }
    }
}

#[test]
fn determinant_and_inverse_2x2() {
    let m = Matrix([[2.0, 1.0], [1.0, 3.0]]);
    assert_scalar_eq!(det(&m), 5.0, comp = abs, tol = 1e-15);
    let product = dot(inv(&m), m);
    let eye = identity::<f64, 2>();
    for i in 0..2 {
        for j in 0..2 {
            assert_scalar_eq!(product[i][j], eye[i][j], comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn determinant_and_inverse_3x3() {
    let m = Matrix([[2.0, 1.0, 0.3], [0.1, 3.0, -0.2], [0.5, -0.4, 1.7]]);
    let product = dot(inv(&m), m);
    let eye = identity::<f64, 3>();
    for i in 0..3 {
        for j in 0..3 {
            assert_scalar_eq!(product[i][j], eye[i][j], comp = abs, tol = 1e-14);
        }
    }
    // det(M^{-1}) = 1 / det(M)
    assert_scalar_eq!(det(&inv(&m)), 1.0 / det(&m), comp = abs, tol = 1e-14);
}

#[test]
fn trace_transpose_and_symmetric_part() {
    let m = Matrix([[1.0, 2.0], [5.0, 4.0]]);
    assert_scalar_eq!(tr(m), 5.0, comp = abs, tol = 1e-15);
    assert_eq!(transpose(m), Matrix([[1.0, 5.0], [2.0, 4.0]]));
    let s = sym(m);
    assert_scalar_eq!(s[0][1], 3.5, comp = abs, tol = 1e-15);
    assert_scalar_eq!(s[1][0], 3.5, comp = abs, tol = 1e-15);
}

#[test]
fn double_contraction_of_higher_rank_tensors() {
    let t3 = Tensor3::<f64, 2, 2, 2>::from_fn(|i, j, k| (i + 2 * j + 4 * k) as f64);
    let m = Matrix::<f64, 2, 2>::from_fn(|j, k| 1.0 + (j + k) as f64);
    let v = ddot(t3, m);
    for i in 0..2 {
        let mut expected = 0.0;
        for j in 0..2 {
            for k in 0..2 {
                expected += (i + 2 * j + 4 * k) as f64 * (1.0 + (j + k) as f64);
            }
        }
        assert_scalar_eq!(v[i], expected, comp = abs, tol = 1e-13);
    }

    let t4 = Tensor4::<f64, 2, 2, 2, 2>::from_fn(|i, j, k, l| (i + j + k + l) as f64);
    let r = ddot(t4, m);
    for i in 0..2 {
        for j in 0..2 {
            let mut expected = 0.0;
            for k in 0..2 {
                for l in 0..2 {
                    expected += (i + j + k + l) as f64 * (1.0 + (k + l) as f64);
                }
            }
            assert_scalar_eq!(r[i][j], expected, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn tensor3_contraction_over_the_last_index() {
    let t3 = Tensor3::<f64, 2, 3, 2>::from_fn(|i, j, k| (1 + i + 3 * j + 2 * k) as f64);
    let v = Vector([0.5, -1.5]);
    let m = dot(t3, v);
    for i in 0..2 {
        for j in 0..3 {
            let expected = t3[i][j][0] * 0.5 - t3[i][j][1] * 1.5;
            assert_scalar_eq!(m[i][j], expected, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn value_semantics_of_arithmetic() {
    let a = Vector([1.0, -2.0, 0.5]);
    let b = a;
    let c = (a + b) * 0.5 - a;
    for i in 0..3 {
        assert_scalar_eq!(c[i], 0.0, comp = abs, tol = 1e-16);
    }
    // a unchanged after use by value
    assert_scalar_eq!(a[1], -2.0, comp = abs, tol = 1e-16);
}
