use matrixcompare::assert_scalar_eq;
use proptest::prelude::*;
use varform::quadrature::{points_per_dim, TensorRule};

#[test]
fn points_per_dim_covers_the_pair_order() {
    assert_eq!(points_per_dim(1, 1), 2);
    assert_eq!(points_per_dim(3, 2), 4);
    assert_eq!(points_per_dim(0, 0), 1);
}

#[test]
fn tensor_rules_have_unit_total_weight() {
    for n in 1..=4 {
        let rule1 = TensorRule::<1>::gauss(n);
        let rule2 = TensorRule::<2>::gauss(n);
        let rule3 = TensorRule::<3>::gauss(n);
        assert_eq!(rule1.len(), n);
        assert_eq!(rule2.len(), n * n);
        assert_eq!(rule3.len(), n * n * n);
        for rule_sum in [
            rule1.weights.iter().sum::<f64>(),
            rule2.weights.iter().sum::<f64>(),
            rule3.weights.iter().sum::<f64>(),
        ] {
            assert_scalar_eq!(rule_sum, 1.0, comp = abs, tol = 1e-14);
        }
    }
}

proptest! {
    // A rule with Q points per dimension integrates monomials up to degree
    // 2Q - 1 along each axis to machine precision.
    #[test]
    fn tensor_rule_is_exact_for_low_degree_monomials(
        q in 1usize..=4,
        a in 0usize..=3,
        b in 0usize..=3,
    ) {
        prop_assume!(a <= 2 * q - 1 && b <= 2 * q - 1);
        let rule = TensorRule::<2>::gauss(q);
        let integral: f64 = rule
            .iter()
            .map(|(w, xi)| w * xi[0].powi(a as i32) * xi[1].powi(b as i32))
            .sum();
        let exact = 1.0 / ((a as f64 + 1.0) * (b as f64 + 1.0));
        prop_assert!((integral - exact).abs() <= 1e-14);
    }
}
