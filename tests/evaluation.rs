use fe_basis::prelude::*;

const H: f64 = 1e-5;
const FD_TOL: f64 = 1e-6;

fn basis(description: &str) -> Basis {
    Basis::new(description.parse().expect("valid description")).expect("basis builds")
}

fn shifted(xi: &[f64], d: usize, step: f64) -> Vec<f64> {
    let mut out = xi.to_vec();
    out[d] += step;
    out
}

/// Central differences of `order - 1` values along every direction,
/// laid out like the evaluated derivative blocks of `order`.
fn central_difference(b: &Basis, xi: &[f64], order: usize) -> Vec<f64> {
    let dimension = xi.len();
    let lower_len = b.evaluate(xi, order - 1).unwrap().len();
    let mut out = vec![0.0; lower_len * dimension];
    for d in 0..dimension {
        let plus = b.evaluate(&shifted(xi, d, H), order - 1).unwrap();
        let minus = b.evaluate(&shifted(xi, d, -H), order - 1).unwrap();
        for (i, (p, m)) in plus.iter().zip(&minus).enumerate() {
            out[d * lower_len + i] = (p - m) / (2.0 * H);
        }
    }
    out
}

#[test]
fn first_derivatives_match_finite_differences() {
    for (description, xi) in [
        ("l.Lagrange*l.Lagrange", vec![0.3, 0.6]),
        ("c.Hermite*c.Hermite", vec![0.25, 0.7]),
        ("l.Lagrange*l.Lagrange*l.Lagrange", vec![0.2, 0.5, 0.9]),
        ("q.simplex(2)*q.simplex*c.Lagrange", vec![0.2, 0.3, 0.4]),
        ("c.HermiteSerendipity(2)*c.HermiteSerendipity", vec![0.45, 0.15]),
    ] {
        let b = basis(description);
        let exact = b.evaluate(&xi, 1).unwrap();
        assert_eq!(exact.len(), xi.len() * b.number_of_functions());
        let approx = central_difference(&b, &xi, 1);
        for (i, (e, a)) in exact.iter().zip(&approx).enumerate() {
            assert!((e - a).abs() < FD_TOL, "{description} entry {i}: {e} vs {a}");
        }
    }
}

#[test]
fn second_derivatives_match_finite_differences() {
    let b = basis("c.Hermite*q.Lagrange");
    let xi = [0.35, 0.55];
    let exact = b.evaluate(&xi, 2).unwrap();
    let approx = central_difference(&b, &xi, 2);
    assert_eq!(exact.len(), approx.len());
    for (i, (e, a)) in exact.iter().zip(&approx).enumerate() {
        assert!((e - a).abs() < FD_TOL, "entry {i}: {e} vs {a}");
    }
}

#[test]
fn mixed_second_derivatives_are_symmetric() {
    let b = basis("c.Hermite*c.Hermite*l.Lagrange");
    let n = b.number_of_functions();
    let d2 = b.evaluate(&[0.1, 0.4, 0.8], 2).unwrap();
    assert_eq!(d2.len(), 9 * n);
    for a in 0..3 {
        for c in 0..3 {
            let ac = &d2[(c * 3 + a) * n..(c * 3 + a + 1) * n];
            let ca = &d2[(a * 3 + c) * n..(a * 3 + c + 1) * n];
            for (x, y) in ac.iter().zip(ca) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }
}

#[test]
fn bilinear_centre_values() {
    let b = basis("l.Lagrange*l.Lagrange");
    assert_eq!(b.evaluate(&[0.5, 0.5], 0).unwrap(), vec![0.25; 4]);
}

#[test]
fn third_order_derivatives_of_cubic_are_constant() {
    let b = basis("c.Lagrange");
    let at = |x: f64| b.evaluate(&[x], 3).unwrap();
    let (left, right) = (at(0.1), at(0.9));
    for (l, r) in left.iter().zip(&right) {
        assert!((l - r).abs() < 1e-9);
    }
}

#[test]
fn polygon_derivatives_are_unsupported() {
    let b = basis("polygon(4;2)*polygon");
    assert!(b.evaluate(&[0.1, 0.5], 0).is_ok());
    assert!(matches!(
        b.evaluate(&[0.1, 0.5], 1),
        Err(BasisError::UnsupportedOperation(_))
    ));
}

#[test]
fn derivative_order_limit() {
    let b = basis("l.Lagrange");
    assert!(matches!(
        b.evaluate(&[0.5], 4),
        Err(BasisError::LimitExceeded { requested: 4, limit: 3, .. })
    ));

    let mut cache = StandardBasisEvaluation::with_config(EvaluationConfig {
        maximum_derivative_order: 1,
        ..EvaluationConfig::default()
    });
    assert!(b.evaluate_with(&mut cache, &[0.5], 1).is_ok());
    assert!(matches!(
        b.evaluate_with(&mut cache, &[0.5], 2),
        Err(BasisError::LimitExceeded { limit: 1, .. })
    ));
}

#[test]
fn wrong_point_dimension_is_rejected() {
    let b = basis("l.Lagrange*l.Lagrange");
    assert!(matches!(
        b.evaluate(&[0.5], 0),
        Err(BasisError::DimensionMismatch { expected: 2, found: 1 })
    ));
}

#[test]
fn cache_is_reused_and_refreshed() {
    let b = basis("q.Lagrange*q.Lagrange");
    let mut cache = StandardBasisEvaluation::new();
    assert_eq!(cache.derivative_order_evaluated(), None);

    let second = b.evaluate_with(&mut cache, &[0.2, 0.7], 2).unwrap();
    assert_eq!(cache.derivative_order_evaluated(), Some(2));
    assert_eq!(cache.cached(1).map(<[f64]>::len), Some(2 * 9));

    // lower orders at the same point come from the cache
    let values = b.evaluate_with(&mut cache, &[0.2, 0.7], 0).unwrap();
    assert_eq!(cache.derivative_order_evaluated(), Some(2));
    assert_eq!(values, b.evaluate(&[0.2, 0.7], 0).unwrap());
    assert_eq!(second, b.evaluate(&[0.2, 0.7], 2).unwrap());

    // a new point starts over
    b.evaluate_with(&mut cache, &[0.9, 0.1], 0).unwrap();
    assert_eq!(cache.derivative_order_evaluated(), Some(0));
    assert!(cache.cached(1).is_none());

    cache.invalidate_cache();
    assert_eq!(cache.derivative_order_evaluated(), None);
}

#[test]
fn cache_follows_basis_changes() {
    let linear = basis("l.Lagrange*l.Lagrange");
    let quadratic = basis("q.Lagrange*q.Lagrange");
    let mut cache = StandardBasisEvaluation::new();
    let a = linear.evaluate_with(&mut cache, &[0.3, 0.3], 1).unwrap();
    let b = quadratic.evaluate_with(&mut cache, &[0.3, 0.3], 1).unwrap();
    assert_eq!(a.len(), 2 * 4);
    assert_eq!(b.len(), 2 * 9);
    assert_eq!(b, quadratic.evaluate(&[0.3, 0.3], 1).unwrap());
}
