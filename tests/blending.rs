use fe_basis::config::MAXIMUM_POLYGON_VERTICES;
use fe_basis::prelude::*;
use proptest::prelude::*;

const TOL: f64 = 1e-12;

fn basis(description: &str) -> Basis {
    Basis::new(description.parse().expect("valid description")).expect("basis builds")
}

fn assert_close(a: f64, b: f64, what: &str) {
    assert!((a - b).abs() < TOL, "{what}: {a} != {b}");
}

#[test]
fn one_dimensional_families_interpolate_their_nodes() {
    for family in [
        BasisFunctionType::LinearLagrange,
        BasisFunctionType::QuadraticLagrange,
        BasisFunctionType::CubicLagrange,
        BasisFunctionType::CubicHermite,
        BasisFunctionType::HermiteLagrange,
        BasisFunctionType::LagrangeHermite,
    ] {
        let b = Basis::new(BasisType::tensor_product(&[family]).unwrap()).unwrap();
        let nodes = family.nodes_in_xi().unwrap();
        assert_eq!(b.node_count(), nodes, "{family}");
        for node in 0..nodes {
            let x = node as f64 / (nodes - 1) as f64;
            let values = b.evaluate(&[x], 0).unwrap();
            let slopes = b.evaluate(&[x], 1).unwrap();
            let node_has_slope = b
                .function_number_from_node_and_derivative(node, 1)
                .unwrap()
                .is_some();
            for f in 0..b.number_of_functions() {
                let own = b.function_node(f).unwrap() == node;
                let derivative = b.function_derivative(f).unwrap();
                let expected = if own && derivative == 0 { 1.0 } else { 0.0 };
                assert_close(values[f], expected, &format!("{family} f{f} at node {node}"));
                if node_has_slope {
                    let expected = if own && derivative == 1 { 1.0 } else { 0.0 };
                    assert_close(slopes[f], expected, &format!("{family} f{f}' at node {node}"));
                }
            }
        }
    }
}

#[test]
fn constant_family_is_one_everywhere() {
    let b = basis("constant*l.Lagrange");
    assert_eq!(b.number_of_functions(), 2);
    for x in [0.0, 0.4, 1.0] {
        let values = b.evaluate(&[x, 0.0], 0).unwrap();
        assert_close(values[0], 1.0, "constant at its node");
        assert_close(values[1], 0.0, "constant with far linear node");
    }
}

#[test]
fn hermite_lagrange_sides() {
    let hl = basis("HermiteLagrange");
    assert_eq!(hl.number_of_functions(), 3);
    assert_eq!(hl.functions_per_node(0).unwrap(), 2);
    assert_eq!(hl.functions_per_node(1).unwrap(), 1);

    let lh = basis("LagrangeHermite");
    assert_eq!(lh.functions_per_node(0).unwrap(), 1);
    assert_eq!(lh.functions_per_node(1).unwrap(), 2);
}

#[test]
fn tensor_product_counts() {
    for (description, functions, nodes) in [
        ("constant", 1, 1),
        ("l.Lagrange*l.Lagrange", 4, 4),
        ("q.Lagrange*q.Lagrange", 9, 9),
        ("c.Lagrange*l.Lagrange", 8, 8),
        ("c.Hermite*c.Hermite", 16, 4),
        ("l.Lagrange*l.Lagrange*l.Lagrange", 8, 8),
        ("q.Lagrange*c.Hermite", 12, 6),
        ("c.Hermite*c.Hermite*c.Hermite", 64, 8),
    ] {
        let b = basis(description);
        assert_eq!(b.number_of_functions(), functions, "{description}");
        assert_eq!(b.number_of_standard_functions(), functions, "{description}");
        assert_eq!(b.node_count(), nodes, "{description}");
        assert_eq!(b.standard_basis().function(), StandardBasisFunction::Monomial);
    }
}

#[test]
fn bicubic_hermite_node_layout() {
    let b = basis("c.Hermite*c.Hermite");
    for node in 0..4 {
        assert_eq!(b.functions_per_node(node).unwrap(), 4);
        for derivative in 0..4u32 {
            let f = b
                .function_number_from_node_and_derivative(node, derivative)
                .unwrap()
                .expect("every derivative present");
            assert_eq!(f, 4 * node + derivative as usize);
        }
    }
    assert!(b.functions_per_node(4).is_err());
}

#[test]
fn tied_group_counts() {
    for (description, functions, standard) in [
        ("l.simplex(2)*l.simplex", 3, 4),
        ("q.simplex(2)*q.simplex", 6, 9),
        ("l.simplex(2;3)*l.simplex*l.simplex", 4, 8),
        ("q.simplex(2;3)*q.simplex*q.simplex", 10, 27),
        ("l.simplex(2)*l.simplex*l.Lagrange", 6, 8),
        ("c.HermiteSerendipity(2)*c.HermiteSerendipity", 12, 16),
        ("c.HermiteSerendipity(2;3)*c.HermiteSerendipity*c.HermiteSerendipity", 32, 64),
    ] {
        let b = basis(description);
        assert_eq!(b.number_of_functions(), functions, "{description}");
        assert_eq!(b.number_of_standard_functions(), standard, "{description}");
    }
}

#[test]
fn simplex_vertices_are_interpolatory() {
    for description in ["l.simplex(2)*l.simplex", "q.simplex(2)*q.simplex"] {
        let b = basis(description);
        for vertex in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            let values = b.evaluate(&vertex, 0).unwrap();
            let ones = values.iter().filter(|v| (*v - 1.0).abs() < TOL).count();
            let zeros = values.iter().filter(|v| v.abs() < TOL).count();
            assert_eq!((ones, zeros), (1, values.len() - 1), "{description} at {vertex:?}");
        }
    }
}

#[test]
fn polygon_basis_blends_centre_and_vertices() {
    let b = basis("polygon(5;2)*polygon");
    assert_eq!(b.number_of_functions(), 6);
    assert_eq!(b.number_of_standard_functions(), 20);
    assert_eq!(b.standard_basis().function(), StandardBasisFunction::Polygon);
    // centre
    let values = b.evaluate(&[0.3, 0.0], 0).unwrap();
    assert_close(values[0], 1.0, "centre");
    // vertex 2 on the outer boundary
    let values = b.evaluate(&[0.4, 1.0], 0).unwrap();
    for (f, v) in values.iter().enumerate() {
        assert_close(*v, if f == 3 { 1.0 } else { 0.0 }, &format!("f{f} at vertex 2"));
    }
}

#[test]
fn polygon_vertex_count_is_bounded() {
    let largest = basis(&format!("polygon({MAXIMUM_POLYGON_VERTICES};2)*polygon"));
    assert_eq!(largest.number_of_functions(), MAXIMUM_POLYGON_VERTICES + 1);
    assert_eq!(largest.number_of_standard_functions(), 4 * MAXIMUM_POLYGON_VERTICES);
    let values = largest.evaluate(&[0.5, 1.0], 0).unwrap();
    assert_close(values[MAXIMUM_POLYGON_VERTICES / 2 + 1], 1.0, "opposite vertex");

    for array in [[2, 11, i32::MAX, 11], [2, 11, 257, 11]] {
        assert!(matches!(
            BasisType::from_array(&array),
            Err(BasisError::InvalidBasisType(_))
        ));
    }
}

#[test]
fn blending_raw_values_matches_evaluation() {
    let b = basis("q.Lagrange*c.Hermite");
    let raw: Vec<f64> = (0..b.number_of_functions()).map(|f| 0.5 + f as f64).collect();
    let blended = b.blend_raw_element_values(&raw).unwrap();
    let xi = [0.3, 0.8];
    let standard = b.standard_basis().evaluate(&xi).unwrap();
    let via_blend: f64 = blended.iter().zip(&standard).map(|(c, s)| c * s).sum();
    let nodal = b.evaluate(&xi, 0).unwrap();
    let direct: f64 = raw.iter().zip(&nodal).map(|(r, v)| r * v).sum();
    assert!((via_blend - direct).abs() < 1e-10);
    assert!(matches!(
        b.blend_raw_element_values(&raw[1..]),
        Err(BasisError::DimensionMismatch { .. })
    ));
}

fn sum_of_values(b: &Basis, xi: &[f64]) -> f64 {
    let values = b.evaluate(xi, 0).unwrap();
    (0..b.number_of_functions())
        .filter(|&f| b.function_derivative(f).unwrap() == 0)
        .map(|f| values[f])
        .sum()
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

proptest! {
    #[test]
    fn value_functions_partition_unity(x in 0.0f64..1.0, y in 0.0f64..1.0, z in 0.0f64..1.0) {
        for description in [
            "l.Lagrange*q.Lagrange*c.Lagrange",
            "c.Hermite*LagrangeHermite*HermiteLagrange",
            "c.HermiteSerendipity(2)*c.HermiteSerendipity*l.Lagrange",
            "polygon(6;3)*q.Lagrange*polygon",
        ] {
            let b = basis(description);
            prop_assert!((sum_of_values(&b, &[x, y, z]) - 1.0).abs() < 1e-10, "{}", description);
        }
    }

    #[test]
    fn simplex_functions_partition_unity(a in 0.0f64..1.0, c in 0.0f64..1.0, z in 0.0f64..1.0) {
        // points inside the reference triangle
        let (x, y) = (a * (1.0 - c), c);
        for description in [
            "l.simplex(2)*l.simplex*q.Lagrange",
            "q.simplex(2)*q.simplex*l.Lagrange",
        ] {
            let b = basis(description);
            prop_assert!((sum_of_values(&b, &[x, y, z]) - 1.0).abs() < 1e-10, "{}", description);
        }
    }

    #[test]
    fn interleaved_ties_match_adjacent_ties(a in 0.0f64..1.0, c in 0.0f64..1.0, y in 0.0f64..1.0) {
        let (x, z) = (a * (1.0 - c), c);
        let interleaved = basis("l.simplex(3)*q.Lagrange*l.simplex");
        let adjacent = basis("l.simplex(2)*l.simplex*q.Lagrange");
        prop_assert_eq!(interleaved.number_of_functions(), adjacent.number_of_functions());
        let left = sorted(interleaved.evaluate(&[x, y, z], 0).unwrap());
        let right = sorted(adjacent.evaluate(&[x, z, y], 0).unwrap());
        for (l, r) in left.iter().zip(&right) {
            prop_assert!((l - r).abs() < 1e-10);
        }
    }
}
