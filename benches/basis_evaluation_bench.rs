use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fe_basis::basis::Basis;
use fe_basis::basis_type::BasisType;
use fe_basis::registry::BasisRegistry;
use fe_basis::standard::evaluation::StandardBasisEvaluation;

const DESCRIPTIONS: [&str; 3] = [
    "l.Lagrange*l.Lagrange*l.Lagrange",
    "c.Hermite*c.Hermite*c.Hermite",
    "q.simplex(2;3)*q.simplex*q.simplex",
];

fn parse(description: &str) -> BasisType {
    description.parse().expect("valid description")
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("basis_construction");

    for description in DESCRIPTIONS {
        let basis_type = parse(description);

        group.bench_with_input(
            BenchmarkId::new("build", description),
            &basis_type,
            |b, t| {
                b.iter(|| black_box(Basis::new(t.clone()).expect("basis builds")));
            },
        );

        group.bench_with_input(
            BenchmarkId::new("registry_lookup", description),
            &basis_type,
            |b, t| {
                let registry = BasisRegistry::new();
                let _keep = registry.get_or_create(t).expect("basis builds");
                b.iter(|| black_box(registry.get_or_create(t).expect("registered")));
            },
        );
    }
    group.finish();
}

fn bench_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("basis_evaluation");
    let points: Vec<[f64; 3]> = (0..64)
        .map(|i| {
            let s = f64::from(i) / 64.0;
            [0.5 * s, 0.25 * (1.0 - s), 0.5 * s * s]
        })
        .collect();

    for description in DESCRIPTIONS {
        let basis = Basis::new(parse(description)).expect("basis builds");

        for order in [0usize, 1, 2] {
            group.bench_with_input(
                BenchmarkId::new(format!("no_cache/order{order}"), description),
                &order,
                |b, &order| {
                    b.iter(|| {
                        for xi in &points {
                            black_box(basis.evaluate(xi, order).expect("evaluates"));
                        }
                    });
                },
            );

            group.bench_with_input(
                BenchmarkId::new(format!("cached/order{order}"), description),
                &order,
                |b, &order| {
                    let mut cache = StandardBasisEvaluation::new();
                    b.iter(|| {
                        for xi in &points {
                            // values first, then the derivatives from the same cache
                            black_box(basis.evaluate_with(&mut cache, xi, 0).expect("evaluates"));
                            black_box(basis.evaluate_with(&mut cache, xi, order).expect("evaluates"));
                        }
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_construction, bench_evaluation);
criterion_main!(benches);
