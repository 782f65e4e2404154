use criterion::{black_box, criterion_group, criterion_main, Criterion};
use verge_semver::{Constraint, Version};

fn bench_parse_version(c: &mut Criterion) {
    let versions = [
        "1.2.3",
        "v1.2.3",
        "1.0",
        "1.2-beta.5",
        "1.2.0-x.Y.0+metadata",
        "2.3.4-rc1-with-hypen",
    ];

    c.bench_function("parse_version", |b| {
        b.iter(|| {
            for version in versions {
                black_box(Version::parse(black_box(version)).ok());
            }
        })
    });
}

fn bench_compare(c: &mut Criterion) {
    let left = Version::parse("1.2.3-alpha.10").unwrap();
    let right = Version::parse("1.2.3-alpha.2").unwrap();

    c.bench_function("compare_versions", |b| {
        b.iter(|| black_box(black_box(&left).compare(black_box(&right))))
    });
}

fn bench_parse_constraint(c: &mut Criterion) {
    let constraints = [
        "=2.0",
        "~2.0.0",
        "^2.0.0",
        "1.x",
        ">=2.1.x, <3.1.0",
        "~2.0.0 || =3.1.0",
        "1.2.3 - 2.0.0",
    ];

    c.bench_function("parse_constraint", |b| {
        b.iter(|| {
            for constraint in constraints {
                black_box(Constraint::parse(black_box(constraint)).ok());
            }
        })
    });
}

fn bench_check(c: &mut Criterion) {
    let cases = [
        ("^1.2.0", "1.2.3"),
        ("~2.4", "2.4.5"),
        (">=1.2.3 <2.0.0", "1.9.0"),
        ("1.2.x || 2.x", "2.1.3"),
        ("^1.2.3", "1.2.3-beta"),
    ];
    let parsed: Vec<(Constraint, Version)> = cases
        .iter()
        .map(|(c, v)| (Constraint::parse(c).unwrap(), Version::parse(v).unwrap()))
        .collect();

    c.bench_function("check", |b| {
        b.iter(|| {
            for (constraint, version) in &parsed {
                black_box(constraint.check(black_box(version)));
            }
        })
    });
}

fn bench_validate(c: &mut Criterion) {
    let constraint = Constraint::parse(">=1.3.0 <2.0.0 || >=3.0.0 <3.5.0").unwrap();
    let version = Version::parse("2.5.0").unwrap();

    c.bench_function("validate", |b| {
        b.iter(|| black_box(constraint.validate(black_box(&version))))
    });
}

fn bench_intersection(c: &mut Criterion) {
    let a = Constraint::parse("^1.0.0 || ~2.1.0").unwrap();
    let b = Constraint::parse(">=1.5.0 <2.2.0").unwrap();

    c.bench_function("intersection", |bench| {
        bench.iter(|| black_box(black_box(&a).intersection(black_box(&b))))
    });
}

fn bench_is_subset(c: &mut Criterion) {
    let sub = Constraint::parse(">=3.1.0 <3.5.0 || >=1.7.0 <1.9.0").unwrap();
    let sup = Constraint::parse(">=3.0.0 <3.5.0 || >=1.5.0 <2.0.0").unwrap();

    c.bench_function("is_subset", |bench| {
        bench.iter(|| black_box(black_box(&sub).is_subset_of(black_box(&sup))))
    });
}

criterion_group!(
    benches,
    bench_parse_version,
    bench_compare,
    bench_parse_constraint,
    bench_check,
    bench_validate,
    bench_intersection,
    bench_is_subset
);
criterion_main!(benches);
