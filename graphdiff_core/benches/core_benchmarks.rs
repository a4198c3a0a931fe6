use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphdiff_common::{ComparisonOptions, Diffable, ScalarKind, TypeDescriptor, TypeInfo, Value};
use graphdiff_core::{diff, diff_lines, diff_with, DiffProvider, ObjectRef};

// Pseudo-random text with a controlled share of edited lines
fn create_text(lines: usize, seed: u64, edit_every: usize) -> String {
    let mut state = seed;
    (0..lines)
        .map(|i| {
            if edit_every > 0 && i % edit_every == 0 {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                format!("edited line {} {}", i, state >> 33)
            } else {
                format!("line {} of the document", i)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Balanced object tree: every node has a label, a weight and `fan_out` children
fn create_tree(depth: usize, fan_out: usize, weight: i64) -> Value {
    let descriptor = TypeDescriptor::builder("TreeNode")
        .property("Label", TypeInfo::scalar(ScalarKind::String))
        .property("Weight", TypeInfo::scalar(ScalarKind::I64))
        .property("Children", TypeInfo::collection("Vec<TreeNode>"))
        .build();
    build_node(&descriptor, depth, fan_out, weight).to_value()
}

fn build_node(
    descriptor: &std::sync::Arc<TypeDescriptor>,
    depth: usize,
    fan_out: usize,
    weight: i64,
) -> ObjectRef {
    let children: Vec<Value> = if depth == 0 {
        Vec::new()
    } else {
        (0..fan_out)
            .map(|i| Value::Object(build_node(descriptor, depth - 1, fan_out, weight + i as i64)))
            .collect()
    };
    ObjectRef::new(descriptor.clone())
        .with("Label", format!("node-{}-{}", depth, weight))
        .with("Weight", weight)
        .with(
            "Children",
            Value::collection(TypeInfo::collection("Vec<TreeNode>"), children),
        )
}

fn bench_text_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_diff_lines");
    for lines in [100, 1_000, 5_000] {
        let left = create_text(lines, 1, 0);
        let right = create_text(lines, 7, 10);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| black_box(diff_lines(black_box(&left), black_box(&right))));
        });
    }
    group.finish();
}

fn bench_graph_identical(c: &mut Criterion) {
    let left = create_tree(4, 4, 0);
    let right = create_tree(4, 4, 0);
    c.bench_function("graph_diff_identical_341_nodes", |b| {
        b.iter(|| black_box(diff(black_box(&left), black_box(&right)).unwrap()));
    });
}

fn bench_graph_all_different(c: &mut Criterion) {
    let left = create_tree(4, 4, 0);
    let right = create_tree(4, 4, 1);
    c.bench_function("graph_diff_all_different_341_nodes", |b| {
        b.iter(|| black_box(diff(black_box(&left), black_box(&right)).unwrap()));
    });
}

fn bench_unordered_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("unordered_scalars");
    let options = ComparisonOptions::ALL | ComparisonOptions::ALLOW_COLLECTIONS_OUT_OF_ORDER;
    for size in [100usize, 1_000, 10_000] {
        let left: Vec<i64> = (0..size as i64).collect();
        let right: Vec<i64> = left.iter().rev().copied().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(diff_with(black_box(&left), black_box(&right), options).unwrap()));
        });
    }
    group.finish();
}

fn bench_unordered_objects(c: &mut Criterion) {
    let left = create_tree(2, 12, 0);
    let right = create_tree(2, 12, 0);
    let provider = DiffProvider::new();
    let options = ComparisonOptions::ALL | ComparisonOptions::ALLOW_COLLECTIONS_OUT_OF_ORDER;
    c.bench_function("unordered_objects_157_nodes", |b| {
        b.iter(|| black_box(provider.compute_diff_with(&left, &right, options).unwrap()));
    });
}

criterion_group!(text_benches, bench_text_diff);

criterion_group!(
    graph_benches,
    bench_graph_identical,
    bench_graph_all_different
);

criterion_group!(
    collection_benches,
    bench_unordered_collections,
    bench_unordered_objects
);

criterion_main!(text_benches, graph_benches, collection_benches);
