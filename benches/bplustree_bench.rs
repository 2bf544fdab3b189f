use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use minisql::{BPlusTree, Database};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::hint::black_box;

const N: i64 = 10_000;

fn shuffled_keys(n: i64) -> Vec<i64> {
    let mut keys: Vec<i64> = (0..n).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(42));
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("BPlusTree_Insert");
    let keys = shuffled_keys(N);

    for order in [4usize, 16, 64].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(order), order, |b, &order| {
            b.iter(|| {
                let mut tree = BPlusTree::new(order).unwrap();
                for &k in &keys {
                    tree.insert(k, k);
                }
                black_box(tree.len());
            });
        });
    }
    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("BPlusTree_Search");
    let keys = shuffled_keys(N);

    for order in [4usize, 16, 64].iter() {
        let mut tree = BPlusTree::new(*order).unwrap();
        for &k in &keys {
            tree.insert(k, k);
        }
        group.bench_with_input(BenchmarkId::from_parameter(order), &tree, |b, tree| {
            b.iter(|| {
                for k in (0..N).step_by(97) {
                    black_box(tree.search(&k));
                }
            });
        });
    }
    group.finish();
}

fn bench_select_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Scan");

    for n in [1000, 5000].iter() {
        let db = Database::in_memory().unwrap();
        db.execute("CREATE TABLE users (id INT PRIMARY KEY, name STRING, age INT)")
            .unwrap();
        for i in 0..*n {
            db.execute(&format!(
                "INSERT INTO users (id, name, age) VALUES ({}, 'user{}', {})",
                i,
                i,
                i % 100
            ))
            .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(n), &db, |b, db| {
            b.iter(|| {
                let res = db.execute("SELECT id, name FROM users WHERE age = 42").unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_search, bench_select_scan);
criterion_main!(benches);
