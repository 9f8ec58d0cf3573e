use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mdgraph_hash::ObjectId;
use mdgraph_merge::{merge_paths, PathInfo};
use mdgraph_odb::{MemoryStore, ObjectStore, Realm};

/// Realm holding `width^3` leaves three levels deep.
fn populated(width: usize) -> (MemoryStore, Realm, ObjectId) {
    let store = MemoryStore::new();
    let realm = Realm::new("bench");
    let mut batch = Vec::new();
    for i in 0..width {
        for j in 0..width {
            for k in 0..width {
                let oid = store.write_blob(&realm, format!("{i}.{j}.{k}").as_bytes()).unwrap();
                batch.push(PathInfo::file(&format!("d{i}/d{j}/f{k}"), oid).unwrap());
            }
        }
    }
    let (root, _) = merge_paths(&store, &realm, None, batch).unwrap();
    (store, realm, root)
}

fn merge_small_batch(c: &mut Criterion) {
    let (store, realm, root) = populated(16);
    let leaf = store.write_blob(&realm, b"new leaf").unwrap();

    let mut group = c.benchmark_group("merge");

    group.bench_function("one_leaf_into_4096", |b| {
        b.iter(|| {
            let info = PathInfo::file("d3/d7/new", leaf).unwrap();
            merge_paths(&store, &realm, Some(black_box(root)), [info]).unwrap()
        })
    });

    group.bench_function("spread_16_into_4096", |b| {
        b.iter_batched(
            || {
                (0..16)
                    .map(|i| PathInfo::file(&format!("d{i}/d{i}/new"), leaf).unwrap())
                    .collect::<Vec<_>>()
            },
            |batch| merge_paths(&store, &realm, Some(black_box(root)), batch).unwrap(),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn build_from_empty(c: &mut Criterion) {
    c.bench_function("build_512_from_empty", |b| b.iter(|| populated(black_box(8))));
}

criterion_group!(benches, merge_small_batch, build_from_empty);
criterion_main!(benches);
