use criterion::{
    black_box,
    criterion_group,
    criterion_main,
    Criterion,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use stowage::{Arena, BufferStream, GrowableArray, Heap, HeapAllocator, Stream, Whence};

fn arena_alloc(c: &mut Criterion) {
    let mut arena = Arena::with_default_config().unwrap();

    c.bench_function("arena alloc usize", |b| {
        b.iter(|| {
            for i in 0..1_000usize {
                black_box(arena.alloc(i).unwrap());
            }
            arena.clear();
        });
    });

    c.bench_function("heap allocator alloc usize", |b| {
        b.iter(|| {
            let mut array = GrowableArray::new();
            for i in 0..1_000usize {
                array.push(Box::new(i)).unwrap();
            }
            black_box(array.len());
        });
    });
}

fn array_push(c: &mut Criterion) {
    c.bench_function("array push 10k", |b| {
        b.iter(|| {
            let mut array = GrowableArray::new();
            for i in 0..10_000u32 {
                array.push(i).unwrap();
            }
            black_box(array.len());
        });
    });

    let mut arena = Arena::new(HeapAllocator, 64 * 1024).unwrap();
    c.bench_function("array push 10k in arena", |b| {
        b.iter(|| {
            let mut array = GrowableArray::new_in(&arena);
            for i in 0..10_000u32 {
                array.push(i).unwrap();
            }
            black_box(array.len());
            drop(array);

            arena.clear();
        });
    });
}

fn heap_insert_remove(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<u64> = (0..10_000).map(|_| rng.gen()).collect();

    c.bench_function("heap insert then drain 10k", |b| {
        b.iter(|| {
            let mut heap = Heap::new_ord();
            for &value in &values {
                heap.insert(value).unwrap();
            }
            while let Some(top) = heap.remove_top() {
                black_box(top);
            }
        });
    });
}

fn stream_write_read(c: &mut Criterion) {
    let chunk = [0xabu8; 256];
    let mut out = [0u8; 256];

    c.bench_function("stream write then read 1MiB", |b| {
        b.iter(|| {
            let mut stream = BufferStream::new();
            for _ in 0..4_096 {
                stream.write(&chunk).unwrap();
            }
            stream.seek(0, Whence::Start).unwrap();
            while let Ok(n) = stream.read(&mut out) {
                black_box(n);
            }
        });
    });
}

criterion_group!(
    benches,
    arena_alloc,
    array_push,
    heap_insert_remove,
    stream_write_read
);
criterion_main!(benches);
