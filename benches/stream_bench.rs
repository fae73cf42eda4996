use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;

use marq::block::CompressionMethod;
use marq::cache::BlockCache;
use marq::conf::ReaderSettings;
use marq::io::LocalDisk;
use marq::marks::{GranularityInfo, MarkRange};
use marq::reader::ReaderStream;
use marq::testutil::{WrittenColumn, write_uniform_column};

const BLOCKS: usize = 64;
const GROUPS_PER_BLOCK: usize = 16;
const GROUP_LEN: usize = 256;
const NUM_SEEKS: usize = 1000;
const RNG_SEED: u64 = 42;

fn open_stream(
    dir: &TempDir,
    written: &WrittenColumn,
    block_cache: Option<Arc<BlockCache>>,
) -> ReaderStream {
    ReaderStream::new(
        Arc::new(LocalDisk::new(dir.path())),
        &written.path_prefix,
        ".bin",
        written.marks_count(),
        &vec![MarkRange::new(0, written.marks_count())],
        &ReaderSettings::default(),
        None,
        block_cache,
        written.file_size,
        &GranularityInfo::default(),
        None,
    )
    .unwrap()
}

fn seek_plan(marks_count: usize) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    (0..NUM_SEEKS).map(|_| rng.gen_range(0..marks_count)).collect()
}

fn run_seeks(stream: &mut ReaderStream, plan: &[usize], buf: &mut [u8]) {
    for &index in plan {
        stream.seek_to_mark(index).unwrap();
        stream.data_buffer().read_exact(buf).unwrap();
    }
}

fn bench_random_seeks(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let written = write_uniform_column(
        dir.path(),
        "part0/value",
        CompressionMethod::Lz4,
        BLOCKS,
        GROUPS_PER_BLOCK,
        GROUP_LEN,
    )
    .unwrap();
    let plan = seek_plan(written.marks_count());
    let mut buf = vec![0u8; GROUP_LEN];

    let mut group = c.benchmark_group(format!("stream/blocks_{BLOCKS}"));
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(15));
    group.warm_up_time(Duration::from_secs(3));
    group.throughput(Throughput::Elements(NUM_SEEKS as u64));

    group.bench_with_input(BenchmarkId::new("plain", NUM_SEEKS), &NUM_SEEKS, |b, _| {
        let mut stream = open_stream(&dir, &written, None);
        b.iter(|| run_seeks(black_box(&mut stream), &plan, &mut buf))
    });

    group.bench_with_input(BenchmarkId::new("cached", NUM_SEEKS), &NUM_SEEKS, |b, _| {
        let cache = Arc::new(BlockCache::new(BLOCKS));
        let mut stream = open_stream(&dir, &written, Some(cache));
        // Warm the cache so the measurement covers the hit path.
        run_seeks(&mut stream, &plan, &mut buf);
        b.iter(|| run_seeks(black_box(&mut stream), &plan, &mut buf))
    });

    group.finish();
}

criterion_group!(benches, bench_random_seeks);
criterion_main!(benches);
