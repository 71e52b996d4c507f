use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use media_ingest::checksum::calculate_md5;
use media_ingest::prober::parse_probe_output;
use std::hint::black_box;
use std::io::Write;

fn checksum_benchmark(c: &mut Criterion) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let payload: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    file.write_all(&payload).unwrap();
    file.flush().unwrap();

    let mut group = c.benchmark_group("checksum");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("md5_4mib", |b| {
        b.iter(|| calculate_md5(black_box(file.path())).unwrap())
    });
    group.finish();
}

fn probe_parse_benchmark(c: &mut Criterion) {
    let output = "width=1920\nheight=1080\nbit_rate=4500000\nbit_rate=128000\n";
    c.bench_function("parse_probe_output", |b| {
        b.iter(|| parse_probe_output(black_box(output)).unwrap())
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .significance_level(0.1)
        .noise_threshold(0.05)
        .configure_from_args();
    targets = checksum_benchmark, probe_parse_benchmark
}
criterion_main!(benches);
