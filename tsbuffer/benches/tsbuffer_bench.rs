//! Benchmarks for ThreadSafeBuffer.

use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use giztoy_tsbuffer::{Config, ThreadSafeBuffer};

fn bench_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("tsbuffer_write_read");

    for size in [64usize, 4096, 65536].iter() {
        let data = vec![0xABu8; *size];
        let mut out = vec![0u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));

        group.bench_with_input(BenchmarkId::new("same_thread", size), size, |b, _| {
            let buf = ThreadSafeBuffer::new(Config::unlimited());
            b.iter(|| {
                buf.write(black_box(&data)).unwrap();
                buf.read(&mut out).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_producer_consumer(c: &mut Criterion) {
    let mut group = c.benchmark_group("tsbuffer_producer_consumer");
    let chunk = 1024;
    let chunks = 256;
    group.throughput(Throughput::Bytes((chunk * chunks) as u64));

    group.bench_function("1_writer_1_reader", |b| {
        b.iter(|| {
            let buf = ThreadSafeBuffer::new(Config::unlimited());
            let writer = buf.clone();

            let producer = thread::spawn(move || {
                let data = vec![1u8; chunk];
                for _ in 0..chunks {
                    writer.write(&data).unwrap();
                }
                writer.close();
            });

            let mut out = vec![0u8; chunk];
            for _ in 0..chunks {
                buf.read(&mut out).unwrap();
            }
            producer.join().unwrap();
            black_box(out)
        });
    });

    group.bench_function("4_writers_1_reader", |b| {
        b.iter(|| {
            let buf = ThreadSafeBuffer::new(Config::unlimited());

            let producers: Vec<_> = (0..4)
                .map(|_| {
                    let writer = buf.clone();
                    thread::spawn(move || {
                        let data = vec![2u8; chunk];
                        for _ in 0..chunks / 4 {
                            writer.write(&data).unwrap();
                        }
                    })
                })
                .collect();

            let mut out = vec![0u8; chunk];
            for _ in 0..chunks {
                buf.read(&mut out).unwrap();
            }
            for producer in producers {
                producer.join().unwrap();
            }
            buf.close();
            black_box(out)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_write_read, bench_producer_consumer);
criterion_main!(benches);
