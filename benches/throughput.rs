use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringmpmc_rs::Channel;
use std::sync::Arc;
use std::thread;

const MSG_PER_PRODUCER: u64 = 1_000_000;
const CHANNEL_CAPACITY: usize = 4096;

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_PER_PRODUCER));

    group.bench_function("single_producer_consumer", |b| {
        b.iter(|| {
            let channel = Arc::new(Channel::<u64>::new(CHANNEL_CAPACITY).unwrap());

            let ch = Arc::clone(&channel);
            let producer_handle = thread::spawn(move || {
                for i in 0..MSG_PER_PRODUCER {
                    ch.send(i).ensure_success();
                }
            });

            let mut count = 0u64;
            while count < MSG_PER_PRODUCER {
                if channel.recv().is_success() {
                    black_box(());
                    count += 1;
                }
            }

            producer_handle.join().unwrap();
        });
    });

    group.finish();
}

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");

    for &n in [2usize, 4, 8].iter() {
        let total_msgs = MSG_PER_PRODUCER * (n as u64);
        group.throughput(Throughput::Elements(total_msgs));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{n}P_{n}C")),
            &n,
            |b, &n| {
                b.iter(|| {
                    let channel = Arc::new(Channel::<u64>::new(CHANNEL_CAPACITY).unwrap());

                    let producer_handles: Vec<_> = (0..n)
                        .map(|_| {
                            let ch = Arc::clone(&channel);
                            thread::spawn(move || {
                                for i in 0..MSG_PER_PRODUCER {
                                    ch.send(i).ensure_success();
                                }
                            })
                        })
                        .collect();

                    let consumer_handles: Vec<_> = (0..n)
                        .map(|_| {
                            let ch = Arc::clone(&channel);
                            thread::spawn(move || {
                                let mut count = 0u64;
                                while count < total_msgs / (n as u64) {
                                    if let ringmpmc_rs::RecvOutcome::Success(v) = ch.recv() {
                                        black_box(v);
                                        count += 1;
                                    } else {
                                        break;
                                    }
                                }
                                count
                            })
                        })
                        .collect();

                    for h in producer_handles {
                        h.join().unwrap();
                    }
                    for h in consumer_handles {
                        h.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("try_send_try_recv_contention");

    group.bench_function("capacity_1", |b| {
        let channel = Channel::<u64>::new(1).unwrap();
        b.iter(|| {
            let _ = channel.try_send(black_box(1));
            let _ = black_box(channel.try_recv());
        });
    });

    group.bench_function("capacity_4096", |b| {
        let channel = Channel::<u64>::new(CHANNEL_CAPACITY).unwrap();
        b.iter(|| {
            let _ = channel.try_send(black_box(1));
            let _ = black_box(channel.try_recv());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_spsc, bench_mpmc, bench_contention);
criterion_main!(benches);
