use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ringfence::{MpmcRing, MpscRing, SpscRing};
use std::thread;

const MSG_COUNT: u64 = 1_000_000;
const BATCH_SIZE: usize = 256;

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MSG_COUNT));

    for capacity in [64u32, 1024, 16384] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let mut ring = SpscRing::<u64>::new(capacity);
                    let (mut tx, mut rx) = ring.split();

                    thread::scope(|s| {
                        s.spawn(move || {
                            let batch: Vec<u64> = (0..BATCH_SIZE as u64).collect();
                            let mut sent = 0u64;
                            while sent < MSG_COUNT {
                                let want = BATCH_SIZE.min((MSG_COUNT - sent) as usize);
                                let n = tx.put(&batch[..want]);
                                if n == 0 {
                                    std::hint::spin_loop();
                                }
                                sent += n as u64;
                            }
                        });

                        let mut buf = vec![0u64; BATCH_SIZE];
                        let mut count = 0u64;
                        while count < MSG_COUNT {
                            let n = rx.get(&mut buf);
                            if n == 0 {
                                std::hint::spin_loop();
                            }
                            black_box(&buf[..n]);
                            count += n as u64;
                        }
                    });
                });
            },
        );
    }

    group.finish();
}

fn bench_mpsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpsc");

    for producers in [2u64, 4] {
        let total = MSG_COUNT * producers;
        group.throughput(Throughput::Elements(total));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{producers}P_1C")),
            &producers,
            |b, &producers| {
                b.iter(|| {
                    let mut ring = MpscRing::<u64>::new(4096);
                    let (tx, mut rx) = ring.split();

                    thread::scope(|s| {
                        for _ in 0..producers {
                            s.spawn(move || {
                                let batch: Vec<u64> = (0..BATCH_SIZE as u64).collect();
                                let mut sent = 0u64;
                                while sent < MSG_COUNT {
                                    let want = BATCH_SIZE.min((MSG_COUNT - sent) as usize);
                                    let n = tx.put(&batch[..want]);
                                    if n == 0 {
                                        std::hint::spin_loop();
                                    }
                                    sent += n as u64;
                                }
                            });
                        }

                        let mut buf = vec![0u64; BATCH_SIZE];
                        let mut count = 0u64;
                        while count < total {
                            let n = rx.get(&mut buf);
                            black_box(&buf[..n]);
                            count += n as u64;
                        }
                    });
                });
            },
        );
    }

    group.finish();
}

fn bench_mpmc(c: &mut Criterion) {
    let mut group = c.benchmark_group("mpmc");
    let total = MSG_COUNT * 2;
    group.throughput(Throughput::Elements(total));

    group.bench_function("2P_2C", |b| {
        b.iter(|| {
            let ring = MpmcRing::<u64>::new(4096);
            let received = std::sync::atomic::AtomicU64::new(0);

            thread::scope(|s| {
                for _ in 0..2 {
                    let ring = &ring;
                    s.spawn(move || {
                        let batch: Vec<u64> = (0..BATCH_SIZE as u64).collect();
                        let mut sent = 0u64;
                        while sent < MSG_COUNT {
                            let want = BATCH_SIZE.min((MSG_COUNT - sent) as usize);
                            sent += ring.put(&batch[..want]) as u64;
                        }
                    });
                }
                for _ in 0..2 {
                    let (ring, received) = (&ring, &received);
                    s.spawn(move || {
                        use std::sync::atomic::Ordering;
                        let mut buf = vec![0u64; BATCH_SIZE];
                        while received.load(Ordering::Relaxed) < total {
                            let n = ring.get(&mut buf);
                            black_box(&buf[..n]);
                            received.fetch_add(n as u64, Ordering::Relaxed);
                        }
                    });
                }
            });
        });
    });

    group.finish();
}

criterion_group!(benches, bench_spsc, bench_mpsc, bench_mpmc);
criterion_main!(benches);
