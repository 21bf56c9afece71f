//! Concurrency stress check for the ringfence variants.
//!
//! One producer streams random printable chunks (1..capacity bytes plus a
//! newline) through the ring, one consumer drains it into random-sized
//! reads until the producer signals completion. Both sides write their byte
//! stream to a file; the files must be identical.
//!
//! Run with:
//! `cargo run -p ringfence --features stress --bin ringfence-stress -- [spsc|mpsc|mpmc] [capacity] [loops] [out_dir]`

use rand::Rng;
use ringfence::{init_tracing, MpmcRing, MpscRing, SpscRing};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

const ALPHABET: &[u8] =
    b"1234567890!@#$%^&*()abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ`;',./~:\"<>?";

const DEFAULT_CAPACITY: u32 = 10;
const DEFAULT_LOOPS: usize = 10_000;
const COMPARE_BLOCK: usize = 4096;

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let variant = args.get(1).map_or("spsc", String::as_str);
    let capacity = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_CAPACITY);
    let loops = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_LOOPS);
    let out_dir = args
        .get(4)
        .map_or_else(std::env::temp_dir, PathBuf::from);

    let sent_path = out_dir.join("ringfence-sent.txt");
    let received_path = out_dir.join("ringfence-received.txt");

    println!("ringfence stress");
    println!("   Variant: {variant}");
    println!("   Requested capacity: {capacity}");
    println!("   Loops: {loops}");
    println!("   Sent stream: {}", sent_path.display());
    println!("   Received stream: {}", received_path.display());

    let start = Instant::now();
    let sent = match variant {
        "spsc" => {
            let mut ring = SpscRing::<u8>::new(capacity);
            if !usable(ring.capacity()) {
                return ExitCode::FAILURE;
            }
            let cap = ring.capacity();
            let (mut tx, mut rx) = ring.split();
            run(cap, loops, &sent_path, &received_path, |s| tx.put(s), |d| rx.get(d))
        }
        "mpsc" => {
            let mut ring = MpscRing::<u8>::new(capacity);
            if !usable(ring.capacity()) {
                return ExitCode::FAILURE;
            }
            let cap = ring.capacity();
            let (tx, mut rx) = ring.split();
            run(cap, loops, &sent_path, &received_path, |s| tx.put(s), |d| rx.get(d))
        }
        "mpmc" => {
            let ring = MpmcRing::<u8>::new(capacity);
            if !usable(ring.capacity()) {
                return ExitCode::FAILURE;
            }
            run(
                ring.capacity(),
                loops,
                &sent_path,
                &received_path,
                |s| ring.put(s),
                |d| ring.get(d),
            )
        }
        other => {
            eprintln!("unknown variant {other:?}, expected spsc, mpsc or mpmc");
            return ExitCode::FAILURE;
        }
    };

    let verdict = sent.and_then(|bytes| {
        files_identical(&sent_path, &received_path).map(|same| (bytes, same))
    });
    match verdict {
        Ok((bytes, true)) => {
            println!("\n{variant} stress ok: {bytes} bytes in {:?}", start.elapsed());
            ExitCode::SUCCESS
        }
        Ok((bytes, false)) => {
            eprintln!("\n{variant} stress FAILED: streams differ after {bytes} bytes");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("\n{variant} stress I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Chunk lengths are drawn from `1..capacity`, so at least two slots are needed.
fn usable(capacity: usize) -> bool {
    if capacity < 2 {
        eprintln!("ring capacity {capacity} is too small, need at least 2");
        return false;
    }
    true
}

/// Runs the producer/consumer pair; returns the number of bytes sent.
fn run<P, G>(
    capacity: usize,
    loops: usize,
    sent_path: &Path,
    received_path: &Path,
    mut put: P,
    mut get: G,
) -> io::Result<u64>
where
    P: FnMut(&[u8]) -> usize + Send,
    G: FnMut(&mut [u8]) -> usize + Send,
{
    let finished = AtomicBool::new(false);
    let aborted = AtomicBool::new(false);
    let mut sink_sent = BufWriter::new(File::create(sent_path)?);
    let mut sink_received = BufWriter::new(File::create(received_path)?);

    thread::scope(|s| {
        let (finished, aborted) = (&finished, &aborted);

        let producer = s.spawn(move || {
            let mut produce = || -> io::Result<u64> {
                let mut rng = rand::thread_rng();
                let mut total = 0u64;
                for _ in 0..loops {
                    let len = rng.gen_range(1..capacity);
                    let mut chunk: Vec<u8> = (0..len)
                        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
                        .collect();
                    chunk.push(b'\n');

                    let mut offset = 0;
                    while offset < chunk.len() {
                        if aborted.load(Ordering::Relaxed) {
                            return Err(io::Error::other("consumer aborted"));
                        }
                        offset += put(&chunk[offset..]);
                    }
                    sink_sent.write_all(&chunk)?;
                    total += chunk.len() as u64;
                }
                sink_sent.flush()?;
                Ok(total)
            };
            let result = produce();
            // Set on every path so the consumer always terminates
            finished.store(true, Ordering::Release);
            result
        });

        let consumer = s.spawn(move || {
            let mut consume = || -> io::Result<()> {
                let mut rng = rand::thread_rng();
                let mut buf = vec![0u8; capacity];
                while !finished.load(Ordering::Acquire) {
                    let want = rng.gen_range(1..capacity);
                    let mut offset = 0;
                    while offset < want && !finished.load(Ordering::Acquire) {
                        offset += get(&mut buf[offset..want]);
                    }
                    sink_received.write_all(&buf[..offset])?;
                }
                // Producer is done: whatever is left is final
                loop {
                    let n = get(&mut buf);
                    if n == 0 {
                        break;
                    }
                    sink_received.write_all(&buf[..n])?;
                }
                sink_received.flush()
            };
            let result = consume();
            if result.is_err() {
                aborted.store(true, Ordering::Relaxed);
            }
            result
        });

        let produced = producer.join().expect("producer thread panicked");
        let consumed = consumer.join().expect("consumer thread panicked");
        consumed?;
        produced
    })
}

/// Byte-for-byte comparison of two files, one block at a time.
fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let len = a.metadata()?.len();
    if len != b.metadata()?.len() {
        return Ok(false);
    }

    let (mut fa, mut fb) = (File::open(a)?, File::open(b)?);
    let (mut ba, mut bb) = (vec![0u8; COMPARE_BLOCK], vec![0u8; COMPARE_BLOCK]);
    let mut remaining = len as usize;
    while remaining > 0 {
        let n = remaining.min(COMPARE_BLOCK);
        fa.read_exact(&mut ba[..n])?;
        fb.read_exact(&mut bb[..n])?;
        if ba[..n] != bb[..n] {
            return Ok(false);
        }
        remaining -= n;
    }
    Ok(true)
}
