use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringfence::{MpmcRing, MpscRing, RingError, SpscRing};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const ALPHABET: &[u8] =
    b"1234567890!@#$%^&*()abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ`;',./~:\"<>?";

/// Random printable chunk of `1..max_len` bytes followed by a newline.
fn random_chunk(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
    let len = rng.gen_range(1..max_len);
    let mut chunk: Vec<u8> = (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect();
    chunk.push(b'\n');
    chunk
}

/// Byte-for-byte comparison of two files, `block_size` bytes at a time.
fn files_identical(a: &Path, b: &Path, block_size: usize) -> io::Result<bool> {
    let len = a.metadata()?.len();
    if len != b.metadata()?.len() {
        return Ok(false);
    }

    let (mut fa, mut fb) = (File::open(a)?, File::open(b)?);
    let (mut ba, mut bb) = (vec![0u8; block_size], vec![0u8; block_size]);
    let mut remaining = len as usize;
    while remaining > 0 {
        let n = remaining.min(block_size);
        fa.read_exact(&mut ba[..n])?;
        fb.read_exact(&mut bb[..n])?;
        if ba[..n] != bb[..n] {
            return Ok(false);
        }
        remaining -= n;
    }
    Ok(true)
}

/// Producer writes `loops` random chunks through `put`, consumer drains
/// through `get` until the producer signals completion. Both streams go to
/// files which must match.
fn run_stress<P, G>(capacity: usize, loops: usize, seed: u64, mut put: P, mut get: G)
where
    P: FnMut(&[u8]) -> usize + Send,
    G: FnMut(&mut [u8]) -> usize + Send,
{
    let dir = tempfile::tempdir().unwrap();
    let sent_path = dir.path().join("sent.txt");
    let received_path = dir.path().join("received.txt");
    let finished = AtomicBool::new(false);

    thread::scope(|s| {
        let finished = &finished;
        let sent_path = &sent_path;
        let received_path = &received_path;

        s.spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sink = BufWriter::new(File::create(sent_path).unwrap());
            for _ in 0..loops {
                let chunk = random_chunk(&mut rng, capacity);
                let mut offset = 0;
                while offset < chunk.len() {
                    offset += put(&chunk[offset..]);
                }
                sink.write_all(&chunk).unwrap();
            }
            sink.flush().unwrap();
            finished.store(true, Ordering::Release);
        });

        s.spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
            let mut sink = BufWriter::new(File::create(received_path).unwrap());
            let mut buf = vec![0u8; capacity];

            while !finished.load(Ordering::Acquire) {
                let want = rng.gen_range(1..capacity);
                let mut offset = 0;
                while offset < want && !finished.load(Ordering::Acquire) {
                    offset += get(&mut buf[offset..want]);
                }
                sink.write_all(&buf[..offset]).unwrap();
            }

            // Producer is done: whatever is left is final
            loop {
                let n = get(&mut buf);
                if n == 0 {
                    break;
                }
                sink.write_all(&buf[..n]).unwrap();
            }
            sink.flush().unwrap();
        });
    });

    assert!(
        files_identical(&sent_path, &received_path, 4096).unwrap(),
        "received stream differs from sent stream"
    );
}

#[test]
fn test_spsc_stress_small_buffer() {
    let mut ring = SpscRing::<u8>::new(10);
    let capacity = ring.capacity();
    let (mut tx, mut rx) = ring.split();
    run_stress(capacity, 10_000, 7, |s| tx.put(s), |d| rx.get(d));
}

#[test]
fn test_mpsc_stress_small_buffer() {
    let mut ring = MpscRing::<u8>::new(16);
    let capacity = ring.capacity();
    let (tx, mut rx) = ring.split();
    run_stress(capacity, 10_000, 11, |s| tx.put(s), |d| rx.get(d));
}

#[test]
fn test_mpmc_stress_small_buffer() {
    let ring = MpmcRing::<u8>::new(10);
    run_stress(ring.capacity(), 10_000, 13, |s| ring.put(s), |d| ring.get(d));
}

#[test]
fn test_single_round_trip_with_peek() {
    let mut ring = SpscRing::<u8>::new(10);
    assert!(!ring.is_null());
    let (mut tx, mut rx) = ring.split();

    assert_eq!(tx.put(&[b'X']), 1);
    let peeked = rx.peek();
    let mut out = [0u8; 1];
    assert_eq!(rx.get(&mut out), 1);
    assert_eq!(peeked, Some(b'X'));
    assert_eq!(out[0], b'X');
}

#[test]
fn test_struct_elements_fifo() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Sample {
        seq: u64,
        value: f32,
        tag: [u8; 3],
    }

    const N: u64 = 50_000;
    let mut ring = SpscRing::<Sample>::new(100);
    let (mut tx, mut rx) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            let samples: Vec<Sample> = (0..N)
                .map(|seq| Sample {
                    seq,
                    value: seq as f32 * 0.5,
                    tag: [seq as u8; 3],
                })
                .collect();
            let mut sent = 0;
            while sent < samples.len() {
                sent += tx.put(&samples[sent..]);
            }
        });

        let mut expected = 0u64;
        let mut buf = [Sample {
            seq: 0,
            value: 0.0,
            tag: [0; 3],
        }; 17];
        while expected < N {
            let n = rx.get(&mut buf);
            for sample in &buf[..n] {
                assert_eq!(sample.seq, expected, "FIFO violation");
                assert_eq!(sample.value, expected as f32 * 0.5);
                assert_eq!(sample.tag, [expected as u8; 3]);
                expected += 1;
            }
        }
    });
}

#[test]
fn test_backoff_transfer_across_threads() {
    const N: usize = 20_000;
    let mut ring = SpscRing::<u32>::new(32);
    let (mut tx, mut rx) = ring.split();

    thread::scope(|s| {
        s.spawn(move || {
            let data: Vec<u32> = (0..N as u32).collect();
            let mut rest = &data[..];
            while let Err(err) = tx.put_with_backoff(rest) {
                match err {
                    RingError::Stalled { transferred, .. } => rest = &rest[transferred..],
                    other => panic!("unexpected error: {other}"),
                }
            }
        });

        let mut out = vec![0u32; N];
        let mut done = 0;
        while done < N {
            match rx.get_with_backoff(&mut out[done..]) {
                Ok(()) => done = N,
                Err(RingError::Stalled { transferred, .. }) => done += transferred,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert!(out.iter().copied().eq(0..N as u32));
    });
}

#[test]
fn test_reset_between_runs() {
    let mut ring = SpscRing::<u16>::new(8);
    {
        let (mut tx, _rx) = ring.split();
        assert_eq!(tx.put(&[1, 2, 3]), 3);
    }

    ring.reset(3);
    assert_eq!(ring.capacity(), 4);
    assert!(ring.is_empty());

    let (mut tx, mut rx) = ring.split();
    assert_eq!(tx.put(&[9, 8, 7, 6, 5]), 4);
    let mut out = [0u16; 4];
    assert_eq!(rx.get(&mut out), 4);
    assert_eq!(out, [9, 8, 7, 6]);
}
