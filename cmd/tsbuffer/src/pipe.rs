//! Producer/consumer wiring between an input stream, the buffer and an output stream.

use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use giztoy_tsbuffer::{Config, ErrorKind, ThreadSafeBuffer};
use tracing::{debug, trace, warn};

/// How long the producer waits before retrying a write that hit the size limit.
const FULL_BACKOFF: Duration = Duration::from_millis(1);

/// Counters reported after a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub bytes: usize,
    pub writes: usize,
    pub reads: usize,
}

/// Copies `input` to `output` through a [`ThreadSafeBuffer`].
///
/// `input` is consumed on a producer thread which closes the buffer at EOF.
/// The calling thread reads `chunk_size` bytes at a time; the last, shorter
/// chunk is drained after close.
pub fn run<R, W>(cfg: Config, chunk_size: usize, input: R, mut output: W) -> Result<Stats>
where
    R: Read + Send + 'static,
    W: Write,
{
    if chunk_size == 0 {
        bail!("chunk size must be greater than 0");
    }
    if cfg.max_buffer && chunk_size > cfg.max_buffer_size {
        bail!(
            "chunk size {} exceeds max buffer size {}",
            chunk_size,
            cfg.max_buffer_size
        );
    }

    let buf = ThreadSafeBuffer::new(cfg);
    let writer = buf.clone();
    let producer = thread::spawn(move || {
        let result = produce(&writer, input, chunk_size);
        writer.close();
        result
    });

    let mut stats = match consume(&buf, &mut output, chunk_size) {
        Ok(stats) => stats,
        Err(e) => {
            // Fails the producer's next write. The producer is left running
            // unjoined: it may be blocked reading input that never ends.
            buf.close();
            return Err(e);
        }
    };

    stats.writes = match producer.join() {
        Ok(result) => result?,
        Err(_) => bail!("producer thread panicked"),
    };
    Ok(stats)
}

fn produce<R: Read>(buf: &ThreadSafeBuffer, mut input: R, chunk_size: usize) -> Result<usize> {
    let mut chunk = vec![0u8; chunk_size];
    let mut writes = 0;

    loop {
        let n = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e).context("failed to read input"),
        };
        write_all(buf, &chunk[..n])?;
        writes += 1;
    }

    debug!("input finished after {} writes", writes);
    Ok(writes)
}

/// Writes `data`, waiting for the reader to make room when the buffer is full.
fn write_all(buf: &ThreadSafeBuffer, data: &[u8]) -> Result<()> {
    loop {
        match buf.write(data) {
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::ExceedsMaxBufferSize => {
                trace!("buffer full, retrying write of {} bytes", data.len());
                thread::sleep(FULL_BACKOFF);
            }
            Err(e) => return Err(e).context("failed to write to buffer"),
        }
    }
}

fn consume<W: Write>(buf: &ThreadSafeBuffer, output: &mut W, chunk_size: usize) -> Result<Stats> {
    let mut chunk = vec![0u8; chunk_size];
    let mut want = chunk_size;
    let mut stats = Stats::default();

    loop {
        match buf.read(&mut chunk[..want]) {
            Ok(n) => {
                output
                    .write_all(&chunk[..n])
                    .context("failed to write output")?;
                stats.bytes += n;
                stats.reads += 1;
            }
            Err(e) if e.kind() == ErrorKind::ClosedInsufficientData => {
                want = buf.len().min(chunk_size);
                debug!("draining final {} bytes", want);
            }
            Err(e) if e.kind() == ErrorKind::Closed => {
                if !buf.is_empty() {
                    warn!("buffer closed with {} bytes left undrained", buf.len());
                }
                break;
            }
            Err(e) => return Err(e).context("failed to read from buffer"),
        }
    }

    output.flush().context("failed to flush output")?;
    Ok(stats)
}
