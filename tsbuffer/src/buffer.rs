//! Thread-safe byte buffer implementation.

use std::sync::Arc;
use std::time::Instant;

use bytes::{Buf, BytesMut};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{BufferError, ErrorKind, Result};
use crate::signal::{Notify, Wake};

/// A thread-safe byte buffer between any number of writers and a reader.
///
/// Writes append to the buffer and never block on readers. Reads block until
/// exactly the requested number of bytes is available: a successful read
/// always fills the whole destination slice, never a prefix of it.
///
/// # Semantics
///
/// - **Write**: Appends atomically, fails when closed or over the size limit
/// - **Read**: Blocks for exactly `buf.len()` bytes, the buffer closing, or
///   the read timeout; concurrent reads run one at a time
/// - **Close**: Idempotent; with `drain_read` enabled, readers may keep
///   consuming what is left (within `drain_time`, if set)
///
/// # Locking
///
/// The read lock is taken for the whole of a `read` call. The state lock is
/// only held for short critical sections and is never held while waiting on
/// the readiness signal. When both are needed the read lock is taken first.
///
/// # Example
///
/// ```
/// use giztoy_tsbuffer::{Config, ThreadSafeBuffer};
/// use std::thread;
///
/// let buf = ThreadSafeBuffer::new(Config::unlimited());
/// let writer = buf.clone();
///
/// let producer = thread::spawn(move || {
///     writer.write(b"hello ").unwrap();
///     writer.write(b"world").unwrap();
///     writer.close();
/// });
///
/// let mut data = [0u8; 11];
/// assert_eq!(buf.read(&mut data).unwrap(), 11);
/// assert_eq!(&data, b"hello world");
///
/// producer.join().unwrap();
/// ```
pub struct ThreadSafeBuffer {
    inner: Arc<BufferInner>,
}

struct BufferInner {
    config: Config,
    read_lock: Mutex<()>,
    notify: Notify,
    state: Mutex<BufferState>,
}

struct BufferState {
    buf: BytesMut,
    closed: bool,
    closed_at: Option<Instant>,
}

impl Clone for ThreadSafeBuffer {
    fn clone(&self) -> Self {
        ThreadSafeBuffer {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for ThreadSafeBuffer {
    fn default() -> Self {
        Self::new(Config::unlimited())
    }
}

impl ThreadSafeBuffer {
    /// Creates a new, open and empty buffer.
    pub fn new(config: Config) -> Self {
        ThreadSafeBuffer {
            inner: Arc::new(BufferInner {
                config,
                read_lock: Mutex::new(()),
                notify: Notify::new(),
                state: Mutex::new(BufferState {
                    buf: BytesMut::new(),
                    closed: false,
                    closed_at: None,
                }),
            }),
        }
    }

    /// Returns the configuration this buffer was created with.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Returns the number of unread bytes.
    pub fn len(&self) -> usize {
        self.inner.state.lock().buf.len()
    }

    /// Returns true if there are no unread bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Appends `data` to the buffer.
    ///
    /// Either all of `data` is written or nothing is. Returns `data.len()` on
    /// success.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Closed`] if the buffer has been closed
    /// - [`ErrorKind::ExceedsMaxBufferSize`] if the write would grow the buffer
    ///   past the configured maximum size
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        let mut state = self.inner.state.lock();
        if state.closed {
            debug!("rejected write of {} bytes: buffer closed", data.len());
            return Err(BufferError::write(ErrorKind::Closed));
        }

        if let Some(max) = self.inner.config.capacity() {
            if state.buf.len().saturating_add(data.len()) > max {
                debug!(
                    "rejected write of {} bytes: {} buffered, max {}",
                    data.len(),
                    state.buf.len(),
                    max
                );
                return Err(BufferError::write(ErrorKind::ExceedsMaxBufferSize));
            }
        }

        state.buf.extend_from_slice(data);
        trace!("wrote {} bytes, {} buffered", data.len(), state.buf.len());
        self.inner.notify.signal();
        Ok(data.len())
    }

    /// Reads exactly `buf.len()` bytes from the front of the buffer.
    ///
    /// Blocks while the buffer is open and holds fewer than `buf.len()`
    /// bytes. Only one read runs at a time; other callers queue behind it.
    /// The read timeout, if configured, covers the whole call including the
    /// time spent queued.
    ///
    /// An empty `buf` returns `Ok(0)` immediately while the buffer is open.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Timeout`] if the read timeout elapses first
    /// - [`ErrorKind::ClosedInsufficientData`] if the buffer is closed and
    ///   drainable but holds fewer than `buf.len()` bytes
    /// - [`ErrorKind::Closed`] if the buffer is closed and cannot be drained
    ///   (draining disabled, drain window expired, or nothing left)
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let deadline = self
            .inner
            .config
            .timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));

        let _reader = match deadline {
            Some(deadline) => match self.inner.read_lock.try_lock_until(deadline) {
                Some(guard) => guard,
                None => {
                    debug!("read of {} bytes timed out waiting for another reader", buf.len());
                    return Err(BufferError::read(ErrorKind::Timeout));
                }
            },
            None => self.inner.read_lock.lock(),
        };

        loop {
            if let Some(n) = self.try_read(buf)? {
                return Ok(n);
            }

            match self.inner.notify.wait(deadline) {
                Wake::Ready | Wake::Stopped => continue,
                Wake::TimedOut => {
                    debug!("read of {} bytes timed out", buf.len());
                    return Err(BufferError::read(ErrorKind::Timeout));
                }
            }
        }
    }

    /// Checks the buffer once. Returns `Ok(None)` if the reader should keep
    /// waiting.
    fn try_read(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        let mut state = self.inner.state.lock();

        if state.closed {
            if !self.can_drain(&state) {
                return Err(BufferError::read(ErrorKind::Closed));
            }
            if state.buf.len() < buf.len() {
                return Err(BufferError::read(ErrorKind::ClosedInsufficientData));
            }
        } else if state.buf.len() < buf.len() {
            return Ok(None);
        }

        state.buf.copy_to_slice(buf);
        trace!("read {} bytes, {} buffered", buf.len(), state.buf.len());

        // Let the next queued reader look at what is left.
        if !state.buf.is_empty() {
            self.inner.notify.signal();
        }
        Ok(Some(buf.len()))
    }

    fn can_drain(&self, state: &BufferState) -> bool {
        let config = &self.inner.config;
        if !config.drain_read || state.buf.is_empty() {
            return false;
        }

        match (config.drain_window(), state.closed_at) {
            (Some(window), Some(closed_at)) => {
                let in_window = closed_at.elapsed() <= window;
                if !in_window {
                    debug!(
                        "drain window of {:?} expired with {} bytes left",
                        window,
                        state.buf.len()
                    );
                }
                in_window
            }
            _ => true,
        }
    }

    /// Closes the buffer.
    ///
    /// Every later write fails. Blocked and future reads are woken up and
    /// follow the drain rules. Calling `close` again has no effect.
    pub fn close(&self) {
        let mut state = self.inner.state.lock();
        if state.closed {
            return;
        }

        if self.inner.config.drain_window().is_some() {
            state.closed_at = Some(Instant::now());
        }
        state.closed = true;

        // Readers woken by the stop must already see `closed`.
        self.inner.notify.stop();
        debug!("buffer closed with {} bytes unread", state.buf.len());
    }
}
