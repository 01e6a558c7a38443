//! Thread-safe byte buffer for passing data from writers to a reader.
//!
//! [`ThreadSafeBuffer`] works like an in-memory pipe with a few knobs, all set
//! through [`Config`]:
//!
//! - an optional maximum size, enforced atomically on every write
//! - a read timeout bounding how long a single read may block
//! - drain behaviour after close: whether readers may keep consuming what is
//!   left, and for how long
//!
//! Reads are exact: a successful `read(&mut buf)` always fills all of `buf`.
//! A reader that asks for more than is buffered waits for more writes rather
//! than returning a short count.
//!
//! # Example
//!
//! ```
//! use giztoy_tsbuffer::{Config, ErrorKind, ThreadSafeBuffer};
//!
//! let buf = ThreadSafeBuffer::new(Config::unlimited());
//! buf.write(b"hello").unwrap();
//! buf.close();
//!
//! // Closed buffers can still be drained.
//! let mut data = [0u8; 5];
//! buf.read(&mut data).unwrap();
//! assert_eq!(&data, b"hello");
//!
//! // Once empty, reads fail.
//! let err = buf.read(&mut data).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Closed);
//! ```
//!
//! # Configuration Files
//!
//! [`Config`] deserializes from YAML or JSON, with durations written as
//! strings like `"250ms"` or `"1m30s"`:
//!
//! ```yaml
//! max_buffer: true
//! max_buffer_size: 1048576
//! drain_read: true
//! read_timeout: 5s
//! drain_time: 30s
//! ```
//!
//! # Thread Safety
//!
//! [`ThreadSafeBuffer`] is `Send + Sync` and `Clone`; clones share the same
//! underlying buffer.

mod buffer;
mod config;
mod duration;
mod error;
mod signal;

pub use buffer::ThreadSafeBuffer;
pub use config::{Config, ConfigError};
pub use duration::{format_duration, parse_duration, ParseDurationError};
pub use error::{BufferError, ErrorKind, Op, Result};
