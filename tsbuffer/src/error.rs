//! Error types for buffer operations.

use std::fmt;

/// Result type alias for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;

/// The buffer operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Write,
    Read,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Write => f.write_str("write"),
            Op::Read => f.write_str("read"),
        }
    }
}

/// Underlying cause of a [`BufferError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ErrorKind {
    /// The buffer has been closed, or closed and can no longer be drained.
    #[error("thread safe buffer is closed")]
    Closed,

    /// The write would push the buffer past its configured maximum size.
    #[error("write exceeds max buffer size")]
    ExceedsMaxBufferSize,

    /// The read deadline elapsed before enough data arrived.
    #[error("failed to read in time")]
    Timeout,

    /// The buffer is closed and holds fewer bytes than were requested.
    #[error("thread safe buffer is closed, attempting to read more data than is in the buffer")]
    ClosedInsufficientData,
}

/// Error returned by [`ThreadSafeBuffer`](crate::ThreadSafeBuffer) operations.
///
/// Carries the failing operation and its cause. Every error is terminal for
/// the call that produced it; nothing is retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed buffer {op}: {kind}")]
pub struct BufferError {
    op: Op,
    #[source]
    kind: ErrorKind,
}

impl BufferError {
    pub(crate) fn write(kind: ErrorKind) -> Self {
        Self { op: Op::Write, kind }
    }

    pub(crate) fn read(kind: ErrorKind) -> Self {
        Self { op: Op::Read, kind }
    }

    /// Returns the operation that failed.
    pub fn op(&self) -> Op {
        self.op
    }

    /// Returns the underlying cause.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if the buffer was closed (including the insufficient-data case).
    pub fn is_closed(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Closed | ErrorKind::ClosedInsufficientData
        )
    }

    /// Returns true if a read deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_buffer_error_display() {
        let err = BufferError::write(ErrorKind::Closed);
        assert_eq!(err.to_string(), "failed buffer write: thread safe buffer is closed");

        let err = BufferError::write(ErrorKind::ExceedsMaxBufferSize);
        assert_eq!(err.to_string(), "failed buffer write: write exceeds max buffer size");

        let err = BufferError::read(ErrorKind::Timeout);
        assert_eq!(err.to_string(), "failed buffer read: failed to read in time");

        let err = BufferError::read(ErrorKind::ClosedInsufficientData);
        assert_eq!(
            err.to_string(),
            "failed buffer read: thread safe buffer is closed, attempting to read more data than is in the buffer"
        );
    }

    #[test]
    fn test_buffer_error_accessors() {
        let err = BufferError::read(ErrorKind::ClosedInsufficientData);
        assert_eq!(err.op(), Op::Read);
        assert_eq!(err.kind(), ErrorKind::ClosedInsufficientData);
        assert!(err.is_closed());
        assert!(!err.is_timeout());

        let err = BufferError::read(ErrorKind::Timeout);
        assert!(err.is_timeout());
        assert!(!err.is_closed());
    }

    #[test]
    fn test_buffer_error_source() {
        let err = BufferError::write(ErrorKind::ExceedsMaxBufferSize);
        let source = err.source().expect("source should be the error kind");
        assert_eq!(source.to_string(), "write exceeds max buffer size");
    }
}
