use core::fmt;

use crate::{delta::DeltaError, device::Plane, quantize::FrameError};

/// Artifact path, `<dir>/frameNNN.xx`.
pub type Path = heapless::String<256>;

/// Failure while encoding, storing or loading a frame sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimError {
    /// The filesystem refused an artifact.
    Io {
        path: Path,
        kind: embedded_io::ErrorKind,
    },
    /// An artifact ended before the bytes it must hold.
    UnexpectedEof { path: Path },
    /// A keyframe whose size is not exactly two planes.
    Geometry {
        path: Path,
        expected: usize,
        actual: usize,
    },
    /// A delay table line that is not a decimal millisecond count.
    InvalidDelay { line: usize },
    /// A sequence without any frame.
    Empty,
    /// Delay table and delta count disagree.
    FrameCount { delays: usize, deltas: usize },
    /// A stored delta stream does not fit the plane geometry.
    Delta {
        frame: usize,
        plane: Plane,
        error: DeltaError,
    },
    /// A source raster of the wrong size.
    Frame(FrameError),
    /// An artifact path does not fit in [`Path`].
    PathTooLong,
}

impl AnimError {
    pub(crate) fn from_io_error(path: &Path, error: impl embedded_io::Error) -> Self {
        AnimError::Io {
            path: path.clone(),
            kind: error.kind(),
        }
    }

    pub(crate) fn from_read_exact_error<E: embedded_io::Error>(
        path: &Path,
        error: embedded_io::ReadExactError<E>,
    ) -> Self {
        match error {
            embedded_io::ReadExactError::UnexpectedEof => AnimError::UnexpectedEof {
                path: path.clone(),
            },
            embedded_io::ReadExactError::Other(e) => AnimError::from_io_error(path, e),
        }
    }
}

impl From<FrameError> for AnimError {
    fn from(error: FrameError) -> Self {
        AnimError::Frame(error)
    }
}

impl embedded_io::Error for AnimError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            AnimError::Io { kind, .. } => *kind,
            AnimError::UnexpectedEof { .. }
            | AnimError::Geometry { .. }
            | AnimError::InvalidDelay { .. }
            | AnimError::FrameCount { .. }
            | AnimError::Delta { .. } => embedded_io::ErrorKind::InvalidData,
            AnimError::Empty | AnimError::Frame(_) | AnimError::PathTooLong => {
                embedded_io::ErrorKind::InvalidInput
            }
        }
    }
}

impl fmt::Display for AnimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimError::Io { path, kind } => write!(f, "{path}: {kind:?}"),
            AnimError::UnexpectedEof { path } => write!(f, "{path}: unexpected end of file"),
            AnimError::Geometry {
                path,
                expected,
                actual,
            } => write!(f, "{path}: {actual} bytes, expected {expected}"),
            AnimError::InvalidDelay { line } => write!(f, "delay table line {line} is not a number"),
            AnimError::Empty => write!(f, "sequence has no frames"),
            AnimError::FrameCount { delays, deltas } => {
                write!(f, "{delays} delays for {deltas} delta frames")
            }
            AnimError::Delta {
                frame,
                plane,
                error,
            } => write!(f, "frame {frame} {}: {error}", plane.repr()),
            AnimError::Frame(error) => write!(f, "{error}"),
            AnimError::PathTooLong => write!(f, "artifact path too long"),
        }
    }
}

impl core::error::Error for AnimError {}

pub type Result<T> = core::result::Result<T, AnimError>;
