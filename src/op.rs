//! The four STREAM operation kinds and the arrays each one touches.

use std::fmt;
use std::str::FromStr;

use crate::error::{validation_error, StreamError};

/// One of the three arrays of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayId {
    A,
    B,
    C,
}

/// A STREAM access pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StreamOp {
    /// `c = a`
    Copy,
    /// `b = s * c`
    Scale,
    /// `c = a + b`
    Add,
    /// `a = b + s * c`
    Triad,
}

impl StreamOp {
    /// All operations in the order a harness runs them.
    pub const ALL: [StreamOp; 4] = [StreamOp::Copy, StreamOp::Scale, StreamOp::Add, StreamOp::Triad];

    pub fn name(self) -> &'static str {
        match self {
            StreamOp::Copy => "Copy",
            StreamOp::Scale => "Scale",
            StreamOp::Add => "Add",
            StreamOp::Triad => "Triad",
        }
    }

    /// Arrays read by the host form of the operation.
    pub fn reads(self) -> &'static [ArrayId] {
        match self {
            StreamOp::Copy => &[ArrayId::A],
            StreamOp::Scale => &[ArrayId::C],
            StreamOp::Add => &[ArrayId::A, ArrayId::B],
            StreamOp::Triad => &[ArrayId::B, ArrayId::C],
        }
    }

    /// Array written by the host form of the operation.
    pub fn writes(self) -> ArrayId {
        match self {
            StreamOp::Copy | StreamOp::Add => ArrayId::C,
            StreamOp::Scale => ArrayId::B,
            StreamOp::Triad => ArrayId::A,
        }
    }

    pub fn uses_scalar(self) -> bool {
        matches!(self, StreamOp::Scale | StreamOp::Triad)
    }

    /// Number of arrays streamed through memory (sources plus target).
    pub fn arrays_touched(self) -> usize {
        self.reads().len() + 1
    }

    /// Bytes moved by one invocation over `len` elements of `elem_size` bytes.
    ///
    /// This is the STREAM accounting: every read and the write count once.
    pub fn bytes_moved(self, len: usize, elem_size: usize) -> u64 {
        (self.arrays_touched() * len * elem_size) as u64
    }
}

impl fmt::Display for StreamOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamOp {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamOp::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| validation_error(format!("unknown stream operation `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_sets() {
        assert_eq!(StreamOp::Copy.reads(), &[ArrayId::A]);
        assert_eq!(StreamOp::Copy.writes(), ArrayId::C);
        assert_eq!(StreamOp::Scale.reads(), &[ArrayId::C]);
        assert_eq!(StreamOp::Scale.writes(), ArrayId::B);
        assert_eq!(StreamOp::Add.reads(), &[ArrayId::A, ArrayId::B]);
        assert_eq!(StreamOp::Add.writes(), ArrayId::C);
        assert_eq!(StreamOp::Triad.reads(), &[ArrayId::B, ArrayId::C]);
        assert_eq!(StreamOp::Triad.writes(), ArrayId::A);
    }

    #[test]
    fn test_target_is_never_a_source() {
        for op in StreamOp::ALL {
            assert!(!op.reads().contains(&op.writes()), "{op} reads its own target");
        }
    }

    #[test]
    fn test_bytes_moved() {
        assert_eq!(StreamOp::Copy.bytes_moved(1000, 8), 16_000);
        assert_eq!(StreamOp::Scale.bytes_moved(1000, 4), 8_000);
        assert_eq!(StreamOp::Add.bytes_moved(1000, 8), 24_000);
        assert_eq!(StreamOp::Triad.bytes_moved(0, 8), 0);
    }

    #[test]
    fn test_scalar_usage() {
        let with_scalar: Vec<_> = StreamOp::ALL.into_iter().filter(|op| op.uses_scalar()).collect();
        assert_eq!(with_scalar, vec![StreamOp::Scale, StreamOp::Triad]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("triad".parse::<StreamOp>().unwrap(), StreamOp::Triad);
        assert_eq!(" COPY ".parse::<StreamOp>().unwrap(), StreamOp::Copy);
        assert!(matches!(
            "dot".parse::<StreamOp>(),
            Err(StreamError::ValidationError { .. })
        ));
        for op in StreamOp::ALL {
            assert_eq!(op.to_string().parse::<StreamOp>().unwrap(), op);
        }
    }
}
