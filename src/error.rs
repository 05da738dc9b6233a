//! Error types for memstream operations.
//!
//! The kernels themselves never fail: a misaligned or out-of-range access is a
//! fault of the execution environment. These errors come from the safe entry
//! points that check their inputs once, before any kernel runs.

use std::fmt;

/// Errors that can occur while preparing a stream operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// An array base address is not aligned to the lane boundary.
    AlignmentError {
        /// The offending address.
        address: usize,
        /// The alignment that was required.
        required: usize,
    },
    /// Arrays participating in one operation have different lengths.
    LengthMismatch {
        /// Length of the first array.
        expected: usize,
        /// Length of the array that differs.
        actual: usize,
    },
    /// The launch shape does not cover the lane count exactly.
    LaunchError {
        /// Threads in the launch (`block_dim * grid_dim`).
        threads: u64,
        /// Lanes in the target array.
        lanes: u64,
        /// Human-readable error message.
        message: String,
    },
    /// Host engine configuration was rejected.
    ConfigError {
        /// Human-readable error message.
        message: String,
    },
    /// The worker pool could not be created.
    ThreadPoolError {
        /// Human-readable error message.
        message: String,
    },
    /// The GPU driver, compiler or runtime reported a failure.
    DeviceError {
        /// Human-readable error message.
        message: String,
    },
    /// Input validation error.
    ValidationError {
        /// Human-readable error message.
        message: String,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::AlignmentError { address, required } => write!(
                f,
                "Misaligned array: address {:#x} is not {} byte aligned",
                address, required
            ),
            StreamError::LengthMismatch { expected, actual } => write!(
                f,
                "Array length mismatch: expected {} elements, got {}",
                expected, actual
            ),
            StreamError::LaunchError {
                threads,
                lanes,
                message,
            } => write!(
                f,
                "Invalid launch shape: {} (threads: {}, lanes: {})",
                message, threads, lanes
            ),
            StreamError::ConfigError { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            StreamError::ThreadPoolError { message } => {
                write!(f, "Worker pool error: {}", message)
            }
            StreamError::DeviceError { message } => write!(f, "Device error: {}", message),
            StreamError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
        }
    }
}

impl std::error::Error for StreamError {}

/// Result type alias for memstream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Creates an alignment error for `ptr`.
pub fn alignment_error<T>(ptr: *const T, required: usize) -> StreamError {
    StreamError::AlignmentError {
        address: ptr as usize,
        required,
    }
}

/// Creates a length mismatch error.
pub fn length_mismatch(expected: usize, actual: usize) -> StreamError {
    StreamError::LengthMismatch { expected, actual }
}

/// Creates a launch shape error.
pub fn launch_error(threads: u64, lanes: u64, message: impl Into<String>) -> StreamError {
    StreamError::LaunchError {
        threads,
        lanes,
        message: message.into(),
    }
}

/// Creates a configuration error.
pub fn config_error(message: impl Into<String>) -> StreamError {
    StreamError::ConfigError {
        message: message.into(),
    }
}

/// Creates a device error.
pub fn device_error(message: impl Into<String>) -> StreamError {
    StreamError::DeviceError {
        message: message.into(),
    }
}

/// Creates a validation error.
pub fn validation_error(message: impl Into<String>) -> StreamError {
    StreamError::ValidationError {
        message: message.into(),
    }
}
