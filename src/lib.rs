//! # memstream
//!
//! Kernels for measuring sustainable memory bandwidth with the four canonical
//! STREAM access patterns:
//!
//! | Operation | Host arrays        | Grid lanes                   |
//! |-----------|--------------------|------------------------------|
//! | Copy      | `c = a`            | `tgt = src`                  |
//! | Scale     | `b = s * c`        | `tgt = s * src`              |
//! | Add       | `c = a + b`        | `tgt = src_a + src_b`        |
//! | Triad     | `a = b + s * c`    | `tgt = src_b + s * src_a`    |
//!
//! Two engines implement them:
//!
//! - [`host`]: element loops over caller-owned slices, vectorized by the
//!   compiler and fanned out over a fixed-size worker pool ([`HostEngine`]).
//! - [`device`]: one-thread-per-lane grid kernels. Every array access goes
//!   through the lane fetch/store primitive ([`simd::Lane`]), which bypasses
//!   the cache hierarchy on each backend. Grids run on the CPU with
//!   [`device::HostGrid`] or on an NVIDIA GPU with `device::CudaGrid`
//!   (feature `cuda`).
//!
//! Element types are `f32` and `f64` only. The lane type is picked from the
//! element type at compile time:
//!
//! ```rust
//! use memstream::simd::{Lane, StreamElement};
//!
//! assert_eq!(<f64 as StreamElement>::LANE_WIDTH, 2);
//! assert_eq!(<f32 as StreamElement>::LANE_WIDTH, 4);
//! assert_eq!(std::mem::size_of::<<f64 as StreamElement>::Lane>(), 16);
//! ```
//!
//! Allocation, timing and reporting belong to the caller. The engines only
//! mutate the target array of each operation.

pub mod device;
pub mod error;
pub mod host;
pub mod op;
pub mod simd;
pub mod utils;

pub use error::{Result, StreamError};
pub use host::{HostEngine, HostEngineBuilder, StreamArrays};
pub use op::{ArrayId, StreamOp};
pub use simd::{Lane, StreamElement};
pub use utils::AlignedVec;

/// Size in bytes of one lane, the unit of transfer of the grid kernels.
pub const LANE_BYTES: usize = 16;

/// Required base alignment of every array handed to the lane kernels.
pub const LANE_ALIGNMENT: usize = 16;

// ================================================================================================
// PERFORMANCE TUNING CONSTANTS
// ================================================================================================

/// Below this many elements the host engine runs on the calling thread.
///
/// Fan-out and join cost more than the loop itself for arrays that fit in L1/L2.
pub const PARALLEL_THRESHOLD: usize = 1 << 16;

/// Smallest contiguous index range handed to one worker (elements).
pub const MIN_CHUNK: usize = 1 << 14;
