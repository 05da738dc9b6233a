//! Device Grid-Stream Engine.
//!
//! A launch is `grid_dim` blocks of `block_dim` threads. Thread `i` (its
//! [`ThreadIdx::linear`] index) owns lane `i` of every array: it fetches its
//! source lanes, computes, and stores one target lane. Nothing else touches
//! memory, and nothing checks bounds inside a kernel.
//!
//! The safe entry points of the executors check what the kernels cannot:
//! equal lengths, whole lanes, 16-byte alignment and a shape that covers the
//! lane count exactly.
//!
//! ```rust
//! use memstream::device::{HostGrid, LaunchShape};
//! use memstream::AlignedVec;
//!
//! let grid = HostGrid::with_threads(2).unwrap();
//! let src = AlignedVec::filled(1024, 2.0f64);
//! let mut tgt = AlignedVec::<f64>::zeroed(1024);
//!
//! // 512 lanes of two f64
//! let shape = LaunchShape::for_lanes(512, 128).unwrap();
//! grid.scale(shape, &mut tgt, &src, 3.0).unwrap();
//! assert!(tgt.iter().all(|&x| x == 6.0));
//! ```

mod grid;
pub mod kernels;
mod launch;

#[cfg(feature = "cuda")]
mod cuda;

#[cfg(feature = "cuda")]
pub use cuda::CudaGrid;
pub use grid::HostGrid;
pub use kernels::{kernel_symbol, STREAM_KERNEL_SRC};
pub use launch::{LaunchShape, ThreadIdx};
