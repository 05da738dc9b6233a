use crate::error::{launch_error, Result};

/// Grid shape of a kernel launch: `grid_dim` blocks of `block_dim` threads.
///
/// Only the x dimension is used; one thread handles one lane.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LaunchShape {
    pub block_dim: u32,
    pub grid_dim: u32,
}

impl LaunchShape {
    pub const fn new(block_dim: u32, grid_dim: u32) -> Self {
        LaunchShape {
            block_dim,
            grid_dim,
        }
    }

    /// Total threads in the launch.
    pub const fn threads(&self) -> u64 {
        self.block_dim as u64 * self.grid_dim as u64
    }

    /// `true` if thread indices range exactly over `[0, lanes)`.
    pub const fn covers(&self, lanes: usize) -> bool {
        self.threads() == lanes as u64
    }

    /// The shape with `block_dim` threads per block that covers `lanes` exactly.
    ///
    /// The kernels never derive their own shape; this is for harnesses.
    /// `lanes` must be a multiple of `block_dim`.
    pub fn for_lanes(lanes: usize, block_dim: u32) -> Result<Self> {
        if block_dim == 0 {
            return Err(launch_error(0, lanes as u64, "block_dim must be at least 1"));
        }
        if lanes % block_dim as usize != 0 {
            return Err(launch_error(
                lanes.div_ceil(block_dim as usize) as u64 * block_dim as u64,
                lanes as u64,
                format!("lane count is not a multiple of block_dim {block_dim}"),
            ));
        }
        let grid_dim = u32::try_from(lanes / block_dim as usize).map_err(|_| {
            launch_error(
                lanes as u64,
                lanes as u64,
                format!("more than {} blocks of {block_dim} threads", u32::MAX),
            )
        })?;
        Ok(LaunchShape::new(block_dim, grid_dim))
    }
}

#[cfg(feature = "cuda")]
impl From<LaunchShape> for cudarc::driver::LaunchConfig {
    fn from(shape: LaunchShape) -> Self {
        cudarc::driver::LaunchConfig {
            grid_dim: (shape.grid_dim, 1, 1),
            block_dim: (shape.block_dim, 1, 1),
            shared_mem_bytes: 0,
        }
    }
}

/// Coordinates of one thread in the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ThreadIdx {
    pub block_idx: u32,
    pub block_dim: u32,
    pub thread_idx: u32,
}

impl ThreadIdx {
    /// `block_idx * block_dim + thread_idx`, computed without 32-bit overflow.
    #[inline(always)]
    pub const fn linear(&self) -> u64 {
        self.block_idx as u64 * self.block_dim as u64 + self.thread_idx as u64
    }
}
