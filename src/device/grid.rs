use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::kernels::{add_kernel, copy_kernel, kernel_symbol, scale_kernel, triad_kernel};
use super::launch::{LaunchShape, ThreadIdx};
use crate::error::{config_error, launch_error, length_mismatch, Result, StreamError};
use crate::host::StreamArrays;
use crate::op::StreamOp;
use crate::simd::{as_lanes, as_lanes_mut, fence, StreamElement};

/// A lane pointer that may be shared across the grid's worker threads.
///
/// Threads write disjoint lanes, so sharing the base pointer is sound as long
/// as the launch covers the lane count exactly.
#[derive(Copy, Clone)]
struct GridPtr<P>(P);

unsafe impl<P> Send for GridPtr<P> {}
unsafe impl<P> Sync for GridPtr<P> {}

impl<P: Copy> GridPtr<P> {
    // Accessed through a method so closures capture the Sync wrapper, not the raw field
    #[inline(always)]
    fn get(self) -> P {
        self.0
    }
}

/// Executes grid kernels on the CPU.
///
/// Blocks are distributed over a rayon pool; the threads of one block run in
/// order on the worker that owns the block. Each worker fences its stores
/// before the block is reported done, so results are visible when a launch
/// returns.
pub struct HostGrid {
    pool: ThreadPool,
}

impl HostGrid {
    /// A grid executor using rayon's default number of workers.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// A grid executor with exactly `threads` workers.
    pub fn with_threads(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(config_error("threads must be at least 1"));
        }
        Self::build(Some(threads))
    }

    fn build(threads: Option<usize>) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|index| format!("memstream-grid-{index}"));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| StreamError::ThreadPoolError {
            message: e.to_string(),
        })?;

        log::debug!("host grid ready: {} workers", pool.current_num_threads());

        Ok(HostGrid { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `kernel` once per thread of `shape`.
    fn execute<F>(&self, shape: LaunchShape, kernel: F)
    where
        F: Fn(ThreadIdx) + Sync,
    {
        let block_dim = shape.block_dim;
        self.pool.install(|| {
            (0..shape.grid_dim).into_par_iter().for_each(|block_idx| {
                for thread_idx in 0..block_dim {
                    kernel(ThreadIdx {
                        block_idx,
                        block_dim,
                        thread_idx,
                    });
                }
                fence();
            })
        });
    }

    /// Copy kernel: `tgt = src`.
    pub fn copy<T: StreamElement>(&self, shape: LaunchShape, tgt: &mut [T], src: &[T]) -> Result<()> {
        check_len(tgt.len(), src.len())?;
        let tgt = as_lanes_mut(tgt)?;
        let src = as_lanes(src)?;
        check_shape(shape, tgt.len())?;

        log::debug!("host grid {}: {:?}", kernel_symbol::<T>(StreamOp::Copy), shape);

        let tgt = GridPtr(tgt.as_mut_ptr());
        let src = GridPtr(src.as_ptr());
        // SAFETY: lane views checked above and the shape covers them exactly
        self.execute(shape, |tid| unsafe { copy_kernel::<T>(tid, tgt.get(), src.get()) });
        Ok(())
    }

    /// Scale kernel: `tgt = scalar * src`.
    pub fn scale<T: StreamElement>(&self, shape: LaunchShape, tgt: &mut [T], src: &[T], scalar: T) -> Result<()> {
        check_len(tgt.len(), src.len())?;
        let tgt = as_lanes_mut(tgt)?;
        let src = as_lanes(src)?;
        check_shape(shape, tgt.len())?;

        log::debug!("host grid {}: {:?}", kernel_symbol::<T>(StreamOp::Scale), shape);

        let tgt = GridPtr(tgt.as_mut_ptr());
        let src = GridPtr(src.as_ptr());
        // SAFETY: as in copy
        self.execute(shape, |tid| unsafe {
            scale_kernel::<T>(tid, tgt.get(), src.get(), scalar)
        });
        Ok(())
    }

    /// Add kernel: `tgt = src_a + src_b`.
    pub fn add<T: StreamElement>(&self, shape: LaunchShape, tgt: &mut [T], src_a: &[T], src_b: &[T]) -> Result<()> {
        check_len(tgt.len(), src_a.len())?;
        check_len(tgt.len(), src_b.len())?;
        let tgt = as_lanes_mut(tgt)?;
        let src_a = as_lanes(src_a)?;
        let src_b = as_lanes(src_b)?;
        check_shape(shape, tgt.len())?;

        log::debug!("host grid {}: {:?}", kernel_symbol::<T>(StreamOp::Add), shape);

        let tgt = GridPtr(tgt.as_mut_ptr());
        let src_a = GridPtr(src_a.as_ptr());
        let src_b = GridPtr(src_b.as_ptr());
        // SAFETY: as in copy
        self.execute(shape, |tid| unsafe {
            add_kernel::<T>(tid, tgt.get(), src_a.get(), src_b.get())
        });
        Ok(())
    }

    /// Triad kernel: `tgt = src_b + scalar * src_a`.
    pub fn triad<T: StreamElement>(
        &self,
        shape: LaunchShape,
        tgt: &mut [T],
        src_a: &[T],
        src_b: &[T],
        scalar: T,
    ) -> Result<()> {
        check_len(tgt.len(), src_a.len())?;
        check_len(tgt.len(), src_b.len())?;
        let tgt = as_lanes_mut(tgt)?;
        let src_a = as_lanes(src_a)?;
        let src_b = as_lanes(src_b)?;
        check_shape(shape, tgt.len())?;

        log::debug!("host grid {}: {:?}", kernel_symbol::<T>(StreamOp::Triad), shape);

        let tgt = GridPtr(tgt.as_mut_ptr());
        let src_a = GridPtr(src_a.as_ptr());
        let src_b = GridPtr(src_b.as_ptr());
        // SAFETY: as in copy
        self.execute(shape, |tid| unsafe {
            triad_kernel::<T>(tid, tgt.get(), src_a.get(), src_b.get(), scalar)
        });
        Ok(())
    }

    /// Runs the grid form of `op` on the three host arrays.
    ///
    /// Lanes map onto the arrays so both engines compute the same thing:
    /// Copy `C <- A`, Scale `B <- s * C`, Add `C <- A + B`, Triad `A <- B + s * C`.
    pub fn run<T: StreamElement>(
        &self,
        op: StreamOp,
        shape: LaunchShape,
        arrays: &mut StreamArrays<'_, T>,
        s: T,
    ) -> Result<()> {
        let (a, b, c) = (&mut *arrays.a, &mut *arrays.b, &mut *arrays.c);
        match op {
            StreamOp::Copy => self.copy(shape, c, a),
            StreamOp::Scale => self.scale(shape, b, c, s),
            StreamOp::Add => self.add(shape, c, a, b),
            StreamOp::Triad => self.triad(shape, a, c, b, s),
        }
    }
}

fn check_shape(shape: LaunchShape, lanes: usize) -> Result<()> {
    if !shape.covers(lanes) {
        return Err(launch_error(
            shape.threads(),
            lanes as u64,
            "grid must have exactly one thread per lane",
        ));
    }
    Ok(())
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(length_mismatch(expected, actual));
    }
    Ok(())
}
