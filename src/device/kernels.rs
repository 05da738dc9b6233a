//! Per-thread stream kernels.
//!
//! Each function is the body one grid thread runs: it computes its lane index
//! from its [`ThreadIdx`], fetches its source lanes, applies the arithmetic
//! and stores one target lane. Array memory is touched only through
//! [`Lane::fetch`] and [`Lane::store`].
//!
//! There is no bounds check. The launch must cover the lane count exactly and
//! every pointer must be 16-byte aligned and valid for that many lanes.

use super::launch::ThreadIdx;
use crate::op::StreamOp;
use crate::simd::{Lane, StreamElement};

/// CUDA C source of the same four kernels for `f32` and `f64`.
///
/// Compiled at runtime with NVRTC by `CudaGrid`; symbols are named by
/// [`kernel_symbol`].
pub const STREAM_KERNEL_SRC: &str = include_str!("kernels/stream.cu");

/// Name of the device symbol implementing `op` for element type `T`
/// (`copy_f64`, `triad_f32`, ...).
pub fn kernel_symbol<T: StreamElement>(op: StreamOp) -> String {
    format!("{}_{}", op.name().to_lowercase(), T::NAME)
}

/// Copy: `tgt[idx] = src[idx]`.
///
/// # Safety
///
/// `tgt` and `src` must be valid, aligned lane arrays longer than `tid.linear()`.
#[inline(always)]
pub unsafe fn copy_kernel<T: StreamElement>(tid: ThreadIdx, tgt: *mut T::Lane, src: *const T::Lane) {
    let index = tid.linear() as usize;
    let val = <T::Lane as Lane>::fetch(src.add(index));
    <T::Lane as Lane>::store(tgt.add(index), val);
}

/// Scale: `tgt[idx] = scalar * src[idx]`.
///
/// # Safety
///
/// Same contract as [`copy_kernel`].
#[inline(always)]
pub unsafe fn scale_kernel<T: StreamElement>(
    tid: ThreadIdx,
    tgt: *mut T::Lane,
    src: *const T::Lane,
    scalar: T,
) {
    let index = tid.linear() as usize;
    let val = <T::Lane as Lane>::fetch(src.add(index));
    <T::Lane as Lane>::store(tgt.add(index), val.scale(scalar));
}

/// Add: `tgt[idx] = src_a[idx] + src_b[idx]`.
///
/// # Safety
///
/// Same contract as [`copy_kernel`], for both sources.
#[inline(always)]
pub unsafe fn add_kernel<T: StreamElement>(
    tid: ThreadIdx,
    tgt: *mut T::Lane,
    src_a: *const T::Lane,
    src_b: *const T::Lane,
) {
    let index = tid.linear() as usize;
    let val_a = <T::Lane as Lane>::fetch(src_a.add(index));
    let val_b = <T::Lane as Lane>::fetch(src_b.add(index));
    <T::Lane as Lane>::store(tgt.add(index), val_a + val_b);
}

/// Triad: `tgt[idx] = src_b[idx] + scalar * src_a[idx]`.
///
/// # Safety
///
/// Same contract as [`add_kernel`].
#[inline(always)]
pub unsafe fn triad_kernel<T: StreamElement>(
    tid: ThreadIdx,
    tgt: *mut T::Lane,
    src_a: *const T::Lane,
    src_b: *const T::Lane,
    scalar: T,
) {
    let index = tid.linear() as usize;
    let val_a = <T::Lane as Lane>::fetch(src_a.add(index));
    let val_b = <T::Lane as Lane>::fetch(src_b.add(index));
    <T::Lane as Lane>::store(tgt.add(index), val_b.triad(val_a, scalar));
}
