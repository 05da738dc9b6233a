//! x86 fetch/store backend.
//!
//! - **Fetch**: a volatile aligned 128-bit load (`movapd`/`movaps`). The
//!   volatile read cannot be merged, hoisted or elided by the optimizer.
//! - **Store**: an SSE2 non-temporal store (`movntpd`/`movntps`). The line goes
//!   to memory through the write-combining buffers without being allocated in
//!   the cache hierarchy.
//!
//! Non-temporal stores are weakly ordered, so every grid launch ends with
//! [`fence`] (`sfence`) before its results are observed.

#[cfg(target_arch = "x86")]
use std::arch::x86::*;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use std::mem;
use std::ptr;

use crate::simd::{F32x4, F64x2};

#[inline(always)]
pub(crate) unsafe fn fetch_f64x2(src: *const F64x2) -> F64x2 {
    let v = ptr::read_volatile(src as *const __m128d);
    F64x2(mem::transmute::<__m128d, [f64; 2]>(v))
}

#[inline(always)]
pub(crate) unsafe fn store_f64x2(tgt: *mut F64x2, value: F64x2) {
    _mm_stream_pd(tgt as *mut f64, mem::transmute::<[f64; 2], __m128d>(value.0));
}

#[inline(always)]
pub(crate) unsafe fn fetch_f32x4(src: *const F32x4) -> F32x4 {
    let v = ptr::read_volatile(src as *const __m128);
    F32x4(mem::transmute::<__m128, [f32; 4]>(v))
}

#[inline(always)]
pub(crate) unsafe fn store_f32x4(tgt: *mut F32x4, value: F32x4) {
    _mm_stream_ps(tgt as *mut f32, mem::transmute::<[f32; 4], __m128>(value.0));
}

/// Orders all preceding non-temporal stores before any later memory access.
#[inline(always)]
pub fn fence() {
    // SAFETY: sse2 is part of the target (checked by build.rs)
    unsafe { _mm_sfence() }
}
