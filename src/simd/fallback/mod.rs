//! Portable fetch/store backend.
//!
//! Volatile reads and writes of the whole lane. The compiler will not cache,
//! merge or elide them, but nothing here can ask the hardware to bypass its
//! caches, so bandwidth figures taken on this backend include cache effects.

use std::ptr;
use std::sync::atomic::{self, Ordering};

use crate::simd::{F32x4, F64x2};

#[inline(always)]
pub(crate) unsafe fn fetch_f64x2(src: *const F64x2) -> F64x2 {
    ptr::read_volatile(src)
}

#[inline(always)]
pub(crate) unsafe fn store_f64x2(tgt: *mut F64x2, value: F64x2) {
    ptr::write_volatile(tgt, value)
}

#[inline(always)]
pub(crate) unsafe fn fetch_f32x4(src: *const F32x4) -> F32x4 {
    ptr::read_volatile(src)
}

#[inline(always)]
pub(crate) unsafe fn store_f32x4(tgt: *mut F32x4, value: F32x4) {
    ptr::write_volatile(tgt, value)
}

#[inline(always)]
pub fn fence() {
    atomic::fence(Ordering::SeqCst);
}
