//! aarch64 fetch/store backend.
//!
//! Lanes move as a pair of 64-bit halves with the non-temporal pair
//! instructions `ldnp`/`stnp`, which hint the memory system not to keep the
//! line in the caches. Inline assembly is never elided or reordered with other
//! memory accesses by the compiler.

use std::arch::asm;
use std::mem;
use std::sync::atomic::{self, Ordering};

use crate::simd::{F32x4, F64x2};

#[inline(always)]
unsafe fn ldnp(src: *const u8) -> [f64; 2] {
    let lo: f64;
    let hi: f64;
    asm!(
        "ldnp {lo:d}, {hi:d}, [{src}]",
        src = in(reg) src,
        lo = out(vreg) lo,
        hi = out(vreg) hi,
        options(nostack, preserves_flags, readonly),
    );
    [lo, hi]
}

#[inline(always)]
unsafe fn stnp(tgt: *mut u8, halves: [f64; 2]) {
    asm!(
        "stnp {lo:d}, {hi:d}, [{tgt}]",
        tgt = in(reg) tgt,
        lo = in(vreg) halves[0],
        hi = in(vreg) halves[1],
        options(nostack, preserves_flags),
    );
}

#[inline(always)]
pub(crate) unsafe fn fetch_f64x2(src: *const F64x2) -> F64x2 {
    F64x2(ldnp(src as *const u8))
}

#[inline(always)]
pub(crate) unsafe fn store_f64x2(tgt: *mut F64x2, value: F64x2) {
    stnp(tgt as *mut u8, value.0)
}

#[inline(always)]
pub(crate) unsafe fn fetch_f32x4(src: *const F32x4) -> F32x4 {
    F32x4(mem::transmute::<[f64; 2], [f32; 4]>(ldnp(src as *const u8)))
}

#[inline(always)]
pub(crate) unsafe fn store_f32x4(tgt: *mut F32x4, value: F32x4) {
    stnp(tgt as *mut u8, mem::transmute::<[f32; 4], [f64; 2]>(value.0))
}

/// Orders the grid's stores before any later memory access (`dmb ish`).
#[inline(always)]
pub fn fence() {
    atomic::fence(Ordering::SeqCst);
}
