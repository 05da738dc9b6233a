//! The two lane types: `F64x2` and `F32x4`.
//!
//! Both are plain `#[repr(C, align(16))]` arrays so that a lane is exactly one
//! 128-bit memory transaction. Arithmetic is written per component; LLVM lowers
//! it to a single vector instruction on every target with 128-bit registers.

use std::mem;
use std::ops::{Add, Mul};

use super::backend;
use super::traits::{Lane, StreamElement};
use crate::{LANE_ALIGNMENT, LANE_BYTES};

/// Two packed `f64` values.
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct F64x2(pub [f64; 2]);

/// Four packed `f32` values.
#[repr(C, align(16))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct F32x4(pub [f32; 4]);

const _: () = assert!(mem::size_of::<F64x2>() == LANE_BYTES);
const _: () = assert!(mem::align_of::<F64x2>() == LANE_ALIGNMENT);
const _: () = assert!(mem::size_of::<F32x4>() == LANE_BYTES);
const _: () = assert!(mem::align_of::<F32x4>() == LANE_ALIGNMENT);

impl F64x2 {
    #[inline(always)]
    pub const fn new(elements: [f64; 2]) -> Self {
        F64x2(elements)
    }

    #[inline(always)]
    pub const fn to_array(self) -> [f64; 2] {
        self.0
    }
}

impl F32x4 {
    #[inline(always)]
    pub const fn new(elements: [f32; 4]) -> Self {
        F32x4(elements)
    }

    #[inline(always)]
    pub const fn to_array(self) -> [f32; 4] {
        self.0
    }
}

impl Add for F64x2 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        F64x2([self.0[0] + rhs.0[0], self.0[1] + rhs.0[1]])
    }
}

impl Mul<f64> for F64x2 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, s: f64) -> Self::Output {
        F64x2([self.0[0] * s, self.0[1] * s])
    }
}

impl Add for F32x4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self::Output {
        F32x4([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
            self.0[3] + rhs.0[3],
        ])
    }
}

impl Mul<f32> for F32x4 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, s: f32) -> Self::Output {
        F32x4([self.0[0] * s, self.0[1] * s, self.0[2] * s, self.0[3] * s])
    }
}

impl Lane for F64x2 {
    type Elem = f64;

    const WIDTH: usize = 2;

    #[inline(always)]
    fn scale(self, s: f64) -> Self {
        self * s
    }

    #[inline(always)]
    fn splat(value: f64) -> Self {
        F64x2([value; 2])
    }

    #[inline(always)]
    fn from_slice(slice: &[f64]) -> Self {
        F64x2([slice[0], slice[1]])
    }

    #[inline(always)]
    fn write_to_slice(self, out: &mut [f64]) {
        out[..2].copy_from_slice(&self.0);
    }

    #[inline(always)]
    unsafe fn fetch(src: *const Self) -> Self {
        backend::fetch_f64x2(src)
    }

    #[inline(always)]
    unsafe fn store(tgt: *mut Self, value: Self) {
        backend::store_f64x2(tgt, value)
    }
}

impl Lane for F32x4 {
    type Elem = f32;

    const WIDTH: usize = 4;

    #[inline(always)]
    fn scale(self, s: f32) -> Self {
        self * s
    }

    #[inline(always)]
    fn splat(value: f32) -> Self {
        F32x4([value; 4])
    }

    #[inline(always)]
    fn from_slice(slice: &[f32]) -> Self {
        F32x4([slice[0], slice[1], slice[2], slice[3]])
    }

    #[inline(always)]
    fn write_to_slice(self, out: &mut [f32]) {
        out[..4].copy_from_slice(&self.0);
    }

    #[inline(always)]
    unsafe fn fetch(src: *const Self) -> Self {
        backend::fetch_f32x4(src)
    }

    #[inline(always)]
    unsafe fn store(tgt: *mut Self, value: Self) {
        backend::store_f32x4(tgt, value)
    }
}

impl StreamElement for f64 {
    type Lane = F64x2;

    const LANE_WIDTH: usize = 2;

    const NAME: &'static str = "f64";
}

impl StreamElement for f32 {
    type Lane = F32x4;

    const LANE_WIDTH: usize = 4;

    const NAME: &'static str = "f32";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane_bits<T: StreamElement>() -> usize {
        T::LANE_WIDTH * mem::size_of::<T>() * 8
    }

    #[test]
    fn test_lane_width_mapping() {
        assert_eq!(<f64 as StreamElement>::LANE_WIDTH, 2);
        assert_eq!(<f32 as StreamElement>::LANE_WIDTH, 4);
        assert_eq!(<F64x2 as Lane>::WIDTH, <f64 as StreamElement>::LANE_WIDTH);
        assert_eq!(<F32x4 as Lane>::WIDTH, <f32 as StreamElement>::LANE_WIDTH);
        assert_eq!(lane_bits::<f64>(), 128);
        assert_eq!(lane_bits::<f32>(), 128);
    }

    #[test]
    fn test_arithmetic() {
        let a = F64x2::new([1.0, 2.0]);
        let b = F64x2::new([8.0, 7.0]);
        assert_eq!((a + b).to_array(), [9.0, 9.0]);
        assert_eq!((a * 2.0).to_array(), [2.0, 4.0]);
        assert_eq!(b.triad(a, 2.0).to_array(), [10.0, 11.0]);

        let c = F32x4::new([1.0, 2.0, 3.0, 4.0]);
        assert_eq!((c + F32x4::splat(1.0)).to_array(), [2.0, 3.0, 4.0, 5.0]);
        assert_eq!((c * 0.5).to_array(), [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(c.scale(0.5), c * 0.5);
    }

    #[test]
    fn test_slice_conversion() {
        let lane = F32x4::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let mut out = [0.0f32; 4];
        lane.write_to_slice(&mut out);
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_fetch_store_round_trip() {
        let src = [F64x2::new([1.5, -2.5]), F64x2::new([3.0, 4.0])];
        let mut dst = [F64x2::default(); 2];
        unsafe {
            for i in 0..2 {
                let v = F64x2::fetch(src.as_ptr().add(i));
                F64x2::store(dst.as_mut_ptr().add(i), v);
            }
            backend::fence();
        }
        assert_eq!(dst, src);

        let src = F32x4::new([0.25, 0.5, 0.75, 1.0]);
        let mut dst = F32x4::default();
        unsafe {
            F32x4::store(&mut dst, F32x4::fetch(&src));
            backend::fence();
        }
        assert_eq!(dst, src);
    }
}
