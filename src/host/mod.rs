//! Host Element-Stream Engine.
//!
//! The four STREAM loops over caller-owned scalar arrays. The loop bodies are
//! deliberately plain: with `lto = "fat"`, `codegen-units = 1` and
//! `target-cpu=native` LLVM unrolls and vectorizes them to the widest vector
//! unit of the build machine.
//!
//! Every index is independent, so any partition of `[0, L)` into disjoint
//! contiguous ranges gives the same result as one pass over the whole range.
//! [`HostEngine`] uses that to fan an operation out over a worker pool.
//!
//! ```rust
//! use memstream::{host, StreamArrays, StreamOp};
//!
//! let mut a = vec![1.0f64, 2.0, 3.0, 4.0];
//! let mut b = vec![4.0f64, 3.0, 2.0, 1.0];
//! let mut c = vec![0.0f64; 4];
//!
//! host::add(&a, &b, &mut c);
//! assert_eq!(c, [5.0; 4]);
//!
//! let mut arrays = StreamArrays::new(&mut a, &mut b, &mut c).unwrap();
//! arrays.run(StreamOp::Triad, 2.0);
//! assert_eq!(arrays.a(), &[14.0, 13.0, 12.0, 11.0]);
//! ```

mod engine;

pub use engine::{HostEngine, HostEngineBuilder};

use crate::error::{length_mismatch, Result};
use crate::op::{ArrayId, StreamOp};
use crate::simd::StreamElement;

/// Copy: `c[i] = a[i]`.
///
/// # Panics
///
/// Panics if the arrays differ in length.
#[inline]
pub fn copy<T: StreamElement>(a: &[T], c: &mut [T]) {
    assert_eq!(a.len(), c.len(), "Arrays must be the same length");

    for (c, &a) in c.iter_mut().zip(a) {
        *c = a;
    }
}

/// Scale: `b[i] = s * c[i]`.
///
/// # Panics
///
/// Panics if the arrays differ in length.
#[inline]
pub fn scale<T: StreamElement>(b: &mut [T], c: &[T], s: T) {
    assert_eq!(b.len(), c.len(), "Arrays must be the same length");

    for (b, &c) in b.iter_mut().zip(c) {
        *b = s * c;
    }
}

/// Add: `c[i] = a[i] + b[i]`.
///
/// # Panics
///
/// Panics if the arrays differ in length.
#[inline]
pub fn add<T: StreamElement>(a: &[T], b: &[T], c: &mut [T]) {
    assert_eq!(a.len(), b.len(), "Arrays must be the same length");
    assert_eq!(a.len(), c.len(), "Arrays must be the same length");

    for ((c, &a), &b) in c.iter_mut().zip(a).zip(b) {
        *c = a + b;
    }
}

/// Triad: `a[i] = b[i] + s * c[i]`.
///
/// # Panics
///
/// Panics if the arrays differ in length.
#[inline]
pub fn triad<T: StreamElement>(a: &mut [T], b: &[T], c: &[T], s: T) {
    assert_eq!(a.len(), b.len(), "Arrays must be the same length");
    assert_eq!(a.len(), c.len(), "Arrays must be the same length");

    for ((a, &b), &c) in a.iter_mut().zip(b).zip(c) {
        *a = b + s * c;
    }
}

/// The three arrays of a run, borrowed from the caller.
///
/// Lengths are checked once on construction; every operation then runs over
/// the full common length. The engine never reallocates or reorders them.
#[derive(Debug)]
pub struct StreamArrays<'a, T> {
    pub(crate) a: &'a mut [T],
    pub(crate) b: &'a mut [T],
    pub(crate) c: &'a mut [T],
}

impl<'a, T: StreamElement> StreamArrays<'a, T> {
    pub fn new(a: &'a mut [T], b: &'a mut [T], c: &'a mut [T]) -> Result<Self> {
        if b.len() != a.len() {
            return Err(length_mismatch(a.len(), b.len()));
        }
        if c.len() != a.len() {
            return Err(length_mismatch(a.len(), c.len()));
        }
        Ok(StreamArrays { a, b, c })
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    pub fn a(&self) -> &[T] {
        self.a
    }

    pub fn b(&self) -> &[T] {
        self.b
    }

    pub fn c(&self) -> &[T] {
        self.c
    }

    /// Borrows one array by name.
    pub fn array(&self, id: ArrayId) -> &[T] {
        match id {
            ArrayId::A => &*self.a,
            ArrayId::B => &*self.b,
            ArrayId::C => &*self.c,
        }
    }

    /// Splits every array at `mid` into two disjoint runs, `[0, mid)` and `[mid, L)`.
    ///
    /// # Panics
    ///
    /// Panics if `mid > len`.
    pub fn split_at(&mut self, mid: usize) -> (StreamArrays<'_, T>, StreamArrays<'_, T>) {
        let (a_lo, a_hi) = self.a.split_at_mut(mid);
        let (b_lo, b_hi) = self.b.split_at_mut(mid);
        let (c_lo, c_hi) = self.c.split_at_mut(mid);
        (
            StreamArrays {
                a: a_lo,
                b: b_lo,
                c: c_lo,
            },
            StreamArrays {
                a: a_hi,
                b: b_hi,
                c: c_hi,
            },
        )
    }

    /// Runs `op` over the whole range on the calling thread.
    ///
    /// `s` is ignored by Copy and Add.
    pub fn run(&mut self, op: StreamOp, s: T) {
        match op {
            StreamOp::Copy => copy(self.a, self.c),
            StreamOp::Scale => scale(self.b, self.c, s),
            StreamOp::Add => add(self.a, self.b, self.c),
            StreamOp::Triad => triad(self.a, self.b, self.c, s),
        }
    }
}
