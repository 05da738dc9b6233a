use std::fmt::Debug;
use std::ops::Add;

use num::Float;

mod sealed {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
    impl Sealed for super::super::F32x4 {}
    impl Sealed for super::super::F64x2 {}
}

/// Scalar element types the kernels accept.
///
/// The trait is sealed and implemented for `f32` and `f64` only, so the
/// element → lane mapping is closed: asking for the lane of any other type is
/// a compile error.
///
/// ```compile_fail
/// use memstream::StreamElement;
///
/// fn lane_width<T: StreamElement>() -> usize {
///     T::LANE_WIDTH
/// }
///
/// lane_width::<i32>();
/// ```
pub trait StreamElement: Float + Debug + Default + Send + Sync + sealed::Sealed + 'static {
    /// The 128-bit lane made of `LANE_WIDTH` elements of this type.
    type Lane: Lane<Elem = Self>;

    /// Elements per lane (2 for `f64`, 4 for `f32`).
    const LANE_WIDTH: usize;

    /// Suffix naming this element type in device kernel symbols.
    const NAME: &'static str;
}

/// A 128-bit group of elements, the unit the grid kernels move.
///
/// `fetch` and `store` are the only way kernels touch array memory. Each
/// backend implements them with its cache-bypassing access instructions.
pub trait Lane:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + Add<Output = Self>
    + sealed::Sealed
    + 'static
{
    type Elem: StreamElement<Lane = Self>;

    /// Number of elements in the lane.
    const WIDTH: usize;

    /// Multiplies every component by `s`.
    fn scale(self, s: Self::Elem) -> Self;

    /// Broadcasts `value` to every component.
    fn splat(value: Self::Elem) -> Self;

    /// Builds a lane from the first `WIDTH` elements of `slice`.
    ///
    /// # Panics
    ///
    /// Panics if `slice` holds fewer than `WIDTH` elements.
    fn from_slice(slice: &[Self::Elem]) -> Self;

    /// Writes the components into the first `WIDTH` slots of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` holds fewer than `WIDTH` elements.
    fn write_to_slice(self, out: &mut [Self::Elem]);

    /// Reads one lane from memory, bypassing the caches where the target allows.
    ///
    /// # Safety
    ///
    /// `src` must be valid for reads and 16-byte aligned.
    unsafe fn fetch(src: *const Self) -> Self;

    /// Writes one lane to memory, bypassing the caches where the target allows.
    ///
    /// # Safety
    ///
    /// `tgt` must be valid for writes and 16-byte aligned.
    unsafe fn store(tgt: *mut Self, value: Self);

    /// `self + s * rhs`, component-wise, as a multiply then an add.
    #[inline(always)]
    fn triad(self, rhs: Self, s: Self::Elem) -> Self {
        self + rhs.scale(s)
    }
}
