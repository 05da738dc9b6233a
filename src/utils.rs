use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{validation_error, Result};
use crate::simd::StreamElement;
use crate::LANE_ALIGNMENT;

/// Returns `true` if `ptr` is a multiple of `align` bytes.
#[inline(always)]
pub fn is_aligned<T>(ptr: *const T, align: usize) -> bool {
    debug_assert!(align.is_power_of_two());
    (ptr as usize) & (align - 1) == 0
}

/// Returns `true` if `ptr` sits on a lane (128-bit) boundary.
#[inline(always)]
pub fn is_lane_aligned<T>(ptr: *const T) -> bool {
    is_aligned(ptr, LANE_ALIGNMENT)
}

/// A fixed-length array of stream elements whose base address is lane aligned.
///
/// The engines never allocate; this is the storage a harness (or a test) hands
/// them. The buffer is allocated once with [`LANE_ALIGNMENT`] (or more, if
/// requested) and freed on drop with the same layout.
///
/// # Example
///
/// ```rust
/// use memstream::{AlignedVec, LANE_ALIGNMENT};
///
/// let mut a = AlignedVec::<f64>::zeroed(8);
/// a.copy_from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
/// assert_eq!(a.as_ptr() as usize % LANE_ALIGNMENT, 0);
/// assert_eq!(a[7], 8.0);
/// ```
pub struct AlignedVec<T: Copy> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

// SAFETY: AlignedVec uniquely owns its buffer, exactly like Vec<T>.
unsafe impl<T: Copy + Send> Send for AlignedVec<T> {}
unsafe impl<T: Copy + Sync> Sync for AlignedVec<T> {}

impl<T: StreamElement> AlignedVec<T> {
    /// Allocates `len` zero-filled elements on a lane boundary.
    ///
    /// All-zero bytes are a valid `0.0` for both float types.
    ///
    /// # Panics
    ///
    /// Panics if the size overflows `isize`. Allocation failure goes through
    /// the global allocation error handler.
    pub fn zeroed(len: usize) -> Self {
        Self::zeroed_with_alignment(len, LANE_ALIGNMENT).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Allocates `len` zero-filled elements aligned to `align` bytes.
    ///
    /// `align` must be a power of two no smaller than the lane alignment.
    pub fn zeroed_with_alignment(len: usize, align: usize) -> Result<Self> {
        if !align.is_power_of_two() || align < LANE_ALIGNMENT || align < mem::align_of::<T>() {
            return Err(validation_error(format!(
                "alignment {align} must be a power of two and at least {LANE_ALIGNMENT}"
            )));
        }

        let size = len.checked_mul(mem::size_of::<T>()).ok_or_else(|| {
            validation_error(format!("total size overflowed for {len} elements"))
        })?;

        let layout = Layout::from_size_align(size, align)
            .map_err(|e| validation_error(format!("invalid layout ({size}, {align}): {e}")))?;

        if size == 0 {
            // Dangling but lane aligned, so empty arrays still pass alignment checks
            let dangling = align as *mut T;
            return Ok(AlignedVec {
                // SAFETY: align is a non-zero power of two
                ptr: unsafe { NonNull::new_unchecked(dangling) },
                len,
                layout,
            });
        }

        // SAFETY: layout has a non-zero size
        let raw = unsafe { alloc_zeroed(layout) } as *mut T;

        let ptr = match NonNull::new(raw) {
            Some(p) => p,
            None => handle_alloc_error(layout),
        };

        Ok(AlignedVec { ptr, len, layout })
    }

    /// Allocates an aligned copy of `data`.
    pub fn from_slice(data: &[T]) -> Self {
        let mut v = Self::zeroed(data.len());
        v.copy_from_slice(data);
        v
    }

    /// Allocates `len` elements all set to `value`.
    pub fn filled(len: usize, value: T) -> Self {
        let mut v = Self::zeroed(len);
        v.fill(value);
        v
    }

    /// Alignment the buffer was allocated with.
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }

    pub fn as_slice(&self) -> &[T] {
        self
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }
}

impl<T: Copy> Drop for AlignedVec<T> {
    fn drop(&mut self) {
        if self.layout.size() > 0 {
            // SAFETY: allocated in `zeroed_with_alignment` with this exact layout
            unsafe {
                dealloc(self.ptr.as_ptr() as *mut u8, self.layout);
            }
        }
    }
}

impl<T: Copy> Deref for AlignedVec<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        // SAFETY: ptr is valid (or dangling with len 0) for len initialized elements
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Copy> DerefMut for AlignedVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: as in deref, and &mut self guarantees unique access
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: StreamElement> Clone for AlignedVec<T> {
    fn clone(&self) -> Self {
        // Same layout as self, which was already accepted once
        let mut v = Self::zeroed_with_alignment(self.len, self.alignment())
            .unwrap_or_else(|e| panic!("{e}"));
        v.copy_from_slice(self);
        v
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for AlignedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Copy + PartialEq> PartialEq for AlignedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        **self == **other
    }
}

impl<T: Copy + PartialEq> PartialEq<[T]> for AlignedVec<T> {
    fn eq(&self, other: &[T]) -> bool {
        **self == *other
    }
}

impl<T: Copy> From<AlignedVec<T>> for Vec<T> {
    fn from(aligned_vec: AlignedVec<T>) -> Self {
        aligned_vec.to_vec()
    }
}
