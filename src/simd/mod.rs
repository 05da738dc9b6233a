//! Element types, 128-bit lanes and the lane fetch/store primitive.
//!
//! The backend is chosen by `build.rs` for the compilation target:
//!
//! | cfg        | Fetch                     | Store                       |
//! |------------|---------------------------|-----------------------------|
//! | `sse`      | volatile `movapd/movaps`  | non-temporal `movntpd/movntps` |
//! | `neon`     | `ldnp` (non-temporal)     | `stnp` (non-temporal)       |
//! | `fallback` | `ptr::read_volatile`      | `ptr::write_volatile`       |
//!
//! Set `MEMSTREAM_BACKEND=fallback` at build time to force the portable path.

use std::slice;

use crate::error::{alignment_error, validation_error, Result};
use crate::utils::is_lane_aligned;
use crate::LANE_ALIGNMENT;

#[cfg(sse)]
mod sse;
#[cfg(sse)]
use self::sse as backend;

#[cfg(neon)]
mod neon;
#[cfg(neon)]
use self::neon as backend;

#[cfg(fallback)]
mod fallback;
#[cfg(fallback)]
use self::fallback as backend;

mod lanes;
pub mod traits;

pub use backend::fence;
pub use lanes::{F32x4, F64x2};
pub use traits::{Lane, StreamElement};

/// Name of the fetch/store backend compiled into this build.
pub const fn backend_name() -> &'static str {
    if cfg!(sse) {
        "sse"
    } else if cfg!(neon) {
        "neon"
    } else {
        "fallback"
    }
}

/// Number of whole lanes in `len` elements of `T`.
#[inline(always)]
pub fn lane_count<T: StreamElement>(len: usize) -> usize {
    len / T::LANE_WIDTH
}

fn check_lane_view<T: StreamElement>(ptr: *const T, len: usize) -> Result<()> {
    if len % T::LANE_WIDTH != 0 {
        return Err(validation_error(format!(
            "{len} {} elements do not form whole {}-wide lanes",
            T::NAME,
            T::LANE_WIDTH
        )));
    }
    // An empty array is never dereferenced, whatever its dangling address
    if len > 0 && !is_lane_aligned(ptr) {
        return Err(alignment_error(ptr, LANE_ALIGNMENT));
    }
    Ok(())
}

/// Reinterprets an element array as a lane array.
///
/// Fails if the base is not 16-byte aligned or the length is not a multiple of
/// the lane width.
pub fn as_lanes<T: StreamElement>(data: &[T]) -> Result<&[T::Lane]> {
    check_lane_view(data.as_ptr(), data.len())?;
    // An empty slice's dangling pointer need not be lane aligned
    if data.is_empty() {
        return Ok(&[]);
    }
    // SAFETY: alignment and length checked above; lanes are repr(C) arrays of T
    Ok(unsafe {
        slice::from_raw_parts(data.as_ptr() as *const T::Lane, lane_count::<T>(data.len()))
    })
}

/// Mutable form of [`as_lanes`].
pub fn as_lanes_mut<T: StreamElement>(data: &mut [T]) -> Result<&mut [T::Lane]> {
    check_lane_view(data.as_ptr(), data.len())?;
    if data.is_empty() {
        return Ok(&mut []);
    }
    // SAFETY: as in as_lanes, with unique access inherited from `data`
    Ok(unsafe {
        slice::from_raw_parts_mut(data.as_mut_ptr() as *mut T::Lane, lane_count::<T>(data.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;
    use crate::AlignedVec;

    #[test]
    fn test_as_lanes_groups_elements() {
        let data = AlignedVec::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let lanes = as_lanes(&data).unwrap();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[1].to_array(), [5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_as_lanes_mut_writes_through() {
        let mut data = AlignedVec::<f64>::zeroed(4);
        as_lanes_mut(&mut data).unwrap()[1] = F64x2::new([3.0, 4.0]);
        assert_eq!(data.as_slice(), &[0.0, 0.0, 3.0, 4.0]);
    }

    #[test]
    fn test_partial_lane_rejected() {
        let data = AlignedVec::<f32>::zeroed(6);
        assert!(matches!(
            as_lanes(&data),
            Err(StreamError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_misaligned_rejected() {
        let data = AlignedVec::<f64>::zeroed(5);
        // One element in: 8-byte aligned only
        assert!(matches!(
            as_lanes(&data[1..]),
            Err(StreamError::AlignmentError { required: 16, .. })
        ));
    }

    #[test]
    fn test_empty_view_ignores_address() {
        // Vec's dangling pointer is only 8-byte aligned
        let mut data: Vec<f64> = Vec::new();
        assert!(as_lanes(&data).unwrap().is_empty());
        assert!(as_lanes_mut(&mut data).unwrap().is_empty());

        let mut data: Vec<f32> = Vec::new();
        assert!(as_lanes(&data).unwrap().is_empty());
        assert!(as_lanes_mut(&mut data).unwrap().is_empty());
    }

    #[test]
    fn test_backend_name() {
        assert!(["sse", "neon", "fallback"].contains(&backend_name()));
    }
}
