use std::sync::Arc;

use cudarc::driver::{
    CudaContext, CudaFunction, CudaModule, CudaSlice, CudaStream, DeviceRepr, LaunchConfig,
    PushKernelArg, ValidAsZeroBits,
};
use cudarc::nvrtc::compile_ptx;

use super::kernels::{kernel_symbol, STREAM_KERNEL_SRC};
use super::launch::LaunchShape;
use crate::error::{device_error, launch_error, length_mismatch, validation_error, Result};
use crate::op::StreamOp;
use crate::simd::StreamElement;

/// Executes grid kernels on an NVIDIA GPU.
///
/// The kernels of `stream.cu` are compiled with NVRTC once, on construction.
/// Every launch is synchronized before returning.
pub struct CudaGrid {
    _ctx: Arc<CudaContext>,
    stream: Arc<CudaStream>,
    module: Arc<CudaModule>,
}

impl CudaGrid {
    pub fn new(device_id: usize) -> Result<Self> {
        let ctx = CudaContext::new(device_id).map_err(|e| {
            device_error(format!("failed to create context for device {device_id}: {e:?}"))
        })?;
        let stream = ctx.default_stream();

        let ptx = compile_ptx(STREAM_KERNEL_SRC)
            .map_err(|e| device_error(format!("failed to compile stream kernels: {e:?}")))?;
        let module = ctx
            .load_module(ptx)
            .map_err(|e| device_error(format!("failed to load stream module: {e:?}")))?;

        log::debug!("cuda grid ready on device {device_id}");

        Ok(CudaGrid {
            _ctx: ctx,
            stream,
            module,
        })
    }

    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }

    /// Copies `data` into a new device array.
    pub fn upload<T: StreamElement + DeviceRepr>(&self, data: &[T]) -> Result<CudaSlice<T>> {
        self.stream
            .memcpy_stod(data)
            .map_err(|e| device_error(format!("host to device copy failed: {e:?}")))
    }

    /// A zero-filled device array of `len` elements.
    pub fn zeroed<T: StreamElement + DeviceRepr + ValidAsZeroBits>(
        &self,
        len: usize,
    ) -> Result<CudaSlice<T>> {
        self.stream
            .alloc_zeros(len)
            .map_err(|e| device_error(format!("device allocation of {len} elements failed: {e:?}")))
    }

    /// Copies a device array back to the host.
    pub fn download<T: StreamElement + DeviceRepr>(&self, data: &CudaSlice<T>) -> Result<Vec<T>> {
        self.stream
            .memcpy_dtov(data)
            .map_err(|e| device_error(format!("device to host copy failed: {e:?}")))
    }

    /// Copy kernel: `tgt = src`.
    pub fn copy<T: StreamElement + DeviceRepr>(
        &self,
        shape: LaunchShape,
        tgt: &mut CudaSlice<T>,
        src: &CudaSlice<T>,
    ) -> Result<()> {
        if !self.prepare::<T>(StreamOp::Copy, shape, tgt.len(), &[src.len()])? {
            return Ok(());
        }
        let function = self.function::<T>(StreamOp::Copy)?;
        let mut builder = self.stream.launch_builder(&function);
        builder.arg(tgt);
        builder.arg(src);
        // SAFETY: argument list matches copy_<elem>; shape checked in prepare
        unsafe { builder.launch(LaunchConfig::from(shape)) }
            .map_err(|e| device_error(format!("copy launch failed: {e:?}")))?;
        self.synchronize()
    }

    /// Scale kernel: `tgt = scalar * src`.
    pub fn scale<T: StreamElement + DeviceRepr>(
        &self,
        shape: LaunchShape,
        tgt: &mut CudaSlice<T>,
        src: &CudaSlice<T>,
        scalar: T,
    ) -> Result<()> {
        if !self.prepare::<T>(StreamOp::Scale, shape, tgt.len(), &[src.len()])? {
            return Ok(());
        }
        let function = self.function::<T>(StreamOp::Scale)?;
        let mut builder = self.stream.launch_builder(&function);
        builder.arg(tgt);
        builder.arg(src);
        builder.arg(&scalar);
        // SAFETY: as in copy
        unsafe { builder.launch(LaunchConfig::from(shape)) }
            .map_err(|e| device_error(format!("scale launch failed: {e:?}")))?;
        self.synchronize()
    }

    /// Add kernel: `tgt = src_a + src_b`.
    pub fn add<T: StreamElement + DeviceRepr>(
        &self,
        shape: LaunchShape,
        tgt: &mut CudaSlice<T>,
        src_a: &CudaSlice<T>,
        src_b: &CudaSlice<T>,
    ) -> Result<()> {
        if !self.prepare::<T>(StreamOp::Add, shape, tgt.len(), &[src_a.len(), src_b.len()])? {
            return Ok(());
        }
        let function = self.function::<T>(StreamOp::Add)?;
        let mut builder = self.stream.launch_builder(&function);
        builder.arg(tgt);
        builder.arg(src_a);
        builder.arg(src_b);
        // SAFETY: as in copy
        unsafe { builder.launch(LaunchConfig::from(shape)) }
            .map_err(|e| device_error(format!("add launch failed: {e:?}")))?;
        self.synchronize()
    }

    /// Triad kernel: `tgt = src_b + scalar * src_a`.
    pub fn triad<T: StreamElement + DeviceRepr>(
        &self,
        shape: LaunchShape,
        tgt: &mut CudaSlice<T>,
        src_a: &CudaSlice<T>,
        src_b: &CudaSlice<T>,
        scalar: T,
    ) -> Result<()> {
        if !self.prepare::<T>(StreamOp::Triad, shape, tgt.len(), &[src_a.len(), src_b.len()])? {
            return Ok(());
        }
        let function = self.function::<T>(StreamOp::Triad)?;
        let mut builder = self.stream.launch_builder(&function);
        builder.arg(tgt);
        builder.arg(src_a);
        builder.arg(src_b);
        builder.arg(&scalar);
        // SAFETY: as in copy
        unsafe { builder.launch(LaunchConfig::from(shape)) }
            .map_err(|e| device_error(format!("triad launch failed: {e:?}")))?;
        self.synchronize()
    }

    /// Validates a launch. Returns `false` when there is nothing to launch.
    fn prepare<T: StreamElement>(
        &self,
        op: StreamOp,
        shape: LaunchShape,
        len: usize,
        sources: &[usize],
    ) -> Result<bool> {
        for &source in sources {
            if source != len {
                return Err(length_mismatch(len, source));
            }
        }
        if len % T::LANE_WIDTH != 0 {
            return Err(validation_error(format!(
                "{len} {} elements do not form whole {}-wide lanes",
                T::NAME,
                T::LANE_WIDTH
            )));
        }
        let lanes = len / T::LANE_WIDTH;
        if !shape.covers(lanes) {
            return Err(launch_error(
                shape.threads(),
                lanes as u64,
                "grid must have exactly one thread per lane",
            ));
        }

        log::debug!("cuda grid {}: {:?}", kernel_symbol::<T>(op), shape);

        Ok(lanes > 0)
    }

    fn function<T: StreamElement>(&self, op: StreamOp) -> Result<CudaFunction> {
        let symbol = kernel_symbol::<T>(op);
        self.module
            .load_function(&symbol)
            .map_err(|e| device_error(format!("failed to load {symbol}: {e:?}")))
    }

    fn synchronize(&self) -> Result<()> {
        self.stream
            .synchronize()
            .map_err(|e| device_error(format!("stream synchronize failed: {e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs an NVIDIA GPU and the CUDA toolkit.
    #[test]
    #[ignore]
    fn test_triad_on_device() {
        let grid = CudaGrid::new(0).unwrap();
        let a: Vec<f64> = (0..8).map(|i| i as f64 + 1.0).collect();
        let b: Vec<f64> = (0..8).map(|i| 8.0 - i as f64).collect();

        let src_a = grid.upload(&a).unwrap();
        let src_b = grid.upload(&b).unwrap();
        let mut tgt = grid.zeroed::<f64>(8).unwrap();

        grid.triad(LaunchShape::new(2, 2), &mut tgt, &src_a, &src_b, 2.0)
            .unwrap();

        let out = grid.download(&tgt).unwrap();
        assert_eq!(out, vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17.0]);
    }

    #[test]
    #[ignore]
    fn test_shape_must_cover_lanes_on_device() {
        let grid = CudaGrid::new(0).unwrap();
        let src = grid.upload(&[1.0f32; 16]).unwrap();
        let mut tgt = grid.zeroed::<f32>(16).unwrap();
        assert!(grid.copy(LaunchShape::new(2, 1), &mut tgt, &src).is_err());
    }
}
