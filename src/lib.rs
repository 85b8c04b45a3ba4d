//! Fractale computes Mandelbrot escape-time rasters over a viewport of the complex plane.
//!
//! Every pixel runs a fixed [`ITERATIONS`] steps of `z = z² + c` with no escape test and stores
//! the squared magnitude of the result. The same kernel runs on interchangeable backends:
//!
//! - [`BackendKind::Sequential`]: the calling thread, the reference implementation
//! - [`BackendKind::Threaded`]: rows spread over a rayon pool, bit-identical to sequential
//! - [`BackendKind::Accelerator`]: a WGSL compute kernel through `wgpu` (feature `gpu`)
//!
//! Pick one with [`create_backend`], or use the one-shot [`draw`]. [`render_zoom`] turns a backend
//! into a zoom animation encoded by the system `ffmpeg`.
#![forbid(unsafe_code)]

pub mod backend;
pub mod backend_cpu;
#[cfg(feature = "gpu")]
pub mod backend_wgpu;
pub mod config;
pub mod dispatch;
pub mod encode_ffmpeg;
mod foundation;
pub mod kernel;
pub mod output;
pub mod program;
pub mod zoom;

pub use backend::{
    AcceleratorSettings, BackendKind, BackendSettings, DrawBackend, PowerPreference,
    create_backend, draw,
};
pub use backend_cpu::{SequentialBackend, ThreadedBackend};
#[cfg(feature = "gpu")]
pub use backend_wgpu::{AcceleratorBackend, AcceleratorContext};
pub use config::{JobConfig, OutputSpec, ViewportSpec};
pub use dispatch::{DispatchGrid, KernelParams, WORKGROUP_SIZE};
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, default_mp4_config, is_ffmpeg_on_path};
pub use foundation::core::{Dimensions, PlanePoint, Raster, Viewport};
pub use foundation::error::{FractaleError, FractaleResult};
pub use kernel::{ITERATIONS, escape_magnitude, pixel_value, sample_point};
pub use output::{Classification, classify, raster_to_ascii, raster_to_gray8, write_png};
pub use program::{ENTRY_POINT, KernelSource, MAX_KERNEL_SOURCE_BYTES};
pub use zoom::{ZoomSpec, render_zoom};
