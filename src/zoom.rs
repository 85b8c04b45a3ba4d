//! Zoom animation: a sequence of centered viewports narrowing toward a fixed point, each frame
//! drawn by a [`DrawBackend`] and streamed to `ffmpeg`.

use std::path::Path;

use crate::{
    backend::DrawBackend,
    encode_ffmpeg::{FfmpegEncoder, default_mp4_config},
    foundation::core::{Dimensions, PlanePoint, Raster, Viewport},
    foundation::error::{FractaleError, FractaleResult},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomSpec {
    pub center: PlanePoint,
    /// Real-axis extent before the first shrink step.
    pub start_width: f32,
    /// Fraction of the width removed per frame, in `(0, 1)`.
    pub shrink: f32,
    pub frames: u32,
    pub fps: u32,
    pub dims: Dimensions,
}

impl Default for ZoomSpec {
    fn default() -> Self {
        Self {
            center: PlanePoint::new(-0.403, 0.595),
            start_width: 4.0,
            shrink: 0.03,
            frames: 400,
            fps: 20,
            dims: Dimensions {
                width: 1280,
                height: 720,
            },
        }
    }
}

impl ZoomSpec {
    pub fn validate(&self) -> FractaleResult<()> {
        if !self.start_width.is_finite() || self.start_width <= 0.0 {
            return Err(FractaleError::validation(format!(
                "zoom start width must be positive, got {}",
                self.start_width
            )));
        }
        if !(self.shrink > 0.0 && self.shrink < 1.0) {
            return Err(FractaleError::validation(format!(
                "zoom shrink must lie in (0, 1), got {}",
                self.shrink
            )));
        }
        if self.frames == 0 {
            return Err(FractaleError::validation("zoom needs at least one frame"));
        }
        self.dims.validate()
    }

    /// Real-axis extent of frame `n`. The width shrinks once before the first frame is drawn.
    pub fn frame_width(&self, n: u32) -> f32 {
        let keep = 1.0 - self.shrink as f64;
        (self.start_width as f64 * keep.powi(n as i32 + 1)) as f32
    }

    pub fn frame_viewport(&self, n: u32) -> FractaleResult<Viewport> {
        Viewport::centered(self.center, self.frame_width(n), self.dims)
    }
}

/// Draw every frame of `spec` with `backend` and encode them to an MP4 at `out_path`.
#[tracing::instrument(skip(backend, spec), fields(backend = backend.name(), frames = spec.frames))]
pub fn render_zoom(
    backend: &mut dyn DrawBackend,
    spec: &ZoomSpec,
    out_path: &Path,
) -> FractaleResult<()> {
    spec.validate()?;
    let mut encoder = FfmpegEncoder::new(default_mp4_config(
        out_path,
        spec.dims.width,
        spec.dims.height,
        spec.fps,
    ))?;

    let mut raster = Raster::new(spec.dims)?;
    for n in 0..spec.frames {
        let viewport = spec.frame_viewport(n)?;
        let started = std::time::Instant::now();
        backend.draw(&mut raster.data, spec.dims, &viewport)?;
        encoder.encode_frame(&raster)?;
        tracing::debug!(
            frame = n,
            width = viewport.bottom_right.re - viewport.top_left.re,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "zoom frame"
        );
    }
    encoder.finish()
}
