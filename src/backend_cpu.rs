use rayon::prelude::*;

use crate::{
    backend::DrawBackend,
    foundation::core::{Dimensions, Viewport, check_raster_len},
    foundation::error::{FractaleError, FractaleResult},
    kernel::pixel_value,
};

/// Reference backend: every pixel on the calling thread, row-major.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialBackend;

impl SequentialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DrawBackend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    #[tracing::instrument(name = "sequential_draw", skip_all, fields(width = dims.width, height = dims.height))]
    fn draw(
        &mut self,
        dest: &mut [f32],
        dims: Dimensions,
        viewport: &Viewport,
    ) -> FractaleResult<()> {
        check_raster_len(dest, dims)?;
        viewport.validate()?;

        for j in 0..dims.height {
            for i in 0..dims.width {
                dest[dims.offset(i, j)] = pixel_value(i, j, dims, viewport);
            }
        }
        Ok(())
    }
}

/// Rows fanned out over a rayon pool. Same per-pixel arithmetic as [`SequentialBackend`], so the
/// output is bit-identical.
pub struct ThreadedBackend {
    pool: rayon::ThreadPool,
}

impl ThreadedBackend {
    pub fn new(threads: Option<usize>) -> FractaleResult<Self> {
        Ok(Self {
            pool: build_thread_pool(threads)?,
        })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl DrawBackend for ThreadedBackend {
    fn name(&self) -> &'static str {
        "threaded"
    }

    #[tracing::instrument(name = "threaded_draw", skip_all, fields(width = dims.width, height = dims.height))]
    fn draw(
        &mut self,
        dest: &mut [f32],
        dims: Dimensions,
        viewport: &Viewport,
    ) -> FractaleResult<()> {
        check_raster_len(dest, dims)?;
        viewport.validate()?;
        tracing::debug!(threads = self.threads(), "drawing rows in parallel");

        self.pool.install(|| {
            dest.par_chunks_mut(dims.width as usize)
                .enumerate()
                .for_each(|(j, row)| {
                    for (i, out) in row.iter_mut().enumerate() {
                        *out = pixel_value(i as u32, j as u32, dims, viewport);
                    }
                });
        });
        Ok(())
    }
}

fn build_thread_pool(threads: Option<usize>) -> FractaleResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FractaleError::validation(
            "threaded backend 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FractaleError::validation(format!("failed to build rayon thread pool: {e}")))
}
