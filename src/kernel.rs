//! Viewport mapping and the per-pixel escape-time formula.
//!
//! Every backend must reproduce these two functions exactly, including the `f32` operation order,
//! so that rasters stay comparable across backends. The WGSL program in `kernels/mandelbrot.wgsl`
//! mirrors them line for line.

use crate::foundation::core::{Dimensions, PlanePoint, Viewport};

/// Fixed number of recurrence steps applied to every pixel.
pub const ITERATIONS: u32 = 100_000;

/// Sample point of column `i`, row `j`: `top_left + (i·dx, j·dy)`.
#[inline]
pub fn sample_point(i: u32, j: u32, dims: Dimensions, viewport: &Viewport) -> PlanePoint {
    let (dx, dy) = viewport.step(dims);
    PlanePoint::new(
        viewport.top_left.re + i as f32 * dx,
        viewport.top_left.im + j as f32 * dy,
    )
}

/// Squared magnitude of `z` after [`ITERATIONS`] steps of `z = z² + c` from `z = 0`.
///
/// There is no escape test: divergent points keep iterating and end up as `+inf` or NaN.
#[inline]
pub fn escape_magnitude(c: PlanePoint) -> f32 {
    iterate(c, ITERATIONS)
}

#[inline]
pub(crate) fn iterate(c: PlanePoint, steps: u32) -> f32 {
    let mut z_re = 0.0f32;
    let mut z_im = 0.0f32;
    for _ in 0..steps {
        let re = z_re * z_re - z_im * z_im;
        z_im = 2.0 * z_re * z_im + c.im;
        z_re = re + c.re;
    }
    z_re * z_re + z_im * z_im
}

/// Kernel output for one pixel.
#[inline]
pub fn pixel_value(i: u32, j: u32, dims: Dimensions, viewport: &Viewport) -> f32 {
    escape_magnitude(sample_point(i, j, dims, viewport))
}
