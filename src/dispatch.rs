//! Host-side description of one accelerator dispatch: the parameter block and the grid shape.

use crate::{
    foundation::core::{Dimensions, Viewport},
    foundation::error::{FractaleError, FractaleResult},
    kernel::ITERATIONS,
};

/// Invocations per work-group; must match `@workgroup_size` in the WGSL program.
pub const WORKGROUP_SIZE: u32 = 64;

/// Uniform block bound at binding 1. Field order is the kernel's argument order.
///
/// `size` feeds the per-pixel step in `f32`, exactly like the CPU mapping. `width` and `height`
/// carry the exact integer dimensions for index arithmetic; `f32` loses integers above 2^24.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "gpu", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct KernelParams {
    pub p1: [f32; 2],
    pub p2: [f32; 2],
    pub size: [f32; 2],
    pub iterations: u32,
    pub total: u32,
    pub width: u32,
    pub height: u32,
    /// Pads the block to a multiple of 16 bytes for uniform layout.
    pub _pad: [u32; 2],
}

impl KernelParams {
    pub fn new(dims: Dimensions, viewport: &Viewport) -> Self {
        Self {
            p1: [viewport.top_left.re, viewport.top_left.im],
            p2: [viewport.bottom_right.re, viewport.bottom_right.im],
            size: [dims.width as f32, dims.height as f32],
            iterations: ITERATIONS,
            total: dims.width * dims.height,
            width: dims.width,
            height: dims.height,
            _pad: [0; 2],
        }
    }
}

/// Work-group counts for `dispatch_workgroups(x, y, 1)`.
///
/// `W·H` need not be a multiple of [`WORKGROUP_SIZE`]: the grid is rounded up and the kernel
/// discards invocations past the last pixel. Grids wider than the per-dimension limit are folded
/// into rows of `x` groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchGrid {
    pub x: u32,
    pub y: u32,
}

impl DispatchGrid {
    pub fn plan(total: u32, max_per_dimension: u32) -> FractaleResult<Self> {
        if total == 0 {
            return Err(FractaleError::validation("dispatch needs at least one pixel"));
        }
        if max_per_dimension == 0 {
            return Err(FractaleError::dispatch(
                "device reports no compute work-groups per dimension",
            ));
        }
        let groups = total.div_ceil(WORKGROUP_SIZE);
        if groups <= max_per_dimension {
            return Ok(Self { x: groups, y: 1 });
        }
        let y = groups.div_ceil(max_per_dimension);
        if y > max_per_dimension {
            return Err(FractaleError::dispatch(format!(
                "{total} work-items exceed the device dispatch limit"
            )));
        }
        Ok(Self {
            x: max_per_dimension,
            y,
        })
    }

    /// Invocations launched, including the padding tail.
    pub fn invocations(self) -> u64 {
        self.x as u64 * self.y as u64 * WORKGROUP_SIZE as u64
    }
}
