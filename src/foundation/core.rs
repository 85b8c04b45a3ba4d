use crate::foundation::error::{FractaleError, FractaleResult};

/// A point of the complex plane, `re + im·i`, in single precision.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlanePoint {
    pub re: f32,
    pub im: f32,
}

impl PlanePoint {
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

impl From<[f32; 2]> for PlanePoint {
    fn from([re, im]: [f32; 2]) -> Self {
        Self { re, im }
    }
}

/// Raster size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> FractaleResult<Self> {
        let dims = Self { width, height };
        dims.validate()?;
        Ok(dims)
    }

    /// Both sides positive and `width * height` addressable as a `u32` work-item index.
    pub fn validate(self) -> FractaleResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FractaleError::validation(format!(
                "raster dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if (self.width as u64) * (self.height as u64) > u32::MAX as u64 {
            return Err(FractaleError::validation(format!(
                "raster {}x{} has too many pixels",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major offset of column `i`, row `j`.
    pub fn offset(self, i: u32, j: u32) -> usize {
        j as usize * self.width as usize + i as usize
    }
}

/// Rectangle of the complex plane sampled by a raster.
///
/// Row 0 of the raster samples `top_left.im`, column 0 samples `top_left.re`. Nothing forces
/// `top_left.im > bottom_right.im`; a flipped viewport simply flips the image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    pub top_left: PlanePoint,
    pub bottom_right: PlanePoint,
}

impl Viewport {
    pub fn new(top_left: PlanePoint, bottom_right: PlanePoint) -> FractaleResult<Self> {
        let vp = Self {
            top_left,
            bottom_right,
        };
        vp.validate()?;
        Ok(vp)
    }

    /// Viewport of real-axis extent `width` centered on `center`, with the imaginary extent
    /// following the aspect ratio of `dims`.
    ///
    /// Row 0 samples the largest imaginary part, like every other [`Viewport`]. A bottom-left
    /// origin (row 0 at `center.im - height / 2`) would mirror the image vertically for any
    /// center off the real axis.
    pub fn centered(center: PlanePoint, width: f32, dims: Dimensions) -> FractaleResult<Self> {
        dims.validate()?;
        let height = width * dims.height as f32 / dims.width as f32;
        Self::new(
            PlanePoint::new(center.re - width / 2.0, center.im + height / 2.0),
            PlanePoint::new(center.re + width / 2.0, center.im - height / 2.0),
        )
    }

    pub fn validate(&self) -> FractaleResult<()> {
        if !self.top_left.is_finite() || !self.bottom_right.is_finite() {
            return Err(FractaleError::validation(
                "viewport corners must be finite",
            ));
        }
        if self.top_left.re == self.bottom_right.re || self.top_left.im == self.bottom_right.im {
            return Err(FractaleError::validation(format!(
                "viewport must have a non-zero extent on both axes, got {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Per-pixel step `(dx, dy)` for a raster of `dims`.
    pub fn step(&self, dims: Dimensions) -> (f32, f32) {
        (
            (self.bottom_right.re - self.top_left.re) / dims.width as f32,
            (self.bottom_right.im - self.top_left.im) / dims.height as f32,
        )
    }
}

/// Host-owned raster of squared magnitudes, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    pub dims: Dimensions,
    pub data: Vec<f32>,
}

impl Raster {
    /// Zero-filled raster of `dims`.
    pub fn new(dims: Dimensions) -> FractaleResult<Self> {
        dims.validate()?;
        Ok(Self {
            dims,
            data: vec![0.0; dims.pixel_count()],
        })
    }

    pub fn width(&self) -> u32 {
        self.dims.width
    }

    pub fn height(&self) -> u32 {
        self.dims.height
    }

    /// Value at column `i`, row `j`, or `None` outside the raster.
    pub fn get(&self, i: u32, j: u32) -> Option<f32> {
        if i >= self.dims.width || j >= self.dims.height {
            return None;
        }
        self.data.get(self.dims.offset(i, j)).copied()
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, f32> {
        self.data.chunks(self.dims.width as usize)
    }
}

/// Reject host buffers that do not hold exactly one value per pixel.
pub(crate) fn check_raster_len(dest: &[f32], dims: Dimensions) -> FractaleResult<()> {
    dims.validate()?;
    if dest.len() != dims.pixel_count() {
        return Err(FractaleError::validation(format!(
            "raster holds {} values but {}x{} needs {}",
            dest.len(),
            dims.width,
            dims.height,
            dims.pixel_count()
        )));
    }
    Ok(())
}
