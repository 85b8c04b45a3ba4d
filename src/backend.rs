use crate::{
    foundation::core::{Dimensions, Raster, Viewport},
    foundation::error::FractaleResult,
    program::KernelSource,
};

/// Something that fills a host raster with kernel output for a viewport.
///
/// Every implementation must be substitutable: identical inputs give numerically equivalent
/// rasters. `Ok(())` means `dest` holds one squared magnitude per pixel, row-major. On `Err`
/// the contents of `dest` are undefined.
pub trait DrawBackend {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    fn draw(
        &mut self,
        dest: &mut [f32],
        dims: Dimensions,
        viewport: &Viewport,
    ) -> FractaleResult<()>;

    /// Allocate a raster and draw into it.
    fn render(&mut self, dims: Dimensions, viewport: &Viewport) -> FractaleResult<Raster> {
        let mut raster = Raster::new(dims)?;
        self.draw(&mut raster.data, dims, viewport)?;
        Ok(raster)
    }
}

/// Available backend kinds.
///
/// - `Sequential` and `Threaded` are always available.
/// - `Accelerator` requires the `gpu` feature and a compute-capable adapter.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sequential,
    Threaded,
    Accelerator,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Sequential => "sequential",
            BackendKind::Threaded => "threaded",
            BackendKind::Accelerator => "accelerator",
        }
    }
}

/// Adapter preference when several are present.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PowerPreference {
    #[default]
    HighPerformance,
    LowPower,
}

#[derive(Clone, Debug, Default)]
pub struct AcceleratorSettings {
    pub kernel: KernelSource,
    pub power: PowerPreference,
    /// Cap on the device buffer size requested at init; `None` takes the adapter's limit.
    /// Rasters whose `W·H·4` bytes exceed it fail per call with a recoverable error.
    pub max_buffer_bytes: Option<u64>,
}

/// Backend-agnostic settings.
#[derive(Clone, Debug, Default)]
pub struct BackendSettings {
    /// Worker count for [`BackendKind::Threaded`]; `None` lets rayon decide.
    pub threads: Option<usize>,
    pub accelerator: AcceleratorSettings,
}

/// Create a drawing backend.
///
/// For `Accelerator` this constructs a fresh device context, which is the expensive part; keep
/// the returned backend around for repeated draws.
pub fn create_backend(
    kind: BackendKind,
    settings: &BackendSettings,
) -> FractaleResult<Box<dyn DrawBackend>> {
    match kind {
        BackendKind::Sequential => Ok(Box::new(crate::backend_cpu::SequentialBackend::new())),
        BackendKind::Threaded => Ok(Box::new(crate::backend_cpu::ThreadedBackend::new(
            settings.threads,
        )?)),
        BackendKind::Accelerator => create_accelerator(settings),
    }
}

#[cfg(feature = "gpu")]
fn create_accelerator(settings: &BackendSettings) -> FractaleResult<Box<dyn DrawBackend>> {
    let ctx = crate::backend_wgpu::AcceleratorContext::new(&settings.accelerator)?;
    Ok(Box::new(crate::backend_wgpu::AcceleratorBackend::new(
        std::sync::Arc::new(ctx),
    )))
}

#[cfg(not(feature = "gpu"))]
fn create_accelerator(_settings: &BackendSettings) -> FractaleResult<Box<dyn DrawBackend>> {
    Err(crate::FractaleError::validation(
        "accelerator backend is not available (built without the `gpu` feature)",
    ))
}

/// One-shot draw: build the `kind` backend with default settings and fill `dest`.
#[tracing::instrument(skip(dest, viewport), fields(width = dims.width, height = dims.height))]
pub fn draw(
    kind: BackendKind,
    dest: &mut [f32],
    dims: Dimensions,
    viewport: &Viewport,
) -> FractaleResult<()> {
    let mut backend = create_backend(kind, &BackendSettings::default())?;
    backend.draw(dest, dims, viewport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::PlanePoint;
    use crate::foundation::error::FractaleError;

    #[test]
    fn default_kind_is_sequential() {
        assert_eq!(BackendKind::default(), BackendKind::Sequential);
        assert_eq!(BackendKind::default().as_str(), "sequential");
    }

    #[test]
    fn kinds_parse_from_lowercase_names() {
        let k: BackendKind = serde_json::from_str("\"accelerator\"").unwrap();
        assert_eq!(k, BackendKind::Accelerator);
        assert!(serde_json::from_str::<BackendKind>("\"gpu\"").is_err());
    }

    #[test]
    fn cpu_backends_report_their_names() {
        let s = BackendSettings::default();
        assert_eq!(
            create_backend(BackendKind::Sequential, &s).unwrap().name(),
            "sequential"
        );
        assert_eq!(
            create_backend(BackendKind::Threaded, &s).unwrap().name(),
            "threaded"
        );
    }

    #[cfg(not(feature = "gpu"))]
    #[test]
    fn accelerator_without_feature_is_an_error() {
        let err = create_backend(BackendKind::Accelerator, &BackendSettings::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn draw_rejects_mismatched_raster() {
        let dims = Dimensions::new(4, 4).unwrap();
        let vp = Viewport::new(PlanePoint::new(-1.0, 1.0), PlanePoint::new(1.0, -1.0)).unwrap();
        let mut short = vec![0.0f32; 15];
        let err = draw(BackendKind::Sequential, &mut short, dims, &vp).unwrap_err();
        assert!(matches!(err, FractaleError::Validation(_)));
    }
}
