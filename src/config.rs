//! JSON job files: what to draw, with which backend, and where the result goes.

use std::path::{Path, PathBuf};

use crate::{
    backend::{AcceleratorSettings, BackendKind, BackendSettings, PowerPreference},
    foundation::core::{Dimensions, PlanePoint, Viewport},
    foundation::error::{FractaleError, FractaleResult},
    program::KernelSource,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub width: u32,
    pub height: u32,
    pub viewport: ViewportSpec,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub threads: Option<usize>,
    /// WGSL file replacing the embedded kernel program.
    #[serde(default)]
    pub kernel_path: Option<PathBuf>,
    #[serde(default)]
    pub power: PowerPreference,
    #[serde(default)]
    pub output: OutputSpec,
}

/// Either explicit corners or a center plus real-axis width.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ViewportSpec {
    Corners {
        top_left: [f32; 2],
        bottom_right: [f32; 2],
    },
    Centered {
        center: [f32; 2],
        scale: f32,
    },
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputSpec {
    #[default]
    Ascii,
    Png {
        path: PathBuf,
    },
}

impl JobConfig {
    pub fn from_json_str(s: &str) -> FractaleResult<Self> {
        let job: JobConfig = serde_json::from_str(s)
            .map_err(|e| FractaleError::config(format!("parse job JSON: {e}")))?;
        job.validate()?;
        Ok(job)
    }

    pub fn from_path(path: &Path) -> FractaleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FractaleError::config(format!("read job '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> FractaleResult<()> {
        if let ViewportSpec::Centered { scale, .. } = self.viewport
            && !(scale.is_finite() && scale > 0.0)
        {
            return Err(FractaleError::config("viewport 'scale' must be positive"));
        }
        if self.threads == Some(0) {
            return Err(FractaleError::config("'threads' must be >= 1 when set"));
        }
        let dims = self.dimensions()?;
        self.viewport(dims)?;
        Ok(())
    }

    pub fn dimensions(&self) -> FractaleResult<Dimensions> {
        Dimensions::new(self.width, self.height)
    }

    pub fn viewport(&self, dims: Dimensions) -> FractaleResult<Viewport> {
        match self.viewport {
            ViewportSpec::Corners {
                top_left,
                bottom_right,
            } => Viewport::new(top_left.into(), bottom_right.into()),
            ViewportSpec::Centered { center, scale } => {
                Viewport::centered(PlanePoint::from(center), scale, dims)
            }
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            threads: self.threads,
            accelerator: AcceleratorSettings {
                kernel: match &self.kernel_path {
                    Some(p) => KernelSource::File(p.clone()),
                    None => KernelSource::Embedded,
                },
                power: self.power,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_job_uses_defaults() {
        let job = JobConfig::from_json_str(
            r#"{ "width": 192, "height": 64,
                 "viewport": { "top_left": [-2.0, 1.0], "bottom_right": [2.0, -1.0] } }"#,
        )
        .unwrap();
        assert_eq!(job.backend, BackendKind::Sequential);
        assert_eq!(job.output, OutputSpec::Ascii);
        assert_eq!(job.power, PowerPreference::HighPerformance);
        let dims = job.dimensions().unwrap();
        let vp = job.viewport(dims).unwrap();
        assert_eq!(vp.top_left, PlanePoint::new(-2.0, 1.0));
        assert_eq!(
            job.backend_settings().accelerator.kernel,
            KernelSource::Embedded
        );
    }

    #[test]
    fn centered_viewport_and_png_output() {
        let job = JobConfig::from_json_str(
            r#"{ "width": 100, "height": 50,
                 "viewport": { "center": [0.0, 0.0], "scale": 4.0 },
                 "backend": "threaded", "threads": 2,
                 "kernel_path": "custom.wgsl",
                 "output": { "kind": "png", "path": "out.png" } }"#,
        )
        .unwrap();
        let vp = job.viewport(job.dimensions().unwrap()).unwrap();
        assert_eq!(vp.top_left, PlanePoint::new(-2.0, 1.0));
        assert_eq!(vp.bottom_right, PlanePoint::new(2.0, -1.0));
        assert_eq!(
            job.output,
            OutputSpec::Png {
                path: PathBuf::from("out.png")
            }
        );
        let settings = job.backend_settings();
        assert_eq!(settings.threads, Some(2));
        assert_eq!(
            settings.accelerator.kernel,
            KernelSource::File(PathBuf::from("custom.wgsl"))
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = JobConfig::from_json_str(
            r#"{ "width": 8, "height": 8, "iterations": 10,
                 "viewport": { "center": [0.0, 0.0], "scale": 1.0 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("config error:"));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        assert!(
            JobConfig::from_json_str(
                r#"{ "width": 0, "height": 8,
                     "viewport": { "center": [0.0, 0.0], "scale": 1.0 } }"#
            )
            .is_err()
        );
        assert!(
            JobConfig::from_json_str(
                r#"{ "width": 8, "height": 8,
                     "viewport": { "center": [0.0, 0.0], "scale": 0.0 } }"#
            )
            .is_err()
        );
        assert!(
            JobConfig::from_json_str(
                r#"{ "width": 8, "height": 8,
                     "viewport": { "top_left": [1.0, 1.0], "bottom_right": [1.0, -1.0] } }"#
            )
            .is_err()
        );
    }
}
