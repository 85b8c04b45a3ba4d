//! The accelerator kernel program: where its source comes from and how it is loaded.

use std::{io::Read as _, path::PathBuf};

use crate::foundation::error::{FractaleError, FractaleResult};

/// Upper bound on kernel source size read from disk.
pub const MAX_KERNEL_SOURCE_BYTES: usize = 65536;

/// Name of the compute entry point inside the program.
pub const ENTRY_POINT: &str = "mandelbrot";

/// WGSL program compiled into the crate.
pub const EMBEDDED_WGSL: &str = include_str!("kernels/mandelbrot.wgsl");

/// Where the accelerator reads its WGSL program from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum KernelSource {
    #[default]
    Embedded,
    File(PathBuf),
}

impl KernelSource {
    /// Load the program text. File reads stop at [`MAX_KERNEL_SOURCE_BYTES`]; a file that does
    /// not fit is rejected instead of being compiled truncated.
    pub fn load(&self) -> FractaleResult<String> {
        match self {
            KernelSource::Embedded => Ok(EMBEDDED_WGSL.to_string()),
            KernelSource::File(path) => {
                let f = std::fs::File::open(path).map_err(|e| {
                    FractaleError::device_init(format!(
                        "failed to load kernel '{}': {e}",
                        path.display()
                    ))
                })?;
                let mut bytes = Vec::new();
                f.take(MAX_KERNEL_SOURCE_BYTES as u64 + 1)
                    .read_to_end(&mut bytes)
                    .map_err(|e| {
                        FractaleError::device_init(format!(
                            "failed to read kernel '{}': {e}",
                            path.display()
                        ))
                    })?;
                if bytes.len() > MAX_KERNEL_SOURCE_BYTES {
                    return Err(FractaleError::device_init(format!(
                        "kernel '{}' exceeds {MAX_KERNEL_SOURCE_BYTES} bytes",
                        path.display()
                    )));
                }
                String::from_utf8(bytes).map_err(|_| {
                    FractaleError::device_init(format!(
                        "kernel '{}' is not valid UTF-8",
                        path.display()
                    ))
                })
            }
        }
    }
}
