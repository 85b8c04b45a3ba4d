use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    foundation::core::Raster,
    foundation::error::{FractaleError, FractaleResult},
    output::raster_to_gray8,
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> FractaleResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FractaleError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(FractaleError::validation("encode fps must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            // yuv420p subsamples chroma by two in both directions.
            return Err(FractaleError::validation(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }
}

pub fn default_mp4_config(
    out_path: impl Into<PathBuf>,
    width: u32,
    height: u32,
    fps: u32,
) -> EncodeConfig {
    EncodeConfig {
        width,
        height,
        fps,
        out_path: out_path.into(),
        overwrite: true,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn ensure_parent_dir(path: &Path) -> FractaleResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams grayscale rasters into a system `ffmpeg` process producing an H.264 MP4.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> FractaleResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(FractaleError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(FractaleError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "gray",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            FractaleError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FractaleError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn encode_frame(&mut self, raster: &Raster) -> FractaleResult<()> {
        if raster.width() != self.cfg.width || raster.height() != self.cfg.height {
            return Err(FractaleError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                raster.width(),
                raster.height(),
                self.cfg.width,
                self.cfg.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(FractaleError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&raster_to_gray8(raster)).map_err(|e| {
            FractaleError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    pub fn finish(mut self) -> FractaleResult<()> {
        drop(self.stdin.take());

        let output = self.child.wait_with_output().map_err(|e| {
            FractaleError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FractaleError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Dimensions;

    #[test]
    fn config_validation_catches_bad_values() {
        assert!(default_mp4_config("target/out.mp4", 0, 10, 20).validate().is_err());
        assert!(default_mp4_config("target/out.mp4", 11, 10, 20).validate().is_err());
        assert!(default_mp4_config("target/out.mp4", 10, 10, 0).validate().is_err());
        assert!(default_mp4_config("target/out.mp4", 1280, 720, 20).validate().is_ok());
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        if !is_ffmpeg_on_path() {
            return;
        }
        let dir = PathBuf::from("target").join("encode_ffmpeg");
        let mut enc =
            FfmpegEncoder::new(default_mp4_config(dir.join("mismatch.mp4"), 16, 8, 20)).unwrap();
        let frame = Raster::new(Dimensions::new(8, 8).unwrap()).unwrap();
        let err = enc.encode_frame(&frame).unwrap_err();
        assert!(matches!(err, FractaleError::Validation(_)));
    }
}
