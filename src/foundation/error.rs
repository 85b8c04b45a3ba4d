pub type FractaleResult<T> = Result<T, FractaleError>;

#[derive(thiserror::Error, Debug)]
pub enum FractaleError {
    /// Invalid caller input: dimensions, viewport, raster length, thread count.
    #[error("validation error: {0}")]
    Validation(String),

    /// The accelerator environment is unusable (adapter, device, kernel load or compile).
    #[error("device init error: {0}")]
    DeviceInit(String),

    /// A single accelerator draw failed; the context stays usable.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    #[error("config error: {0}")]
    Config(String),

    /// Video encoding through the external `ffmpeg` process failed.
    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FractaleError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn device_init(msg: impl Into<String>) -> Self {
        Self::DeviceInit(msg.into())
    }

    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self::Dispatch(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// `true` for per-call failures after which the same backend may be used again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Dispatch(_))
    }
}
