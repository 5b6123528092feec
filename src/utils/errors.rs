use thiserror::Error;

/// Error kinds a caller above the event loop might want to distinguish.
/// Calloop callbacks and smithay delegate impls do not propagate these —
/// they log and continue, per the propagation policy; these are used by
/// fallible setup/config code that still runs under `?`.
#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("failed to read config file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("too many keybindings: {count} exceeds the limit of {limit}")]
    TooManyKeybindings { count: usize, limit: usize },

    #[error("macro has {count} steps, exceeding the limit of {limit}")]
    MacroTooLong { count: usize, limit: usize },

    #[error("invalid tiling context: {0}")]
    InvalidTilingContext(&'static str),

    #[error("unknown workspace index {0}")]
    UnknownWorkspace(usize),
}

pub type Result<T> = std::result::Result<T, CompositorError>;
