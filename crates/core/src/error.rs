// Error handling for the player bridge

use crate::surface::ViewId;
use std::fmt;

/// Bridge error types
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The engine runtime could not be brought up (distinct from pipeline startup)
    EngineRuntime(String),

    /// Command ordinal not present in the command table
    InvalidCommand(i32),

    /// Command argument missing or of the wrong type
    InvalidArgument(String),

    /// No view registered under this id
    UnknownView(ViewId),

    /// Invalid pointer or string at a binding boundary
    Ffi(String),

    /// JNI error (Android-specific)
    #[cfg(target_os = "android")]
    Jni(String),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BridgeError::EngineRuntime(msg) => write!(f, "Engine runtime error: {}", msg),
            BridgeError::InvalidCommand(ordinal) => write!(f, "Invalid command ordinal: {}", ordinal),
            BridgeError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            BridgeError::UnknownView(id) => write!(f, "Unknown view: {}", id),
            BridgeError::Ffi(msg) => write!(f, "FFI error: {}", msg),
            #[cfg(target_os = "android")]
            BridgeError::Jni(msg) => write!(f, "JNI error: {}", msg),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<std::str::Utf8Error> for BridgeError {
    fn from(err: std::str::Utf8Error) -> Self {
        BridgeError::Ffi(err.to_string())
    }
}

#[cfg(target_os = "android")]
impl From<jni::errors::Error> for BridgeError {
    fn from(err: jni::errors::Error) -> Self {
        BridgeError::Jni(err.to_string())
    }
}
