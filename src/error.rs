//! Error handling for the frameflow pipeline
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate.

use thiserror::Error;

/// Main error type for frameflow operations
#[derive(Error, Debug)]
pub enum FrameFlowError {
    /// A worker was asked to start before `create()` was called
    #[error("Worker '{0}' is not initialized")]
    NotInitialized(String),

    /// The payload-population collaborator failed for one frame
    #[error("Payload population failed for frame {frame_id}: {message}")]
    Payload { frame_id: u32, message: String },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FrameFlowError>,
    },
}

impl FrameFlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FrameFlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for frameflow operations
pub type Result<T> = std::result::Result<T, FrameFlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
