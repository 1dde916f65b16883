use crate::types::Characteristic;

/// All error types that can occur while tracking and controlling Sengled lights.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The vendor cloud rejected the credentials. Not retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The vendor cloud reported that the session is no longer valid.
    ///
    /// The [`crate::Gateway`] recovers from this once per request by logging
    /// in again; it only reaches callers when the retry expires as well.
    #[error("session expired")]
    SessionExpired,

    /// The vendor cloud answered a request with a non-success code.
    #[error("remote {action} failed with code {code}")]
    RemoteWrite { action: String, code: i32 },

    /// The device is no longer part of the remote roster.
    #[error("device {0} not found")]
    NotFound(String),

    /// A transport failure reported by the [`crate::DeviceApi`] implementation.
    #[error("transport error during {action}: {source}")]
    Transport {
        action: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A request did not complete within the configured request timeout.
    #[error("{action} timed out")]
    Timeout { action: String },

    /// The device does not expose the requested characteristic.
    #[error("unsupported characteristic {0}")]
    Unsupported(Characteristic),

    /// The device cannot run an automatic lighting schedule.
    #[error("device {0} cannot run an automatic lighting schedule")]
    ScheduleUnsupported(String),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A color temperature range whose coolest bound is not below its
    /// warmest.
    #[error("invalid color temperature range {min}..{max} mireds")]
    InvalidColorRange { min: u16, max: u16 },

    /// Failed to parse a [`crate::ByteRgb`] from a string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),
}

impl Error {
    /// Create a new remote write error
    pub fn remote_write(action: &str, code: i32) -> Self {
        Error::RemoteWrite {
            action: action.to_string(),
            code,
        }
    }

    /// Create a new transport error
    pub fn transport<E>(action: &str, err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport {
            action: action.to_string(),
            source: err.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(action: &str) -> Self {
        Error::Timeout {
            action: action.to_string(),
        }
    }

    /// Create a new not found error
    pub fn not_found(id: &str) -> Self {
        Error::NotFound(id.to_string())
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
