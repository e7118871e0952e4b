use std::fmt;

/// Convenience result type used across Cadence.
pub type CadenceResult<T> = Result<T, CadenceError>;

/// Encoder stage that produced an [`CadenceError::Encode`] failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeStage {
    /// Hardware/toolchain capability probing.
    Probe,
    /// Streaming into the recommended hardware encoder.
    Hardware,
    /// Streaming into the software encoder.
    Software,
    /// Combining the silent video with the audio track.
    Mux,
}

impl fmt::Display for EncodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Probe => "probe",
            Self::Hardware => "hardware",
            Self::Software => "software",
            Self::Mux => "mux",
        };
        f.write_str(s)
    }
}

/// Top-level error taxonomy used by the render core.
///
/// `MissingInput`, `Allocation` and `EncoderExhausted` are fatal for a render. `Encode` describes
/// a single failed stage and is usually healed by the adaptive encoder before it reaches a caller.
#[derive(thiserror::Error, Debug)]
pub enum CadenceError {
    /// Invalid user-provided configuration or input data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required external collaborator was not supplied.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// Frame buffers could not be reserved at the configured resolution.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// Errors while synthesizing a frame.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A single encoder stage failed.
    #[error("encode error ({stage}): {message}")]
    Encode {
        /// Stage that failed.
        stage: EncodeStage,
        /// Human-readable cause, usually including encoder stderr.
        message: String,
    },

    /// Both the hardware and the software encoder paths failed.
    #[error("no usable encoder: hardware: {}; software: {software}", hardware.as_deref().unwrap_or("not attempted"))]
    EncoderExhausted {
        /// Failure of the hardware attempt, if one was made.
        hardware: Option<String>,
        /// Failure of the software attempt.
        software: String,
    },

    /// The render was cancelled by the caller.
    #[error("render cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CadenceError {
    /// Build a [`CadenceError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CadenceError::MissingInput`] value.
    pub fn missing_input(msg: impl Into<String>) -> Self {
        Self::MissingInput(msg.into())
    }

    /// Build a [`CadenceError::Allocation`] value.
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Build a [`CadenceError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`CadenceError::Encode`] value.
    pub fn encode(stage: EncodeStage, msg: impl Into<String>) -> Self {
        Self::Encode {
            stage,
            message: msg.into(),
        }
    }

    /// Return `true` for errors that must abort the whole render.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingInput(_)
                | Self::Allocation(_)
                | Self::EncoderExhausted { .. }
                | Self::Cancelled
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
