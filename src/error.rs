use crate::status;

pub type WgResult<T> = Result<T, WgError>;

#[derive(thiserror::Error, Debug)]
pub enum WgError {
    /// A backend primitive reported a non-success status.
    #[error("{primitive}() {code} {}", status::describe_or_default(*.code))]
    Accel {
        primitive: &'static str,
        code: i32,
        detail: Option<String>,
    },

    /// Program compilation failed; `log` holds the full compiler output.
    #[error("compile_program() {code} {}", status::describe_or_default(*.code))]
    Build { code: i32, log: String },

    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("pixel layout error: {0}")]
    Layout(String),

    #[error("image kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("image dimension mismatch: {left:?} vs {right:?}")]
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },

    #[error("convolution kernel error: {0}")]
    Kernel(String),
}

impl WgError {
    pub fn accel(primitive: &'static str, code: i32) -> Self {
        Self::Accel {
            primitive,
            code,
            detail: None,
        }
    }

    pub fn accel_with_detail(primitive: &'static str, code: i32, detail: impl Into<String>) -> Self {
        Self::Accel {
            primitive,
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn kernel(msg: impl Into<String>) -> Self {
        Self::Kernel(msg.into())
    }

    /// Status code carried by backend failures.
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Accel { code, .. } | Self::Build { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Backend diagnostic text: the compiler log for build failures, the
    /// wgpu error description for other backend failures.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Accel { detail, .. } => detail.as_deref(),
            Self::Build { log, .. } => Some(log),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accel_display_names_primitive_code_and_description() {
        let err = WgError::accel("allocate_buffer", status::INVALID_BUFFER_SIZE);
        assert_eq!(err.to_string(), "allocate_buffer() -61 invalid buffer size");
        assert_eq!(err.code(), Some(status::INVALID_BUFFER_SIZE));
    }

    #[test]
    fn unknown_code_degrades_to_no_description() {
        let err = WgError::accel("enqueue_kernel", -1234);
        assert!(err.to_string().ends_with(status::NO_DESCRIPTION));
    }

    #[test]
    fn build_error_keeps_log() {
        let err = WgError::Build {
            code: status::BUILD_PROGRAM_FAILURE,
            log: "error: expected ';'".into(),
        };
        assert!(err.to_string().contains("build program failure"));
        assert_eq!(err.diagnostics(), Some("error: expected ';'"));
    }

    #[test]
    fn non_backend_errors_have_no_code() {
        assert_eq!(WgError::layout("x").code(), None);
        assert!(WgError::kernel("x").to_string().contains("convolution kernel error:"));
    }
}
