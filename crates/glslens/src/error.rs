/// Coarse classification of a [`ReflectError`], used by callers that need to
/// map failures onto their own error model (exception classes, exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied a bad argument (version, stage, source).
    InvalidArgument,
    /// The compiler rejected the shader or could not reflect it.
    Compilation,
}

#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    #[error("Invalid version format: {0}")]
    InvalidVersion(String),
    /// Carries the version as the caller wrote it.
    #[error("Unsupported GLSL version: {0}")]
    UnsupportedVersion(String),
    #[error("Invalid stage format: '{0}' is neither a stage number nor a stage identifier")]
    InvalidStage(String),
    #[error("Invalid stage format: stage argument is out of enum range: {0}")]
    StageOutOfRange(i32),
    #[error("Empty shader source")]
    EmptySource,
    #[error("Failed to parse shader: {log}Shader: {shader}")]
    Parse { log: String, shader: String },
    #[error("Failed to link shader: {log}Shader: {shader}")]
    Link { log: String, shader: String },
    #[error("Failed to build reflection at shader: {log}Shader: {shader}")]
    Reflection { log: String, shader: String },
    #[error("shader compiler unavailable: {0}")]
    Backend(String),
}

impl ReflectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidVersion(_)
            | Self::UnsupportedVersion(_)
            | Self::InvalidStage(_)
            | Self::StageOutOfRange(_)
            | Self::EmptySource => ErrorKind::InvalidArgument,
            Self::Parse { .. } | Self::Link { .. } | Self::Reflection { .. } | Self::Backend(_) => {
                ErrorKind::Compilation
            }
        }
    }
}

/// Compiler logs usually end with a newline; make sure the `Shader:` suffix
/// starts on its own line either way.
pub(crate) fn terminated_log(log: impl Into<String>) -> String {
    let mut log = log.into();
    if !log.ends_with('\n') {
        log.push('\n');
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiler_failures_embed_log_and_source() {
        let err = ReflectError::Parse {
            log: terminated_log("ERROR: 0:1: 'foo' : undeclared identifier"),
            shader: "void main() { foo; }\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse shader: ERROR: 0:1: 'foo' : undeclared identifier\nShader: void main() { foo; }\n"
        );
        assert_eq!(err.kind(), ErrorKind::Compilation);
    }

    #[test]
    fn argument_errors_are_classified() {
        assert_eq!(
            ReflectError::UnsupportedVersion("99".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(ReflectError::EmptySource.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            ReflectError::StageOutOfRange(42).to_string(),
            "Invalid stage format: stage argument is out of enum range: 42"
        );
    }

    #[test]
    fn terminated_log_keeps_existing_newline() {
        assert_eq!(terminated_log("a\n"), "a\n");
        assert_eq!(terminated_log("a"), "a\n");
    }
}
