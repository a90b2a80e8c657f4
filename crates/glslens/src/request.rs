use crate::error::ReflectError;
use crate::stage::ShaderStage;
use crate::version::GlslVersion;

/// Validated input for a single reflection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectRequest {
    source: String,
    version: GlslVersion,
    stage: ShaderStage,
}

impl ReflectRequest {
    pub fn new(
        source: impl Into<String>,
        version: GlslVersion,
        stage: ShaderStage,
    ) -> Result<Self, ReflectError> {
        let source = source.into();
        if source.is_empty() {
            return Err(ReflectError::EmptySource);
        }
        Ok(Self {
            source,
            version,
            stage,
        })
    }

    /// Validates the raw integers received from the bridge. The stage is
    /// checked before the version.
    pub fn from_raw(
        source: impl Into<String>,
        version: i32,
        stage: i32,
    ) -> Result<Self, ReflectError> {
        let stage = ShaderStage::from_raw(stage)?;
        let version = GlslVersion::new(version)?;
        Self::new(source, version, stage)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn version(&self) -> GlslVersion {
        self.version
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_source() {
        let version = GlslVersion::new(450).unwrap();
        assert!(matches!(
            ReflectRequest::new("", version, ShaderStage::Vertex),
            Err(ReflectError::EmptySource)
        ));
    }

    #[test]
    fn raw_stage_is_validated_before_version() {
        assert!(matches!(
            ReflectRequest::from_raw("void main() {}", 10, 99),
            Err(ReflectError::StageOutOfRange(99))
        ));
        assert!(matches!(
            ReflectRequest::from_raw("void main() {}", 10, 4),
            Err(ReflectError::UnsupportedVersion(ref text)) if text == "10"
        ));
    }

    #[test]
    fn keeps_validated_fields() {
        let request = ReflectRequest::from_raw("void main() {}\n", 330, 4).unwrap();
        assert_eq!(request.source(), "void main() {}\n");
        assert_eq!(request.version().get(), 330);
        assert_eq!(request.stage(), ShaderStage::Fragment);
    }
}
