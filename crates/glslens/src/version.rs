use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReflectError;

/// Oldest `#version` accepted (GLSL ES 1.00).
pub const MIN_GLSL_VERSION: i32 = 100;
/// Newest `#version` accepted (GLSL 4.60).
pub const MAX_GLSL_VERSION: i32 = 460;

/// A validated GLSL version number, used as the default version when the
/// source carries no `#version` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct GlslVersion(i32);

impl GlslVersion {
    pub fn new(value: i32) -> Result<Self, ReflectError> {
        if !Self::in_range(value) {
            return Err(ReflectError::UnsupportedVersion(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Parses a version line. Out-of-range errors echo `value` unchanged.
    pub fn parse(value: &str) -> Result<Self, ReflectError> {
        let raw = value
            .trim()
            .parse::<i32>()
            .map_err(|err| ReflectError::InvalidVersion(err.to_string()))?;
        if !Self::in_range(raw) {
            return Err(ReflectError::UnsupportedVersion(value.to_string()));
        }
        Ok(Self(raw))
    }

    fn in_range(value: i32) -> bool {
        (MIN_GLSL_VERSION..=MAX_GLSL_VERSION).contains(&value)
    }

    pub fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for GlslVersion {
    type Error = ReflectError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GlslVersion> for i32 {
    fn from(version: GlslVersion) -> Self {
        version.0
    }
}

impl fmt::Display for GlslVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_inclusive_bounds() {
        assert_eq!(GlslVersion::new(100).unwrap().get(), 100);
        assert_eq!(GlslVersion::new(460).unwrap().get(), 460);
        assert_eq!(GlslVersion::parse(" 330\n").unwrap().get(), 330);
    }

    #[test]
    fn rejects_out_of_range_versions() {
        assert!(matches!(
            GlslVersion::new(99),
            Err(ReflectError::UnsupportedVersion(ref text)) if text == "99"
        ));
        assert!(matches!(
            GlslVersion::parse("470"),
            Err(ReflectError::UnsupportedVersion(ref text)) if text == "470"
        ));
    }

    #[test]
    fn unsupported_version_echoes_input_text() {
        let err = GlslVersion::parse(" 0470").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported GLSL version:  0470");
    }

    #[test]
    fn rejects_non_numeric_versions() {
        let err = GlslVersion::parse("450 core").unwrap_err();
        assert!(matches!(err, ReflectError::InvalidVersion(_)));
        assert!(err.to_string().starts_with("Invalid version format: "));
    }
}
