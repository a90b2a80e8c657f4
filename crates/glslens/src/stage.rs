use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ReflectError;

/// Pipeline stage a shader is compiled for.
///
/// Discriminants match glslang's `EShLanguage`, which is also what the JNI
/// caller sends across the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    #[serde(rename = "vert")]
    Vertex = 0,
    #[serde(rename = "tesc")]
    TessControl = 1,
    #[serde(rename = "tese")]
    TessEvaluation = 2,
    #[serde(rename = "geom")]
    Geometry = 3,
    #[serde(rename = "frag")]
    Fragment = 4,
    #[serde(rename = "comp")]
    Compute = 5,
    #[serde(rename = "rgen")]
    RayGen = 6,
    #[serde(rename = "rint")]
    Intersect = 7,
    #[serde(rename = "rahit")]
    AnyHit = 8,
    #[serde(rename = "rchit")]
    ClosestHit = 9,
    #[serde(rename = "rmiss")]
    Miss = 10,
    #[serde(rename = "call")]
    Callable = 11,
    #[serde(rename = "task")]
    Task = 12,
    #[serde(rename = "mesh")]
    Mesh = 13,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 14] = [
        Self::Vertex,
        Self::TessControl,
        Self::TessEvaluation,
        Self::Geometry,
        Self::Fragment,
        Self::Compute,
        Self::RayGen,
        Self::Intersect,
        Self::AnyHit,
        Self::ClosestHit,
        Self::Miss,
        Self::Callable,
        Self::Task,
        Self::Mesh,
    ];

    /// Converts the raw enum value used by glslang and the bridge.
    pub fn from_raw(value: i32) -> Result<Self, ReflectError> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or(ReflectError::StageOutOfRange(value))
    }

    pub fn raw(self) -> i32 {
        self as i32
    }

    /// Maps the short identifiers used by glslangValidator file extensions
    /// (`vert`, `frag`, `rchit`, ...).
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        let stage = match identifier {
            "vert" => Self::Vertex,
            "tesc" => Self::TessControl,
            "tese" => Self::TessEvaluation,
            "geom" => Self::Geometry,
            "frag" => Self::Fragment,
            "comp" => Self::Compute,
            "rgen" => Self::RayGen,
            "rint" => Self::Intersect,
            "rahit" => Self::AnyHit,
            "rchit" => Self::ClosestHit,
            "rmiss" => Self::Miss,
            "call" => Self::Callable,
            "task" => Self::Task,
            "mesh" => Self::Mesh,
            _ => return None,
        };
        Some(stage)
    }

    pub fn identifier(self) -> &'static str {
        match self {
            Self::Vertex => "vert",
            Self::TessControl => "tesc",
            Self::TessEvaluation => "tese",
            Self::Geometry => "geom",
            Self::Fragment => "frag",
            Self::Compute => "comp",
            Self::RayGen => "rgen",
            Self::Intersect => "rint",
            Self::AnyHit => "rahit",
            Self::ClosestHit => "rchit",
            Self::Miss => "rmiss",
            Self::Callable => "call",
            Self::Task => "task",
            Self::Mesh => "mesh",
        }
    }

    /// Parses a stage line: either the numeric enum value or a short
    /// identifier.
    pub fn parse(value: &str) -> Result<Self, ReflectError> {
        let trimmed = value.trim();
        match trimmed.parse::<i32>() {
            Ok(raw) => Self::from_raw(raw),
            Err(_) => Self::from_identifier(&trimmed.to_ascii_lowercase())
                .ok_or_else(|| ReflectError::InvalidStage(trimmed.to_string())),
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vertex => "vertex",
            Self::TessControl => "tessellation control",
            Self::TessEvaluation => "tessellation evaluation",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
            Self::RayGen => "ray generation",
            Self::Intersect => "intersection",
            Self::AnyHit => "any-hit",
            Self::ClosestHit => "closest-hit",
            Self::Miss => "miss",
            Self::Callable => "callable",
            Self::Task => "task",
            Self::Mesh => "mesh",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_round_trip_through_all_stages() {
        for (index, stage) in ShaderStage::ALL.iter().enumerate() {
            assert_eq!(stage.raw(), index as i32);
            assert_eq!(ShaderStage::from_raw(index as i32).unwrap(), *stage);
            assert_eq!(ShaderStage::from_identifier(stage.identifier()), Some(*stage));
        }
    }

    #[test]
    fn rejects_values_outside_enum_range() {
        assert!(matches!(
            ShaderStage::from_raw(-1),
            Err(ReflectError::StageOutOfRange(-1))
        ));
        assert!(matches!(
            ShaderStage::from_raw(14),
            Err(ReflectError::StageOutOfRange(14))
        ));
    }

    #[test]
    fn parses_numbers_and_identifiers() {
        assert_eq!(ShaderStage::parse("4").unwrap(), ShaderStage::Fragment);
        assert_eq!(ShaderStage::parse(" 0 \r").unwrap(), ShaderStage::Vertex);
        assert_eq!(ShaderStage::parse("comp").unwrap(), ShaderStage::Compute);
        assert_eq!(ShaderStage::parse("RCHIT").unwrap(), ShaderStage::ClosestHit);
        assert!(matches!(
            ShaderStage::parse("pixel"),
            Err(ReflectError::InvalidStage(value)) if value == "pixel"
        ));
        assert!(ShaderStage::parse("").is_err());
    }

    #[test]
    fn serializes_as_identifiers() {
        for stage in ShaderStage::ALL {
            let json = serde_json::to_value(stage).unwrap();
            assert_eq!(json, stage.identifier());
            let back: ShaderStage = serde_json::from_value(json).unwrap();
            assert_eq!(back, stage);
        }
    }
}
