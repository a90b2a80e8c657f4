use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glslens::ShaderCompiler;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How reflection results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `name arraySize typeID` line per uniform.
    #[default]
    Plain,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}'; expected plain or json")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub reflect: ReflectSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReflectSection {
    /// Compiler name, checked against the features compiled in.
    pub compiler: Option<String>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub format: OutputFormat,
    pub detailed: bool,
}

impl FileConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.compiler()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn compiler(&self) -> Result<Option<ShaderCompiler>, ConfigError> {
        self.reflect
            .compiler
            .as_deref()
            .map(|name| name.parse::<ShaderCompiler>().map_err(ConfigError::Invalid))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config.output.format, OutputFormat::Plain);
        assert!(!config.output.detailed);
        assert!(!config.reflect.include_inactive);
        assert_eq!(config.compiler().unwrap(), None);
    }

    #[test]
    fn parses_all_sections() {
        let config = FileConfig::from_toml_str(
            r#"
            [reflect]
            compiler = "naga"
            include_inactive = true

            [output]
            format = "json"
            detailed = true
            "#,
        )
        .unwrap();
        assert_eq!(config.compiler().unwrap(), Some(ShaderCompiler::NagaGlsl));
        assert!(config.reflect.include_inactive);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.detailed);
    }

    #[test]
    fn rejects_unknown_compiler() {
        let err = FileConfig::from_toml_str("[reflect]\ncompiler = \"fxc\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("fxc")));
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = FileConfig::from_toml_str("[output]\ncolour = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn parses_output_format_names() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
