use std::path::PathBuf;

use clap::Parser;
use glslens::ShaderCompiler;

use crate::config::OutputFormat;

/// Reads a GLSL version, a stage and the shader source from standard input
/// and prints the shader's live uniforms, one `name arraySize typeID` line
/// each.
#[derive(Parser, Debug)]
#[command(name = "glslens", author, version, about, long_about = None)]
pub struct Cli {
    /// Shader compiler backend: `builtin`, `naga` or `shaderc` (when built
    /// with it).
    #[arg(
        long,
        value_name = "COMPILER",
        env = "GLSLENS_COMPILER",
        value_parser = parse_shader_compiler
    )]
    pub compiler: Option<ShaderCompiler>,

    /// Output format: `plain` or `json`.
    #[arg(
        long,
        value_name = "FORMAT",
        env = "GLSLENS_FORMAT",
        value_parser = parse_output_format
    )]
    pub format: Option<OutputFormat>,

    /// Emit full reflection records (offsets, strides, blocks) in JSON output.
    #[arg(long)]
    pub detailed: bool,

    /// Report uniforms that no entry point references.
    #[arg(long)]
    pub all: bool,

    /// Configuration file (defaults to `config.toml` in the user config directory).
    #[arg(long, value_name = "FILE", env = "GLSLENS_CONFIG")]
    pub config: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_shader_compiler(value: &str) -> Result<ShaderCompiler, String> {
    value.parse()
}

pub fn parse_output_format(value: &str) -> Result<OutputFormat, String> {
    if value.trim().is_empty() {
        return Err("output format must not be empty".to_string());
    }
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "glslens",
            "--compiler",
            "naga",
            "--format",
            "json",
            "--detailed",
            "--all",
        ])
        .unwrap();
        assert_eq!(cli.compiler, Some(ShaderCompiler::NagaGlsl));
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.detailed);
        assert!(cli.all);
    }

    #[test]
    fn rejects_unknown_compiler() {
        assert!(Cli::try_parse_from(["glslens", "--compiler", "fxc"]).is_err());
        assert!(parse_output_format(" ").is_err());
    }
}
