use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use glslens::process::ProcessGuard;
use glslens::{
    GlslVersion, ObjectReflection, ReflectOptions, ReflectRequest, ShaderCompiler, ShaderProgram,
    ShaderStage,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{FileConfig, OutputFormat};
use crate::input::read_stream_arguments;
use crate::paths;

/// Effective settings after merging CLI flags over the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub compiler: ShaderCompiler,
    pub options: ReflectOptions,
    pub format: OutputFormat,
    pub detailed: bool,
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;
    tracing::debug!(?settings, "resolved glslens settings");

    let _process = ProcessGuard::acquire();

    let stdin = io::stdin();
    let args = read_stream_arguments(stdin.lock())?;
    let stage = ShaderStage::parse(&args.stage)?;
    let version = GlslVersion::parse(&args.version)?;
    let request = ReflectRequest::new(args.source, version, stage)?;

    let program = ShaderProgram::build(&request, settings.compiler, settings.options)?;
    tracing::info!(
        uniforms = program.live_uniforms_count(),
        %stage,
        %version,
        "reflected shader"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, &program, settings.format, settings.detailed)
        .context("failed to write reflection output")?;
    Ok(())
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let config_path: Option<PathBuf> = cli.config.clone().or_else(paths::default_config_file);
    let file = match &config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            FileConfig::load(path)
                .with_context(|| format!("invalid configuration file {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    Ok(merge_settings(cli, &file)?)
}

fn merge_settings(cli: &Cli, file: &FileConfig) -> Result<Settings, crate::config::ConfigError> {
    let compiler = match cli.compiler {
        Some(compiler) => compiler,
        None => file.compiler()?.unwrap_or_default(),
    };
    Ok(Settings {
        compiler,
        options: ReflectOptions {
            include_inactive: cli.all || file.reflect.include_inactive,
        },
        format: cli.format.unwrap_or(file.output.format),
        detailed: cli.detailed || file.output.detailed,
    })
}

#[derive(Serialize)]
struct DetailedReport<'a> {
    uniforms: &'a [ObjectReflection],
    blocks: &'a [ObjectReflection],
}

pub fn write_report<W: Write>(
    out: &mut W,
    program: &ShaderProgram,
    format: OutputFormat,
    detailed: bool,
) -> io::Result<()> {
    match format {
        OutputFormat::Plain => {
            for info in program.uniform_infos() {
                writeln!(out, "{} {} {}", info.name, info.array_size, info.type_id)?;
            }
        }
        OutputFormat::Json if detailed => {
            let report = DetailedReport {
                uniforms: program.uniforms(),
                blocks: program.uniform_blocks(),
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &program.uniform_infos())?;
            writeln!(out)?;
        }
    }
    out.flush()
}
