use std::fmt;
use std::str::FromStr;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use serde::{Deserialize, Serialize};

use crate::error::{terminated_log, ReflectError};
use crate::glsl::{self, Diagnostic};
use crate::reflect::{self, ObjectReflection, ReflectFailure, UniformInfo};
use crate::request::ReflectRequest;
use crate::source::PreparedSource;
use crate::stage::ShaderStage;
use crate::version::GlslVersion;

/// Shader compilation backend requested by the caller.
///
/// Reflection always comes from the built-in front end. The other backends
/// compile and validate the shader first, so their diagnostics are the ones
/// the caller sees for invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShaderCompiler {
    /// Built-in front end only.
    #[serde(rename = "builtin")]
    Builtin,
    /// Validate with glslang through shaderc.
    #[serde(rename = "shaderc")]
    Shaderc,
    /// Validate with naga's GLSL frontend, which covers desktop GLSL 440 to
    /// 460 for vertex, fragment and compute shaders.
    #[serde(rename = "naga", alias = "naga-glsl")]
    NagaGlsl,
}

impl Default for ShaderCompiler {
    fn default() -> Self {
        if cfg!(feature = "shaderc") {
            ShaderCompiler::Shaderc
        } else {
            ShaderCompiler::Builtin
        }
    }
}

impl fmt::Display for ShaderCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderCompiler::Builtin => f.write_str("builtin"),
            ShaderCompiler::Shaderc => f.write_str("shaderc"),
            ShaderCompiler::NagaGlsl => f.write_str("naga"),
        }
    }
}

impl FromStr for ShaderCompiler {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("shader compiler must not be empty".to_string());
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "builtin" => Ok(ShaderCompiler::Builtin),
            "shaderc" | "glslang" => {
                if cfg!(feature = "shaderc") {
                    Ok(ShaderCompiler::Shaderc)
                } else {
                    Err("shaderc support is not enabled in this build".to_string())
                }
            }
            "naga" | "naga-glsl" => Ok(ShaderCompiler::NagaGlsl),
            other => Err(format!(
                "unknown shader compiler '{other}' (expected builtin, shaderc or naga)"
            )),
        }
    }
}

/// Knobs for the reflection step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReflectOptions {
    /// Report uniforms no entry point references.
    pub include_inactive: bool,
}

/// A compiled, linked and reflected shader.
///
/// Reflection happens eagerly in [`ShaderProgram::build`]; the program only
/// keeps the records, not the compiler's intermediate representation.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    stage: ShaderStage,
    version: GlslVersion,
    compiler: ShaderCompiler,
    uniforms: Vec<ObjectReflection>,
    blocks: Vec<ObjectReflection>,
}

impl ShaderProgram {
    /// Runs the validate → parse → link → reflect pipeline for `request`.
    pub fn build(
        request: &ReflectRequest,
        compiler: ShaderCompiler,
        options: ReflectOptions,
    ) -> Result<Self, ReflectError> {
        let _span = tracing::debug_span!(
            "shader_program",
            stage = %request.stage(),
            version = %request.version(),
            %compiler
        )
        .entered();

        let source = PreparedSource::new(request.source(), request.version());
        let validated = match compiler {
            ShaderCompiler::Builtin => false,
            ShaderCompiler::NagaGlsl => validate_naga(request, &source)?,
            ShaderCompiler::Shaderc => validate_shaderc(request, &source)?,
        };

        let unit = glsl::parse(&source).map_err(|diagnostic| {
            if validated {
                // The backend accepted it, so this is a front-end limitation.
                ReflectError::Reflection {
                    log: terminated_log(diagnostic.log()),
                    shader: request.source().to_string(),
                }
            } else {
                parse_error(request, &diagnostic)
            }
        })?;
        tracing::debug!(declarations = unit.decls.len(), "shader parsed");

        let reflection =
            reflect::reflect(&unit, options.include_inactive).map_err(|failure| match failure {
                ReflectFailure::Compile(diagnostic) => parse_error(request, &diagnostic),
                ReflectFailure::MissingEntryPoint => ReflectError::Link {
                    log: format!(
                        "ERROR: Linking {} stage: Missing entry point: Each stage requires one entry point\n",
                        request.stage().identifier()
                    ),
                    shader: request.source().to_string(),
                },
            })?;
        tracing::debug!(
            uniforms = reflection.uniforms.len(),
            blocks = reflection.blocks.len(),
            "reflection built"
        );

        Ok(Self {
            stage: request.stage(),
            version: request.version(),
            compiler,
            uniforms: reflection.uniforms,
            blocks: reflection.blocks,
        })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn version(&self) -> GlslVersion {
        self.version
    }

    pub fn compiler(&self) -> ShaderCompiler {
        self.compiler
    }

    pub fn live_uniforms_count(&self) -> usize {
        self.uniforms.len()
    }

    pub fn uniform(&self, index: usize) -> Option<&ObjectReflection> {
        self.uniforms.get(index)
    }

    pub fn uniforms(&self) -> &[ObjectReflection] {
        &self.uniforms
    }

    pub fn uniform_blocks(&self) -> &[ObjectReflection] {
        &self.blocks
    }

    pub fn uniform_infos(&self) -> Vec<UniformInfo> {
        self.uniforms.iter().map(UniformInfo::from).collect()
    }
}

fn parse_error(request: &ReflectRequest, diagnostic: &Diagnostic) -> ReflectError {
    ReflectError::Parse {
        log: terminated_log(diagnostic.log()),
        shader: request.source().to_string(),
    }
}

fn naga_stage(stage: ShaderStage) -> Option<naga::ShaderStage> {
    match stage {
        ShaderStage::Vertex => Some(naga::ShaderStage::Vertex),
        ShaderStage::Fragment => Some(naga::ShaderStage::Fragment),
        ShaderStage::Compute => Some(naga::ShaderStage::Compute),
        _ => None,
    }
}

/// Compiles and validates with naga. Returns `false` when naga cannot handle
/// the language version or stage and validation was skipped.
fn validate_naga(
    request: &ReflectRequest,
    source: &PreparedSource<'_>,
) -> Result<bool, ReflectError> {
    let directive = source.directive();
    let stage = match naga_stage(request.stage()) {
        Some(stage) if directive.naga_supported() => stage,
        _ => {
            tracing::warn!(
                stage = %request.stage(),
                version = directive.number,
                "naga cannot compile this shader, skipping validation"
            );
            return Ok(false);
        }
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage);
    let module = frontend
        .parse(&options, source.text())
        .map_err(|errors| ReflectError::Parse {
            log: terminated_log(errors.emit_to_string(&source.display_text())),
            shader: request.source().to_string(),
        })?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| ReflectError::Link {
            log: terminated_log(err.emit_to_string(&source.display_text())),
            shader: request.source().to_string(),
        })?;
    tracing::debug!(
        globals = module.global_variables.len(),
        entry_points = module.entry_points.len(),
        "naga validated shader"
    );
    Ok(true)
}

/// Ray tracing, task and mesh shaders only exist in the Vulkan environment.
#[cfg_attr(not(feature = "shaderc"), allow(dead_code))]
fn needs_vulkan(stage: ShaderStage) -> bool {
    !matches!(
        stage,
        ShaderStage::Vertex
            | ShaderStage::TessControl
            | ShaderStage::TessEvaluation
            | ShaderStage::Geometry
            | ShaderStage::Fragment
            | ShaderStage::Compute
    )
}

/// Compiles with glslang. Returns `false` when glslang cannot target SPIR-V
/// from this language version and validation was skipped.
#[cfg(feature = "shaderc")]
fn validate_shaderc(
    request: &ReflectRequest,
    source: &PreparedSource<'_>,
) -> Result<bool, ReflectError> {
    let directive = source.directive();
    let vulkan = needs_vulkan(request.stage());
    if !directive.spirv_capable(vulkan) {
        tracing::warn!(
            stage = %request.stage(),
            version = directive.number,
            "glslang cannot target SPIR-V from this version, skipping validation"
        );
        return Ok(false);
    }

    let compiler = shaderc::Compiler::new()
        .map_err(|err| ReflectError::Backend(format!("failed to initialise shaderc: {err}")))?;
    let mut options = shaderc::CompileOptions::new()
        .map_err(|err| ReflectError::Backend(format!("failed to create shaderc options: {err}")))?;
    options.set_source_language(shaderc::SourceLanguage::GLSL);
    options.set_auto_bind_uniforms(true);
    options.set_auto_map_locations(true);
    if vulkan {
        options.set_target_env(
            shaderc::TargetEnv::Vulkan,
            shaderc::EnvVersion::Vulkan1_2 as u32,
        );
        options.set_target_spirv(shaderc::SpirvVersion::V1_4);
    } else {
        options.set_target_env(
            shaderc::TargetEnv::OpenGL,
            shaderc::EnvVersion::OpenGL4_5 as u32,
        );
    }

    let artifact = compiler
        .compile_into_spirv(
            source.text(),
            shaderc_kind(request.stage()),
            "glslens.glsl",
            "main",
            Some(&options),
        )
        .map_err(|err| {
            let log = match err {
                shaderc::Error::CompilationError(_, log) => log,
                other => other.to_string(),
            };
            ReflectError::Parse {
                log: terminated_log(log),
                shader: request.source().to_string(),
            }
        })?;
    if artifact.get_num_warnings() > 0 {
        tracing::warn!(warnings = %artifact.get_warning_messages(), "shaderc reported warnings");
    }
    Ok(true)
}

#[cfg(not(feature = "shaderc"))]
fn validate_shaderc(
    _request: &ReflectRequest,
    _source: &PreparedSource<'_>,
) -> Result<bool, ReflectError> {
    Err(ReflectError::Backend(
        "shaderc support is not enabled in this build".to_string(),
    ))
}

#[cfg(feature = "shaderc")]
fn shaderc_kind(stage: ShaderStage) -> shaderc::ShaderKind {
    match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::TessControl => shaderc::ShaderKind::TessControl,
        ShaderStage::TessEvaluation => shaderc::ShaderKind::TessEvaluation,
        ShaderStage::Geometry => shaderc::ShaderKind::Geometry,
        ShaderStage::Fragment => shaderc::ShaderKind::Fragment,
        ShaderStage::Compute => shaderc::ShaderKind::Compute,
        ShaderStage::RayGen => shaderc::ShaderKind::RayGeneration,
        ShaderStage::Intersect => shaderc::ShaderKind::Intersection,
        ShaderStage::AnyHit => shaderc::ShaderKind::AnyHit,
        ShaderStage::ClosestHit => shaderc::ShaderKind::ClosestHit,
        ShaderStage::Miss => shaderc::ShaderKind::Miss,
        ShaderStage::Callable => shaderc::ShaderKind::Callable,
        ShaderStage::Task => shaderc::ShaderKind::Task,
        ShaderStage::Mesh => shaderc::ShaderKind::Mesh,
    }
}
