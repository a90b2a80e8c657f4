//! JVM-independent half of the bridge: input checks, the reflection call and
//! the Java-side record shapes.

use std::env;
use std::sync::OnceLock;

use glslens::{
    process, ErrorKind, ObjectReflection, ReflectError, ReflectOptions, ReflectRequest,
    ShaderCompiler, ShaderProgram,
};

pub const ENV_COMPILER: &str = "GLSLENS_COMPILER";

pub const NULL_POINTER_EXCEPTION: &str = "java/lang/NullPointerException";
pub const ILLEGAL_ARGUMENT_EXCEPTION: &str = "java/lang/IllegalArgumentException";
pub const ILLEGAL_STATE_EXCEPTION: &str = "java/lang/IllegalStateException";
pub const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("shader source must not be null")]
    NullSource,
    #[error("glslang process is not initialized; create a GLSLens instance first")]
    NotInitialized,
    #[error(transparent)]
    Reflect(#[from] ReflectError),
    #[error("too many uniforms for a Java array: {0}")]
    TooManyRecords(usize),
    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
    #[error("native panic: {0}")]
    Panic(String),
}

impl BridgeError {
    /// JNI class name of the exception thrown back to the caller.
    pub fn exception_class(&self) -> &'static str {
        match self {
            Self::NullSource => NULL_POINTER_EXCEPTION,
            Self::NotInitialized => ILLEGAL_STATE_EXCEPTION,
            Self::Reflect(err) if err.kind() == ErrorKind::InvalidArgument => {
                ILLEGAL_ARGUMENT_EXCEPTION
            }
            _ => RUNTIME_EXCEPTION,
        }
    }
}

/// Java classes the bridge can allocate per uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// `com.glslens.UniformInfo(String name, int arraySize, int typeID)`
    UniformInfo,
    /// `glslang.TObjectReflection(String name, int offset, int glDefineType,
    /// int size, int index, int counterIndex, int numMembers, int arrayStride,
    /// int topLevelArraySize, int topLevelArrayStride)`
    ObjectReflection,
}

impl RecordShape {
    pub fn class_name(self) -> &'static str {
        match self {
            Self::UniformInfo => "com/glslens/UniformInfo",
            Self::ObjectReflection => "glslang/TObjectReflection",
        }
    }

    pub fn constructor_signature(self) -> &'static str {
        match self {
            Self::UniformInfo => "(Ljava/lang/String;II)V",
            Self::ObjectReflection => "(Ljava/lang/String;IIIIIIIII)V",
        }
    }

    /// Integer constructor arguments following the name.
    pub fn int_args(self, record: &ObjectReflection) -> Vec<i32> {
        match self {
            Self::UniformInfo => {
                let info = glslens::UniformInfo::from(record);
                vec![info.array_size, info.type_id]
            }
            Self::ObjectReflection => vec![
                record.offset,
                record.gl_define_type,
                record.size,
                record.index,
                record.counter_index,
                record.num_members,
                record.array_stride,
                record.top_level_array_size,
                record.top_level_array_stride,
            ],
        }
    }
}

/// Compiler used for bridge calls: `GLSLENS_COMPILER` if it names an
/// available compiler, otherwise the build default. Read once per process.
pub fn bridge_compiler() -> ShaderCompiler {
    static COMPILER: OnceLock<ShaderCompiler> = OnceLock::new();
    *COMPILER.get_or_init(|| match env::var(ENV_COMPILER) {
        Ok(value) => value.parse().unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring {ENV_COMPILER}");
            ShaderCompiler::default()
        }),
        Err(_) => ShaderCompiler::default(),
    })
}

/// Validates the bridge arguments and returns the live uniforms of the
/// shader. `source` is `None` when the caller passed `null`.
pub fn reflect_live_uniforms(
    source: Option<String>,
    version: i32,
    stage: i32,
    compiler: ShaderCompiler,
) -> Result<Vec<ObjectReflection>, BridgeError> {
    let source = source.ok_or(BridgeError::NullSource)?;
    if !process::is_initialized() {
        return Err(BridgeError::NotInitialized);
    }

    let request = ReflectRequest::from_raw(source, version, stage)?;
    let program = ShaderProgram::build(&request, compiler, ReflectOptions::default())?;
    tracing::debug!(
        uniforms = program.live_uniforms_count(),
        stage = %request.stage(),
        "reflected shader for bridge call"
    );
    Ok(program.uniforms().to_vec())
}

pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Process registration is global; serialise the tests touching it.
    static PROCESS_LOCK: Mutex<()> = Mutex::new(());

    const SHADER: &str = r"#version 450
layout(location = 0) out vec4 outColor;
layout(std140, binding = 0) uniform Light {
    vec4 color;
    float intensity;
} light;

void main() {
    outColor = light.color * light.intensity;
}
";

    fn with_process<T>(f: impl FnOnce() -> T) -> T {
        let _lock = PROCESS_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let _guard = process::ProcessGuard::acquire();
        f()
    }

    #[test]
    fn null_source_is_rejected_first() {
        let err = reflect_live_uniforms(None, 0, 99, ShaderCompiler::Builtin).unwrap_err();
        assert!(matches!(err, BridgeError::NullSource));
        assert_eq!(err.exception_class(), NULL_POINTER_EXCEPTION);
    }

    #[test]
    fn requires_initialized_process() {
        let _lock = PROCESS_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        if process::is_initialized() {
            return;
        }
        let err = reflect_live_uniforms(Some(SHADER.into()), 450, 4, ShaderCompiler::Builtin)
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotInitialized));
        assert_eq!(err.exception_class(), ILLEGAL_STATE_EXCEPTION);
    }

    #[test]
    fn invalid_arguments_map_to_illegal_argument() {
        with_process(|| {
            let err = reflect_live_uniforms(Some(SHADER.into()), 450, 14, ShaderCompiler::Builtin)
                .unwrap_err();
            assert_eq!(err.exception_class(), ILLEGAL_ARGUMENT_EXCEPTION);

            let err = reflect_live_uniforms(Some(String::new()), 450, 4, ShaderCompiler::Builtin)
                .unwrap_err();
            assert_eq!(err.to_string(), "Empty shader source");
            assert_eq!(err.exception_class(), ILLEGAL_ARGUMENT_EXCEPTION);
        });
    }

    #[test]
    fn compile_failures_map_to_runtime_exception() {
        with_process(|| {
            let err = reflect_live_uniforms(
                Some("#version 450\nvoid main() { nope; }\n".into()),
                450,
                0,
                ShaderCompiler::Builtin,
            )
            .unwrap_err();
            assert_eq!(err.exception_class(), RUNTIME_EXCEPTION);
            assert!(err.to_string().starts_with("Failed to parse shader: "));
        });
    }

    #[test]
    fn returns_reflection_records() {
        let records = with_process(|| {
            reflect_live_uniforms(Some(SHADER.into()), 450, 4, ShaderCompiler::Builtin).unwrap()
        });
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Light.color", "Light.intensity"]);
        assert_eq!(records[1].offset, 16);
    }

    #[test]
    fn reflects_versions_below_440() {
        let source = "uniform mat4 mvp;\nuniform vec4 unused;\nattribute vec4 position;\nvoid main() { gl_Position = mvp * position; }\n";
        let records = with_process(|| {
            reflect_live_uniforms(Some(source.into()), 120, 0, ShaderCompiler::Builtin).unwrap()
        });
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["mvp"]);
        assert_eq!(records[0].offset, -1);
    }

    #[test]
    fn constructor_arguments_match_signatures() {
        let record = ObjectReflection {
            name: "Light.weights[0]".into(),
            offset: 32,
            gl_define_type: 0x1406,
            size: 4,
            index: 0,
            counter_index: -1,
            num_members: -1,
            array_stride: 16,
            top_level_array_size: 4,
            top_level_array_stride: 16,
            is_array: true,
        };
        for shape in [RecordShape::UniformInfo, RecordShape::ObjectReflection] {
            let ints = shape
                .constructor_signature()
                .trim_start_matches("(Ljava/lang/String;")
                .trim_end_matches(")V")
                .len();
            assert_eq!(shape.int_args(&record).len(), ints);
        }
        assert_eq!(RecordShape::UniformInfo.int_args(&record), vec![4, 0x1406]);
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
