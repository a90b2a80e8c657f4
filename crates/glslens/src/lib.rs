//! Uniform reflection for GLSL sources.
//!
//! Every GLSL and GLSL ES version from 100 to 460 and every shader stage is
//! reflected by a built-in front end: the `pp-rs` preprocessor, a declaration
//! parser and a liveness walk from `main`. naga or glslang (through shaderc)
//! can be asked to compile the shader first, so invalid input is reported
//! with their diagnostics.
//!
//! ```text
//!   version / stage / source
//!          │ ReflectRequest (validated)
//!          ▼
//!   ShaderProgram::build ──▶ validate ──▶ parse ──▶ link ──▶ reflect
//!                                                               │
//!                          Vec<ObjectReflection> / Vec<UniformInfo> ◀─┘
//! ```
//!
//! The CLI (`glslens-cli`) and the JNI bridge (`glslens-jni`) are thin
//! front-ends over [`ShaderProgram`]. Both register with [`process`] so the
//! compiler's process-wide state is set up and torn down exactly once.

mod compile;
mod error;
pub mod gl_types;
mod glsl;
mod layout;
pub mod process;
mod reflect;
mod request;
mod source;
mod stage;
mod version;

pub use compile::{ReflectOptions, ShaderCompiler, ShaderProgram};
pub use error::{ErrorKind, ReflectError};
pub use reflect::{ObjectReflection, UniformInfo};
pub use request::ReflectRequest;
pub use stage::ShaderStage;
pub use version::{GlslVersion, MAX_GLSL_VERSION, MIN_GLSL_VERSION};
