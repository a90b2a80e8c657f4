//! JNI exports backing `com.glslens.GLSLens`.
//!
//! ```java
//! public class GLSLens {
//!     public native void initializeProcess();
//!     public native void finalizeProcess();
//!     public native UniformInfo[] getLiveUniformsInfo(String source, int version, int stage);
//!     public native TObjectReflection[] getLiveUniformsReflection(String source, int version, int stage);
//! }
//! ```
//!
//! Failures never unwind into the JVM. Each one becomes a pending Java
//! exception and the native method returns `null`.

pub mod marshal;

use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::Once;

use glslens::{process, ObjectReflection};
use jni::objects::{JObject, JObjectArray, JString, JValue};
use jni::sys::{jint, jobjectArray, jsize};
use jni::JNIEnv;
use tracing_subscriber::EnvFilter;

use crate::marshal::{BridgeError, RecordShape};

fn initialise_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        // The host may already have installed a subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[no_mangle]
pub extern "system" fn Java_com_glslens_GLSLens_initializeProcess<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    initialise_tracing();
    process::initialize();
}

#[no_mangle]
pub extern "system" fn Java_com_glslens_GLSLens_finalizeProcess<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    process::finalize();
}

#[no_mangle]
pub extern "system" fn Java_com_glslens_GLSLens_getLiveUniformsInfo<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    source: JString<'local>,
    version: jint,
    stage: jint,
) -> jobjectArray {
    live_uniforms(&mut env, &source, version, stage, RecordShape::UniformInfo)
}

#[no_mangle]
pub extern "system" fn Java_com_glslens_GLSLens_getLiveUniformsReflection<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    source: JString<'local>,
    version: jint,
    stage: jint,
) -> jobjectArray {
    live_uniforms(&mut env, &source, version, stage, RecordShape::ObjectReflection)
}

fn live_uniforms(
    env: &mut JNIEnv<'_>,
    source: &JString<'_>,
    version: jint,
    stage: jint,
    shape: RecordShape,
) -> jobjectArray {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let source = read_source(env, source)?;
        let records =
            marshal::reflect_live_uniforms(source, version, stage, marshal::bridge_compiler())?;
        let array = new_record_array(env, shape, &records)?;
        Ok::<_, BridgeError>(array.into_raw())
    }));

    let err = match outcome {
        Ok(Ok(array)) => return array,
        Ok(Err(err)) => err,
        Err(payload) => BridgeError::Panic(marshal::panic_message(payload.as_ref())),
    };
    throw(env, &err);
    ptr::null_mut()
}

fn read_source(env: &mut JNIEnv<'_>, source: &JString<'_>) -> Result<Option<String>, BridgeError> {
    if source.is_null() {
        return Ok(None);
    }
    // The JavaStr releases the UTF chars when dropped, before compilation starts.
    let text: String = env.get_string(source)?.into();
    Ok(Some(text))
}

fn new_record_array<'local>(
    env: &mut JNIEnv<'local>,
    shape: RecordShape,
    records: &[ObjectReflection],
) -> Result<JObjectArray<'local>, BridgeError> {
    let length =
        jsize::try_from(records.len()).map_err(|_| BridgeError::TooManyRecords(records.len()))?;
    let class = env.find_class(shape.class_name())?;
    let array = env.new_object_array(length, &class, JObject::null())?;

    for (index, record) in (0..length).zip(records) {
        let name = env.new_string(&record.name)?;
        let mut args = vec![JValue::Object(&name)];
        args.extend(shape.int_args(record).into_iter().map(JValue::Int));

        let element = env.new_object(&class, shape.constructor_signature(), &args)?;
        env.set_object_array_element(&array, index, &element)?;
        drop(args);
        env.delete_local_ref(element)?;
        env.delete_local_ref(name)?;
    }

    env.delete_local_ref(class)?;
    Ok(array)
}

fn throw(env: &mut JNIEnv<'_>, err: &BridgeError) {
    // A failed JNI call leaves its own exception pending; keep that one.
    if env.exception_check().unwrap_or(false) {
        tracing::debug!(%err, "java exception already pending");
        return;
    }
    tracing::debug!(%err, class = err.exception_class(), "throwing java exception");
    if let Err(throw_err) = env.throw_new(err.exception_class(), err.to_string()) {
        tracing::error!(%throw_err, %err, "failed to throw java exception");
    }
}
