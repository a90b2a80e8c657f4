//! OpenGL type enumerants reported as `glDefineType` / `typeID`.
//!
//! Values come from the Khronos `gl.xml` registry. Shapes without an OpenGL
//! counterpart map to [`GL_NONE`].

use crate::glsl::types::{basic_type, BasicType, Component, Dim, Numeric, Opaque, OpaqueKind, Scalar};

pub const GL_NONE: i32 = 0;

pub const GL_INT: i32 = 0x1404;
pub const GL_UNSIGNED_INT: i32 = 0x1405;
pub const GL_FLOAT: i32 = 0x1406;
pub const GL_DOUBLE: i32 = 0x140A;
pub const GL_INT64_ARB: i32 = 0x140E;
pub const GL_UNSIGNED_INT64_ARB: i32 = 0x140F;
pub const GL_BOOL: i32 = 0x8B56;

pub const GL_FLOAT_VEC2: i32 = 0x8B50;
pub const GL_FLOAT_VEC3: i32 = 0x8B51;
pub const GL_FLOAT_VEC4: i32 = 0x8B52;
pub const GL_INT_VEC2: i32 = 0x8B53;
pub const GL_INT_VEC3: i32 = 0x8B54;
pub const GL_INT_VEC4: i32 = 0x8B55;
pub const GL_BOOL_VEC2: i32 = 0x8B57;
pub const GL_BOOL_VEC3: i32 = 0x8B58;
pub const GL_BOOL_VEC4: i32 = 0x8B59;
pub const GL_UNSIGNED_INT_VEC2: i32 = 0x8DC6;
pub const GL_UNSIGNED_INT_VEC3: i32 = 0x8DC7;
pub const GL_UNSIGNED_INT_VEC4: i32 = 0x8DC8;
pub const GL_DOUBLE_VEC2: i32 = 0x8FFC;
pub const GL_DOUBLE_VEC3: i32 = 0x8FFD;
pub const GL_DOUBLE_VEC4: i32 = 0x8FFE;

pub const GL_FLOAT_MAT2: i32 = 0x8B5A;
pub const GL_FLOAT_MAT3: i32 = 0x8B5B;
pub const GL_FLOAT_MAT4: i32 = 0x8B5C;
pub const GL_FLOAT_MAT2X3: i32 = 0x8B65;
pub const GL_FLOAT_MAT2X4: i32 = 0x8B66;
pub const GL_FLOAT_MAT3X2: i32 = 0x8B67;
pub const GL_FLOAT_MAT3X4: i32 = 0x8B68;
pub const GL_FLOAT_MAT4X2: i32 = 0x8B69;
pub const GL_FLOAT_MAT4X3: i32 = 0x8B6A;
pub const GL_DOUBLE_MAT2: i32 = 0x8F46;
pub const GL_DOUBLE_MAT3: i32 = 0x8F47;
pub const GL_DOUBLE_MAT4: i32 = 0x8F48;
pub const GL_DOUBLE_MAT2X3: i32 = 0x8F49;
pub const GL_DOUBLE_MAT2X4: i32 = 0x8F4A;
pub const GL_DOUBLE_MAT3X2: i32 = 0x8F4B;
pub const GL_DOUBLE_MAT3X4: i32 = 0x8F4C;
pub const GL_DOUBLE_MAT4X2: i32 = 0x8F4D;
pub const GL_DOUBLE_MAT4X3: i32 = 0x8F4E;

pub const GL_SAMPLER_1D: i32 = 0x8B5D;
pub const GL_SAMPLER_2D: i32 = 0x8B5E;
pub const GL_SAMPLER_3D: i32 = 0x8B5F;
pub const GL_SAMPLER_CUBE: i32 = 0x8B60;
pub const GL_SAMPLER_1D_SHADOW: i32 = 0x8B61;
pub const GL_SAMPLER_2D_SHADOW: i32 = 0x8B62;
pub const GL_SAMPLER_1D_ARRAY: i32 = 0x8DC0;
pub const GL_SAMPLER_2D_ARRAY: i32 = 0x8DC1;
pub const GL_SAMPLER_1D_ARRAY_SHADOW: i32 = 0x8DC3;
pub const GL_SAMPLER_2D_ARRAY_SHADOW: i32 = 0x8DC4;
pub const GL_SAMPLER_CUBE_SHADOW: i32 = 0x8DC5;
pub const GL_SAMPLER_2D_MULTISAMPLE: i32 = 0x9108;
pub const GL_SAMPLER_2D_MULTISAMPLE_ARRAY: i32 = 0x910B;
pub const GL_SAMPLER_CUBE_MAP_ARRAY: i32 = 0x900C;
pub const GL_SAMPLER_CUBE_MAP_ARRAY_SHADOW: i32 = 0x900D;
pub const GL_SAMPLER_2D_RECT: i32 = 0x8B63;
pub const GL_SAMPLER_2D_RECT_SHADOW: i32 = 0x8B64;
pub const GL_SAMPLER_BUFFER: i32 = 0x8DC2;
pub const GL_SAMPLER_EXTERNAL_OES: i32 = 0x8D66;

pub const GL_INT_SAMPLER_1D: i32 = 0x8DC9;
pub const GL_INT_SAMPLER_2D: i32 = 0x8DCA;
pub const GL_INT_SAMPLER_3D: i32 = 0x8DCB;
pub const GL_INT_SAMPLER_CUBE: i32 = 0x8DCC;
pub const GL_INT_SAMPLER_1D_ARRAY: i32 = 0x8DCE;
pub const GL_INT_SAMPLER_2D_ARRAY: i32 = 0x8DCF;
pub const GL_INT_SAMPLER_2D_MULTISAMPLE: i32 = 0x9109;
pub const GL_INT_SAMPLER_2D_MULTISAMPLE_ARRAY: i32 = 0x910C;
pub const GL_INT_SAMPLER_CUBE_MAP_ARRAY: i32 = 0x900E;
pub const GL_INT_SAMPLER_2D_RECT: i32 = 0x8DCD;
pub const GL_INT_SAMPLER_BUFFER: i32 = 0x8DD0;

pub const GL_UNSIGNED_INT_SAMPLER_1D: i32 = 0x8DD1;
pub const GL_UNSIGNED_INT_SAMPLER_2D: i32 = 0x8DD2;
pub const GL_UNSIGNED_INT_SAMPLER_3D: i32 = 0x8DD3;
pub const GL_UNSIGNED_INT_SAMPLER_CUBE: i32 = 0x8DD4;
pub const GL_UNSIGNED_INT_SAMPLER_1D_ARRAY: i32 = 0x8DD6;
pub const GL_UNSIGNED_INT_SAMPLER_2D_ARRAY: i32 = 0x8DD7;
pub const GL_UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE: i32 = 0x910A;
pub const GL_UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY: i32 = 0x910D;
pub const GL_UNSIGNED_INT_SAMPLER_CUBE_MAP_ARRAY: i32 = 0x900F;
pub const GL_UNSIGNED_INT_SAMPLER_2D_RECT: i32 = 0x8DD5;
pub const GL_UNSIGNED_INT_SAMPLER_BUFFER: i32 = 0x8DD8;

pub const GL_IMAGE_1D: i32 = 0x904C;
pub const GL_IMAGE_2D: i32 = 0x904D;
pub const GL_IMAGE_3D: i32 = 0x904E;
pub const GL_IMAGE_CUBE: i32 = 0x9050;
pub const GL_IMAGE_2D_RECT: i32 = 0x904F;
pub const GL_IMAGE_BUFFER: i32 = 0x9051;
pub const GL_IMAGE_1D_ARRAY: i32 = 0x9052;
pub const GL_IMAGE_2D_ARRAY: i32 = 0x9053;
pub const GL_IMAGE_CUBE_MAP_ARRAY: i32 = 0x9054;
pub const GL_IMAGE_2D_MULTISAMPLE: i32 = 0x9055;
pub const GL_IMAGE_2D_MULTISAMPLE_ARRAY: i32 = 0x9056;
pub const GL_INT_IMAGE_1D: i32 = 0x9057;
pub const GL_INT_IMAGE_2D: i32 = 0x9058;
pub const GL_INT_IMAGE_3D: i32 = 0x9059;
pub const GL_INT_IMAGE_CUBE: i32 = 0x905B;
pub const GL_INT_IMAGE_2D_RECT: i32 = 0x905A;
pub const GL_INT_IMAGE_BUFFER: i32 = 0x905C;
pub const GL_INT_IMAGE_1D_ARRAY: i32 = 0x905D;
pub const GL_INT_IMAGE_2D_ARRAY: i32 = 0x905E;
pub const GL_INT_IMAGE_CUBE_MAP_ARRAY: i32 = 0x905F;
pub const GL_INT_IMAGE_2D_MULTISAMPLE: i32 = 0x9060;
pub const GL_INT_IMAGE_2D_MULTISAMPLE_ARRAY: i32 = 0x9061;
pub const GL_UNSIGNED_INT_IMAGE_1D: i32 = 0x9062;
pub const GL_UNSIGNED_INT_IMAGE_2D: i32 = 0x9063;
pub const GL_UNSIGNED_INT_IMAGE_3D: i32 = 0x9064;
pub const GL_UNSIGNED_INT_IMAGE_CUBE: i32 = 0x9066;
pub const GL_UNSIGNED_INT_IMAGE_2D_RECT: i32 = 0x9065;
pub const GL_UNSIGNED_INT_IMAGE_BUFFER: i32 = 0x9067;
pub const GL_UNSIGNED_INT_IMAGE_1D_ARRAY: i32 = 0x9068;
pub const GL_UNSIGNED_INT_IMAGE_2D_ARRAY: i32 = 0x9069;
pub const GL_UNSIGNED_INT_IMAGE_CUBE_MAP_ARRAY: i32 = 0x906A;
pub const GL_UNSIGNED_INT_IMAGE_2D_MULTISAMPLE: i32 = 0x906B;
pub const GL_UNSIGNED_INT_IMAGE_2D_MULTISAMPLE_ARRAY: i32 = 0x906C;

pub const GL_UNSIGNED_INT_ATOMIC_COUNTER: i32 = 0x92DB;

/// Returns the OpenGL enumerant for a GLSL type keyword (`vec4`,
/// `usampler2DArray`, `iimage2D`, ...), or [`GL_NONE`] for struct names and
/// types OpenGL has no enumerant for.
pub fn gl_type_of(type_name: &str) -> i32 {
    match basic_type(type_name) {
        Some(BasicType::Numeric(numeric)) => numeric_type(numeric),
        Some(BasicType::Opaque(opaque)) => opaque_type(opaque),
        Some(BasicType::AtomicUint) => GL_UNSIGNED_INT_ATOMIC_COUNTER,
        _ => GL_NONE,
    }
}

fn numeric_type(numeric: Numeric) -> i32 {
    if numeric.is_matrix() {
        return matrix_type(numeric);
    }
    // [scalar, vec2, vec3, vec4]
    let table = match numeric.scalar {
        Scalar::Float => [GL_FLOAT, GL_FLOAT_VEC2, GL_FLOAT_VEC3, GL_FLOAT_VEC4],
        Scalar::Double => [GL_DOUBLE, GL_DOUBLE_VEC2, GL_DOUBLE_VEC3, GL_DOUBLE_VEC4],
        Scalar::Int => [GL_INT, GL_INT_VEC2, GL_INT_VEC3, GL_INT_VEC4],
        Scalar::Uint => [
            GL_UNSIGNED_INT,
            GL_UNSIGNED_INT_VEC2,
            GL_UNSIGNED_INT_VEC3,
            GL_UNSIGNED_INT_VEC4,
        ],
        Scalar::Bool => [GL_BOOL, GL_BOOL_VEC2, GL_BOOL_VEC3, GL_BOOL_VEC4],
        Scalar::Int64 if numeric.rows == 1 => return GL_INT64_ARB,
        Scalar::Uint64 if numeric.rows == 1 => return GL_UNSIGNED_INT64_ARB,
        _ => return GL_NONE,
    };
    table[usize::from(numeric.rows) - 1]
}

fn matrix_type(numeric: Numeric) -> i32 {
    let double = match numeric.scalar {
        Scalar::Float => false,
        Scalar::Double => true,
        _ => return GL_NONE,
    };
    match (numeric.columns, numeric.rows, double) {
        (2, 2, false) => GL_FLOAT_MAT2,
        (3, 3, false) => GL_FLOAT_MAT3,
        (4, 4, false) => GL_FLOAT_MAT4,
        (2, 3, false) => GL_FLOAT_MAT2X3,
        (2, 4, false) => GL_FLOAT_MAT2X4,
        (3, 2, false) => GL_FLOAT_MAT3X2,
        (3, 4, false) => GL_FLOAT_MAT3X4,
        (4, 2, false) => GL_FLOAT_MAT4X2,
        (4, 3, false) => GL_FLOAT_MAT4X3,
        (2, 2, true) => GL_DOUBLE_MAT2,
        (3, 3, true) => GL_DOUBLE_MAT3,
        (4, 4, true) => GL_DOUBLE_MAT4,
        (2, 3, true) => GL_DOUBLE_MAT2X3,
        (2, 4, true) => GL_DOUBLE_MAT2X4,
        (3, 2, true) => GL_DOUBLE_MAT3X2,
        (3, 4, true) => GL_DOUBLE_MAT3X4,
        (4, 2, true) => GL_DOUBLE_MAT4X2,
        (4, 3, true) => GL_DOUBLE_MAT4X3,
        _ => GL_NONE,
    }
}

fn opaque_type(opaque: Opaque) -> i32 {
    match opaque.kind {
        // Separate textures report the sampler type they combine into.
        OpaqueKind::Sampler | OpaqueKind::Texture if opaque.shadow => shadow_type(opaque),
        OpaqueKind::Sampler | OpaqueKind::Texture => sampled_type(opaque),
        OpaqueKind::Image => image_type(opaque),
        OpaqueKind::SubpassInput => GL_NONE,
    }
}

fn shadow_type(opaque: Opaque) -> i32 {
    match (opaque.dim, opaque.arrayed) {
        (Dim::D1, false) => GL_SAMPLER_1D_SHADOW,
        (Dim::D1, true) => GL_SAMPLER_1D_ARRAY_SHADOW,
        (Dim::D2, false) => GL_SAMPLER_2D_SHADOW,
        (Dim::D2, true) => GL_SAMPLER_2D_ARRAY_SHADOW,
        (Dim::Cube, false) => GL_SAMPLER_CUBE_SHADOW,
        (Dim::Cube, true) => GL_SAMPLER_CUBE_MAP_ARRAY_SHADOW,
        (Dim::Rect, _) => GL_SAMPLER_2D_RECT_SHADOW,
        _ => GL_NONE,
    }
}

fn sampled_type(opaque: Opaque) -> i32 {
    // [float, int, uint]
    let table = match (opaque.dim, opaque.arrayed, opaque.multisample) {
        (Dim::D1, false, _) => [GL_SAMPLER_1D, GL_INT_SAMPLER_1D, GL_UNSIGNED_INT_SAMPLER_1D],
        (Dim::D1, true, _) => [
            GL_SAMPLER_1D_ARRAY,
            GL_INT_SAMPLER_1D_ARRAY,
            GL_UNSIGNED_INT_SAMPLER_1D_ARRAY,
        ],
        (Dim::D2, false, false) => [GL_SAMPLER_2D, GL_INT_SAMPLER_2D, GL_UNSIGNED_INT_SAMPLER_2D],
        (Dim::D2, true, false) => [
            GL_SAMPLER_2D_ARRAY,
            GL_INT_SAMPLER_2D_ARRAY,
            GL_UNSIGNED_INT_SAMPLER_2D_ARRAY,
        ],
        (Dim::D2, false, true) => [
            GL_SAMPLER_2D_MULTISAMPLE,
            GL_INT_SAMPLER_2D_MULTISAMPLE,
            GL_UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE,
        ],
        (Dim::D2, true, true) => [
            GL_SAMPLER_2D_MULTISAMPLE_ARRAY,
            GL_INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
            GL_UNSIGNED_INT_SAMPLER_2D_MULTISAMPLE_ARRAY,
        ],
        (Dim::D3, _, _) => [GL_SAMPLER_3D, GL_INT_SAMPLER_3D, GL_UNSIGNED_INT_SAMPLER_3D],
        (Dim::Cube, false, _) => [
            GL_SAMPLER_CUBE,
            GL_INT_SAMPLER_CUBE,
            GL_UNSIGNED_INT_SAMPLER_CUBE,
        ],
        (Dim::Cube, true, _) => [
            GL_SAMPLER_CUBE_MAP_ARRAY,
            GL_INT_SAMPLER_CUBE_MAP_ARRAY,
            GL_UNSIGNED_INT_SAMPLER_CUBE_MAP_ARRAY,
        ],
        (Dim::Rect, _, _) => [
            GL_SAMPLER_2D_RECT,
            GL_INT_SAMPLER_2D_RECT,
            GL_UNSIGNED_INT_SAMPLER_2D_RECT,
        ],
        (Dim::Buffer, _, _) => [
            GL_SAMPLER_BUFFER,
            GL_INT_SAMPLER_BUFFER,
            GL_UNSIGNED_INT_SAMPLER_BUFFER,
        ],
        (Dim::External, _, _) => [GL_SAMPLER_EXTERNAL_OES, GL_NONE, GL_NONE],
        (Dim::Subpass, _, _) => return GL_NONE,
    };
    pick_by_component(table, opaque.component)
}

fn image_type(opaque: Opaque) -> i32 {
    let table = match (opaque.dim, opaque.arrayed, opaque.multisample) {
        (Dim::D1, false, _) => [GL_IMAGE_1D, GL_INT_IMAGE_1D, GL_UNSIGNED_INT_IMAGE_1D],
        (Dim::D1, true, _) => [
            GL_IMAGE_1D_ARRAY,
            GL_INT_IMAGE_1D_ARRAY,
            GL_UNSIGNED_INT_IMAGE_1D_ARRAY,
        ],
        (Dim::D2, false, false) => [GL_IMAGE_2D, GL_INT_IMAGE_2D, GL_UNSIGNED_INT_IMAGE_2D],
        (Dim::D2, true, false) => [
            GL_IMAGE_2D_ARRAY,
            GL_INT_IMAGE_2D_ARRAY,
            GL_UNSIGNED_INT_IMAGE_2D_ARRAY,
        ],
        (Dim::D2, false, true) => [
            GL_IMAGE_2D_MULTISAMPLE,
            GL_INT_IMAGE_2D_MULTISAMPLE,
            GL_UNSIGNED_INT_IMAGE_2D_MULTISAMPLE,
        ],
        (Dim::D2, true, true) => [
            GL_IMAGE_2D_MULTISAMPLE_ARRAY,
            GL_INT_IMAGE_2D_MULTISAMPLE_ARRAY,
            GL_UNSIGNED_INT_IMAGE_2D_MULTISAMPLE_ARRAY,
        ],
        (Dim::D3, _, _) => [GL_IMAGE_3D, GL_INT_IMAGE_3D, GL_UNSIGNED_INT_IMAGE_3D],
        (Dim::Cube, false, _) => [GL_IMAGE_CUBE, GL_INT_IMAGE_CUBE, GL_UNSIGNED_INT_IMAGE_CUBE],
        (Dim::Cube, true, _) => [
            GL_IMAGE_CUBE_MAP_ARRAY,
            GL_INT_IMAGE_CUBE_MAP_ARRAY,
            GL_UNSIGNED_INT_IMAGE_CUBE_MAP_ARRAY,
        ],
        (Dim::Rect, _, _) => [
            GL_IMAGE_2D_RECT,
            GL_INT_IMAGE_2D_RECT,
            GL_UNSIGNED_INT_IMAGE_2D_RECT,
        ],
        (Dim::Buffer, _, _) => [
            GL_IMAGE_BUFFER,
            GL_INT_IMAGE_BUFFER,
            GL_UNSIGNED_INT_IMAGE_BUFFER,
        ],
        (Dim::External | Dim::Subpass, _, _) => return GL_NONE,
    };
    pick_by_component(table, opaque.component)
}

fn pick_by_component(table: [i32; 3], component: Component) -> i32 {
    match component {
        Component::Float => table[0],
        Component::Int => table[1],
        Component::Uint => table[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_scalars_and_vectors() {
        assert_eq!(gl_type_of("float"), GL_FLOAT);
        assert_eq!(gl_type_of("uint"), GL_UNSIGNED_INT);
        assert_eq!(gl_type_of("bool"), GL_BOOL);
        assert_eq!(gl_type_of("vec4"), GL_FLOAT_VEC4);
        assert_eq!(gl_type_of("ivec2"), GL_INT_VEC2);
        assert_eq!(gl_type_of("bvec3"), GL_BOOL_VEC3);
        assert_eq!(gl_type_of("dvec2"), GL_DOUBLE_VEC2);
        assert_eq!(gl_type_of("int64_t"), GL_INT64_ARB);
    }

    #[test]
    fn maps_matrices_column_major() {
        assert_eq!(gl_type_of("mat4"), GL_FLOAT_MAT4);
        assert_eq!(gl_type_of("mat4x4"), GL_FLOAT_MAT4);
        assert_eq!(gl_type_of("mat3x2"), GL_FLOAT_MAT3X2);
        assert_eq!(gl_type_of("dmat2x4"), GL_DOUBLE_MAT2X4);
    }

    #[test]
    fn maps_samplers_and_textures() {
        assert_eq!(gl_type_of("sampler2D"), GL_SAMPLER_2D);
        assert_eq!(gl_type_of("usamplerCube"), GL_UNSIGNED_INT_SAMPLER_CUBE);
        assert_eq!(gl_type_of("sampler2DArrayShadow"), GL_SAMPLER_2D_ARRAY_SHADOW);
        assert_eq!(gl_type_of("isampler2DMSArray"), GL_INT_SAMPLER_2D_MULTISAMPLE_ARRAY);
        assert_eq!(gl_type_of("samplerBuffer"), GL_SAMPLER_BUFFER);
        assert_eq!(gl_type_of("samplerExternalOES"), GL_SAMPLER_EXTERNAL_OES);
        assert_eq!(gl_type_of("texture2D"), GL_SAMPLER_2D);
        assert_eq!(gl_type_of("utexture3D"), GL_UNSIGNED_INT_SAMPLER_3D);
    }

    #[test]
    fn maps_storage_images_by_component() {
        assert_eq!(gl_type_of("image2D"), GL_IMAGE_2D);
        assert_eq!(gl_type_of("iimage2D"), GL_INT_IMAGE_2D);
        assert_eq!(gl_type_of("uimage2D"), GL_UNSIGNED_INT_IMAGE_2D);
        assert_eq!(gl_type_of("uimage2DArray"), GL_UNSIGNED_INT_IMAGE_2D_ARRAY);
        assert_eq!(gl_type_of("iimageBuffer"), GL_INT_IMAGE_BUFFER);
        assert_eq!(gl_type_of("image2DMS"), GL_IMAGE_2D_MULTISAMPLE);
    }

    #[test]
    fn unmapped_types_are_none() {
        assert_eq!(gl_type_of("atomic_uint"), GL_UNSIGNED_INT_ATOMIC_COUNTER);
        assert_eq!(gl_type_of("Light"), GL_NONE);
        assert_eq!(gl_type_of("sampler"), GL_NONE);
        assert_eq!(gl_type_of("subpassInput"), GL_NONE);
        assert_eq!(gl_type_of("f16vec4"), GL_NONE);
    }
}
