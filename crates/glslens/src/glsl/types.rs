//! Classification of built-in GLSL type keywords.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scalar {
    Bool,
    Int,
    Uint,
    Float,
    Double,
    Int64,
    Uint64,
    Float16,
    Int16,
    Uint16,
    Int8,
    Uint8,
}

impl Scalar {
    /// Size in bytes inside a buffer block. Booleans occupy a full word.
    pub fn size(self) -> u32 {
        match self {
            Scalar::Bool | Scalar::Int | Scalar::Uint | Scalar::Float => 4,
            Scalar::Double | Scalar::Int64 | Scalar::Uint64 => 8,
            Scalar::Float16 | Scalar::Int16 | Scalar::Uint16 => 2,
            Scalar::Int8 | Scalar::Uint8 => 1,
        }
    }
}

/// Scalar, vector (`columns == 1`) or matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Numeric {
    pub scalar: Scalar,
    pub columns: u8,
    pub rows: u8,
}

impl Numeric {
    pub fn is_matrix(self) -> bool {
        self.columns > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Component {
    Float,
    Int,
    Uint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dim {
    D1,
    D2,
    D3,
    Cube,
    Rect,
    Buffer,
    External,
    Subpass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpaqueKind {
    /// Combined image sampler (`sampler2D`).
    Sampler,
    /// Separate sampled image (`texture2D`).
    Texture,
    Image,
    SubpassInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Opaque {
    pub kind: OpaqueKind,
    pub component: Component,
    pub dim: Dim,
    pub arrayed: bool,
    pub multisample: bool,
    pub shadow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BasicType {
    Void,
    Numeric(Numeric),
    Opaque(Opaque),
    /// Separate `sampler` / `samplerShadow` state objects.
    SamplerState,
    AtomicUint,
    /// Acceleration structures and ray queries.
    Other,
}

pub(crate) fn is_builtin_type(name: &str) -> bool {
    basic_type(name).is_some()
}

pub(crate) fn basic_type(name: &str) -> Option<BasicType> {
    match name {
        "void" => return Some(BasicType::Void),
        "atomic_uint" => return Some(BasicType::AtomicUint),
        "sampler" | "samplerShadow" => return Some(BasicType::SamplerState),
        "accelerationStructureEXT" | "accelerationStructureNV" | "rayQueryEXT" => {
            return Some(BasicType::Other)
        }
        _ => {}
    }
    numeric(name)
        .map(BasicType::Numeric)
        .or_else(|| opaque(name).map(BasicType::Opaque))
}

const SCALARS: &[(&str, Scalar)] = &[
    ("bool", Scalar::Bool),
    ("int", Scalar::Int),
    ("uint", Scalar::Uint),
    ("float", Scalar::Float),
    ("double", Scalar::Double),
    ("float16_t", Scalar::Float16),
    ("float32_t", Scalar::Float),
    ("float64_t", Scalar::Double),
    ("int8_t", Scalar::Int8),
    ("uint8_t", Scalar::Uint8),
    ("int16_t", Scalar::Int16),
    ("uint16_t", Scalar::Uint16),
    ("int32_t", Scalar::Int),
    ("uint32_t", Scalar::Uint),
    ("int64_t", Scalar::Int64),
    ("uint64_t", Scalar::Uint64),
];

const VECTORS: &[(&str, Scalar)] = &[
    ("vec", Scalar::Float),
    ("ivec", Scalar::Int),
    ("uvec", Scalar::Uint),
    ("bvec", Scalar::Bool),
    ("dvec", Scalar::Double),
    ("i8vec", Scalar::Int8),
    ("u8vec", Scalar::Uint8),
    ("i16vec", Scalar::Int16),
    ("u16vec", Scalar::Uint16),
    ("i32vec", Scalar::Int),
    ("u32vec", Scalar::Uint),
    ("i64vec", Scalar::Int64),
    ("u64vec", Scalar::Uint64),
    ("f16vec", Scalar::Float16),
    ("f32vec", Scalar::Float),
    ("f64vec", Scalar::Double),
];

const MATRICES: &[(&str, Scalar)] = &[
    ("mat", Scalar::Float),
    ("dmat", Scalar::Double),
    ("f16mat", Scalar::Float16),
    ("f32mat", Scalar::Float),
    ("f64mat", Scalar::Double),
];

fn dimension(text: &str) -> Option<u8> {
    match text {
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        _ => None,
    }
}

fn numeric(name: &str) -> Option<Numeric> {
    if let Some(&(_, scalar)) = SCALARS.iter().find(|(keyword, _)| *keyword == name) {
        return Some(Numeric {
            scalar,
            columns: 1,
            rows: 1,
        });
    }
    for &(prefix, scalar) in VECTORS {
        if let Some(rows) = name.strip_prefix(prefix).and_then(dimension) {
            return Some(Numeric {
                scalar,
                columns: 1,
                rows,
            });
        }
    }
    for &(prefix, scalar) in MATRICES {
        let Some(shape) = name.strip_prefix(prefix) else {
            continue;
        };
        // matN is NxN; matCxR has C columns of R rows.
        let (columns, rows) = match shape.split_once('x') {
            Some((columns, rows)) => (dimension(columns), dimension(rows)),
            None => (dimension(shape), dimension(shape)),
        };
        if let (Some(columns), Some(rows)) = (columns, rows) {
            return Some(Numeric {
                scalar,
                columns,
                rows,
            });
        }
    }
    None
}

fn strip_flag<'a>(text: &'a str, suffix: &str) -> (bool, &'a str) {
    match text.strip_prefix(suffix) {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

fn split_kind(text: &str) -> Option<(OpaqueKind, &str)> {
    [
        ("sampler", OpaqueKind::Sampler),
        ("texture", OpaqueKind::Texture),
        ("image", OpaqueKind::Image),
        ("subpassInput", OpaqueKind::SubpassInput),
    ]
    .into_iter()
    .find_map(|(prefix, kind)| text.strip_prefix(prefix).map(|rest| (kind, rest)))
}

fn opaque(name: &str) -> Option<Opaque> {
    let (component, (kind, rest)) = [
        ("", Component::Float),
        ("i", Component::Int),
        ("u", Component::Uint),
    ]
    .into_iter()
    .find_map(|(prefix, component)| {
        let rest = name.strip_prefix(prefix)?;
        split_kind(rest).map(|kind| (component, kind))
    })?;

    if kind == OpaqueKind::SubpassInput {
        let (multisample, rest) = strip_flag(rest, "MS");
        return rest.is_empty().then_some(Opaque {
            kind,
            component,
            dim: Dim::Subpass,
            arrayed: false,
            multisample,
            shadow: false,
        });
    }

    let (dim, rest) = [
        ("1D", Dim::D1),
        ("2DRect", Dim::Rect),
        ("2D", Dim::D2),
        ("3D", Dim::D3),
        ("Cube", Dim::Cube),
        ("Buffer", Dim::Buffer),
        ("ExternalOES", Dim::External),
    ]
    .into_iter()
    .find_map(|(prefix, dim)| rest.strip_prefix(prefix).map(|rest| (dim, rest)))?;
    let (multisample, rest) = strip_flag(rest, "MS");
    let (arrayed, rest) = strip_flag(rest, "Array");
    let (shadow, rest) = strip_flag(rest, "Shadow");
    if !rest.is_empty() {
        return None;
    }

    let valid = (!multisample || dim == Dim::D2)
        && (!arrayed || matches!(dim, Dim::D1 | Dim::D2 | Dim::Cube))
        && (!shadow || (kind == OpaqueKind::Sampler && component == Component::Float))
        && (dim != Dim::External || (kind == OpaqueKind::Sampler && component == Component::Float));
    valid.then_some(Opaque {
        kind,
        component,
        dim,
        arrayed,
        multisample,
        shadow,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_numeric_shapes() {
        assert_eq!(
            basic_type("mat3x2"),
            Some(BasicType::Numeric(Numeric {
                scalar: Scalar::Float,
                columns: 3,
                rows: 2
            }))
        );
        assert_eq!(
            basic_type("u16vec3"),
            Some(BasicType::Numeric(Numeric {
                scalar: Scalar::Uint16,
                columns: 1,
                rows: 3
            }))
        );
        assert!(is_builtin_type("dmat4"));
        assert!(!is_builtin_type("mat5"));
        assert!(!is_builtin_type("vec"));
    }

    #[test]
    fn recognises_opaque_types() {
        let Some(BasicType::Opaque(cube)) = basic_type("usamplerCubeArray") else {
            panic!("usamplerCubeArray is a sampler");
        };
        assert_eq!(cube.component, Component::Uint);
        assert_eq!(cube.dim, Dim::Cube);
        assert!(cube.arrayed);

        assert!(is_builtin_type("sampler2DMSArray"));
        assert!(is_builtin_type("iimage2D"));
        assert!(is_builtin_type("texture2DArray"));
        assert_eq!(basic_type("samplerShadow"), Some(BasicType::SamplerState));
        assert!(!is_builtin_type("isampler2DShadow"));
        assert!(!is_builtin_type("sampler3DMS"));
    }

    #[test]
    fn builtin_function_names_are_not_types() {
        for name in ["texture", "textureSize", "texture2DLod", "imageLoad", "imageSize"] {
            assert!(!is_builtin_type(name), "{name}");
        }
    }
}
