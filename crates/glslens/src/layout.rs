//! Resolved uniform types and their std140 / std430 buffer layout.

use std::rc::Rc;

use crate::glsl::types::{basic_type, BasicType, Numeric};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Ty {
    /// Built-in type keyword.
    Basic(String),
    Struct(Rc<StructTy>),
    /// Element type and length; `None` when unsized.
    Array(Box<Ty>, Option<u32>),
}

impl Ty {
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Ty::Struct(_) | Ty::Array(..))
    }
}

#[derive(Debug, PartialEq)]
pub(crate) struct StructTy {
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Member {
    pub name: String,
    pub ty: Ty,
    /// `layout(offset = N)`.
    pub offset: Option<u32>,
    /// `row_major` / `column_major` written on the member.
    pub row_major: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Packing {
    /// Also used for `shared` and `packed`, which leave offsets to the
    /// implementation.
    Std140,
    Std430,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub packing: Packing,
    pub row_major: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            packing: Packing::Std140,
            row_major: false,
        }
    }
}

fn round_up(value: u32, align: u32) -> u32 {
    if align == 0 {
        value
    } else {
        value.div_ceil(align) * align
    }
}

impl Layout {
    pub fn for_member(self, member: &Member) -> Self {
        Self {
            row_major: member.row_major.unwrap_or(self.row_major),
            ..self
        }
    }

    /// std140 rounds array and struct alignment up to a vec4.
    fn aggregate_align(self, align: u32) -> u32 {
        match self.packing {
            Packing::Std140 => round_up(align, 16),
            Packing::Std430 => align,
        }
    }

    fn vector_align(scalar_size: u32, components: u8) -> u32 {
        match components {
            1 => scalar_size,
            2 => 2 * scalar_size,
            _ => 4 * scalar_size,
        }
    }

    /// Matrices are laid out as arrays of column (or row) vectors.
    fn matrix_vectors(self, numeric: Numeric) -> (u32, u8) {
        if self.row_major {
            (u32::from(numeric.rows), numeric.columns)
        } else {
            (u32::from(numeric.columns), numeric.rows)
        }
    }

    fn numeric_align(self, numeric: Numeric) -> u32 {
        let scalar = numeric.scalar.size();
        if numeric.is_matrix() {
            let (_, components) = self.matrix_vectors(numeric);
            self.aggregate_align(Self::vector_align(scalar, components))
        } else {
            Self::vector_align(scalar, numeric.rows)
        }
    }

    fn numeric_size(self, numeric: Numeric) -> u32 {
        let scalar = numeric.scalar.size();
        if numeric.is_matrix() {
            let (count, components) = self.matrix_vectors(numeric);
            let stride = round_up(
                scalar * u32::from(components),
                self.numeric_align(numeric),
            );
            count * stride
        } else {
            scalar * u32::from(numeric.rows)
        }
    }

    pub fn align(self, ty: &Ty) -> u32 {
        match ty {
            Ty::Basic(name) => match basic_type(name) {
                Some(BasicType::Numeric(numeric)) => self.numeric_align(numeric),
                _ => 1,
            },
            Ty::Array(element, _) => self.aggregate_align(self.align(element)),
            Ty::Struct(def) => {
                let widest = def
                    .members
                    .iter()
                    .map(|member| self.for_member(member).align(&member.ty))
                    .max()
                    .unwrap_or(1);
                self.aggregate_align(widest)
            }
        }
    }

    pub fn size(self, ty: &Ty) -> u32 {
        match ty {
            Ty::Basic(name) => match basic_type(name) {
                Some(BasicType::Numeric(numeric)) => self.numeric_size(numeric),
                _ => 0,
            },
            Ty::Array(element, len) => self.array_stride(element) * len.unwrap_or(1),
            Ty::Struct(def) => round_up(self.members_end(&def.members), self.align(ty)),
        }
    }

    pub fn array_stride(self, element: &Ty) -> u32 {
        round_up(
            self.size(element),
            self.aggregate_align(self.align(element)),
        )
    }

    /// Byte offset of each member, honouring explicit `offset` qualifiers.
    pub fn member_offsets(self, members: &[Member]) -> Vec<u32> {
        let mut next = 0;
        members
            .iter()
            .map(|member| {
                let layout = self.for_member(member);
                let offset = member
                    .offset
                    .unwrap_or_else(|| round_up(next, layout.align(&member.ty)));
                next = offset + layout.size(&member.ty);
                offset
            })
            .collect()
    }

    /// End of the last member, without tail padding. This is the size
    /// glslang reports for a uniform block.
    pub fn members_end(self, members: &[Member]) -> u32 {
        let offsets = self.member_offsets(members);
        match (members.last(), offsets.last()) {
            (Some(member), Some(offset)) => offset + self.for_member(member).size(&member.ty),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(name: &str, ty: Ty) -> Member {
        Member {
            name: name.to_string(),
            ty,
            offset: None,
            row_major: None,
        }
    }

    fn basic(name: &str) -> Ty {
        Ty::Basic(name.to_string())
    }

    fn array(element: Ty, len: u32) -> Ty {
        Ty::Array(Box::new(element), Some(len))
    }

    const STD140: Layout = Layout {
        packing: Packing::Std140,
        row_major: false,
    };
    const STD430: Layout = Layout {
        packing: Packing::Std430,
        row_major: false,
    };

    #[test]
    fn std140_rounds_arrays_to_vec4() {
        let members = [
            member("tint", basic("vec4")),
            member("time", basic("float")),
            member("offsets", array(basic("vec2"), 3)),
            member("scale", basic("vec3")),
            member("bias", basic("float")),
        ];
        assert_eq!(STD140.member_offsets(&members), [0, 16, 32, 80, 92]);
        assert_eq!(STD140.members_end(&members), 96);
        assert_eq!(STD140.array_stride(&basic("float")), 16);
    }

    #[test]
    fn std430_packs_arrays_tightly() {
        let members = [
            member("time", basic("float")),
            member("offsets", array(basic("vec2"), 3)),
        ];
        assert_eq!(STD430.member_offsets(&members), [0, 8]);
        assert_eq!(STD430.array_stride(&basic("float")), 4);
    }

    #[test]
    fn matrices_follow_majority() {
        assert_eq!(STD140.size(&basic("mat4")), 64);
        assert_eq!(STD140.size(&basic("mat3")), 48);
        assert_eq!(STD430.size(&basic("mat2")), 16);
        assert_eq!(STD140.size(&basic("mat2")), 32);
        let row_major = Layout {
            row_major: true,
            ..STD140
        };
        // Two rows of vec3 padded to vec4.
        assert_eq!(row_major.size(&basic("mat3x2")), 32);
        assert_eq!(STD140.size(&basic("mat3x2")), 48);
    }

    #[test]
    fn structs_align_to_their_widest_member() {
        let light = Rc::new(StructTy {
            name: "Light".to_string(),
            members: vec![member("col", basic("vec3")), member("k", basic("float"))],
        });
        let ty = Ty::Struct(light);
        assert_eq!(STD140.size(&ty), 16);
        assert_eq!(STD140.array_stride(&ty), 16);

        let members = [
            member("flag", basic("float")),
            member("light", ty),
        ];
        assert_eq!(STD140.member_offsets(&members), [0, 16]);
    }

    #[test]
    fn explicit_offsets_win() {
        let mut second = member("b", basic("float"));
        second.offset = Some(32);
        let members = [member("a", basic("float")), second, member("c", basic("float"))];
        assert_eq!(STD430.member_offsets(&members), [0, 32, 36]);
    }
}
