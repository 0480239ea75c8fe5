use std::fmt;

use serde::Serialize;

use crate::ids::SymbolId;

/// A shading-language type.
///
/// The set is closed: scalars, vectors, matrices, the two opaque sampler
/// types, user-defined structs, and the `Error` type produced when checking
/// fails. Types are compared with `==`; struct types compare by declaration
/// identity (their defining symbol). Function signatures are not types here,
/// they live on function symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    BVec2,
    BVec3,
    BVec4,
    IVec2,
    IVec3,
    IVec4,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
    Sampler2D,
    SamplerCube,
    /// A user-defined struct, identified by its declaring symbol.
    Struct(SymbolId),
    /// The type of expressions that failed to check. Propagates silently.
    Error,
}

impl Type {
    /// Number of scalar components, used for constructor checking.
    /// Opaque, void, struct, and error types have no components.
    pub fn component_count(self) -> u32 {
        match self {
            Type::Bool | Type::Int | Type::Float => 1,
            Type::BVec2 | Type::IVec2 | Type::Vec2 => 2,
            Type::BVec3 | Type::IVec3 | Type::Vec3 => 3,
            Type::BVec4 | Type::IVec4 | Type::Vec4 => 4,
            Type::Mat2 => 4,
            Type::Mat3 => 9,
            Type::Mat4 => 16,
            _ => 0,
        }
    }

    /// The scalar type of one component. Matrices are float-based.
    pub fn component_type(self) -> Type {
        match self {
            Type::Bool | Type::BVec2 | Type::BVec3 | Type::BVec4 => Type::Bool,
            Type::Int | Type::IVec2 | Type::IVec3 | Type::IVec4 => Type::Int,
            Type::Float
            | Type::Vec2
            | Type::Vec3
            | Type::Vec4
            | Type::Mat2
            | Type::Mat3
            | Type::Mat4 => Type::Float,
            other => other,
        }
    }

    /// Build a scalar or vector type from a component type and a length.
    /// Length 1 returns the scalar itself.
    pub fn vector_of(component: Type, len: u32) -> Option<Type> {
        let ty = match (component, len) {
            (Type::Bool, 1) => Type::Bool,
            (Type::Bool, 2) => Type::BVec2,
            (Type::Bool, 3) => Type::BVec3,
            (Type::Bool, 4) => Type::BVec4,
            (Type::Int, 1) => Type::Int,
            (Type::Int, 2) => Type::IVec2,
            (Type::Int, 3) => Type::IVec3,
            (Type::Int, 4) => Type::IVec4,
            (Type::Float, 1) => Type::Float,
            (Type::Float, 2) => Type::Vec2,
            (Type::Float, 3) => Type::Vec3,
            (Type::Float, 4) => Type::Vec4,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_scalar(self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float)
    }

    pub fn is_vector(self) -> bool {
        matches!(
            self,
            Type::BVec2
                | Type::BVec3
                | Type::BVec4
                | Type::IVec2
                | Type::IVec3
                | Type::IVec4
                | Type::Vec2
                | Type::Vec3
                | Type::Vec4
        )
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, Type::Mat2 | Type::Mat3 | Type::Mat4)
    }

    pub fn is_sampler(self) -> bool {
        matches!(self, Type::Sampler2D | Type::SamplerCube)
    }

    /// Vector length, or matrix column/row dimension.
    pub fn vector_len(self) -> u32 {
        match self {
            Type::BVec2 | Type::IVec2 | Type::Vec2 | Type::Mat2 => 2,
            Type::BVec3 | Type::IVec3 | Type::Vec3 | Type::Mat3 => 3,
            Type::BVec4 | Type::IVec4 | Type::Vec4 | Type::Mat4 => 4,
            _ => 0,
        }
    }

    /// The result of indexing: a vector yields its component type, a matrix
    /// yields its column vector. Anything else yields `None`.
    pub fn index_result(self) -> Option<Type> {
        match self {
            Type::Mat2 => Some(Type::Vec2),
            Type::Mat3 => Some(Type::Vec3),
            Type::Mat4 => Some(Type::Vec4),
            ty if ty.is_vector() => Some(ty.component_type()),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Void => "void",
            Type::Bool => "bool",
            Type::Int => "int",
            Type::Float => "float",
            Type::BVec2 => "bvec2",
            Type::BVec3 => "bvec3",
            Type::BVec4 => "bvec4",
            Type::IVec2 => "ivec2",
            Type::IVec3 => "ivec3",
            Type::IVec4 => "ivec4",
            Type::Vec2 => "vec2",
            Type::Vec3 => "vec3",
            Type::Vec4 => "vec4",
            Type::Mat2 => "mat2",
            Type::Mat3 => "mat3",
            Type::Mat4 => "mat4",
            Type::Sampler2D => "sampler2D",
            Type::SamplerCube => "samplerCube",
            Type::Struct(_) => "struct",
            Type::Error => "<error>",
        };
        write!(f, "{name}")
    }
}

/// A literal value carried on a literal syntax node.
///
/// Numeric literals keep both the decoded value (for constant folding) and
/// the canonical text (for emission). Nothing is ever re-lexed from source
/// after tokenization; folded literals synthesize minimal text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Bool(bool),
    Int { value: i32, text: String },
    Float { value: f64, text: String },
    /// Verbatim text: string literals and preserved directive lines.
    Str(String),
}

impl Literal {
    /// An int literal with minimal decimal text, as produced by folding.
    pub fn int(value: i32) -> Literal {
        Literal::Int {
            value,
            text: value.to_string(),
        }
    }

    /// A float literal with minimal text, as produced by folding.
    ///
    /// The value must be finite: the shading language has no literal syntax
    /// for NaN or infinity, so folds producing those are abandoned upstream.
    pub fn float(value: f64) -> Literal {
        debug_assert!(value.is_finite());
        Literal::Float {
            value,
            text: format_float_minimal(value),
        }
    }
}

/// Format a float with the fewest characters that still lex as a float
/// literal: `1.0` rather than `1.000000`, `0.5` rather than `0.50`.
pub fn format_float_minimal(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') {
        text
    } else {
        // `{}` prints integral floats without a decimal point.
        format!("{text}.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_counts() {
        assert_eq!(Type::Float.component_count(), 1);
        assert_eq!(Type::Vec3.component_count(), 3);
        assert_eq!(Type::Mat3.component_count(), 9);
        assert_eq!(Type::Sampler2D.component_count(), 0);
        assert_eq!(Type::Void.component_count(), 0);
    }

    #[test]
    fn component_types() {
        assert_eq!(Type::BVec3.component_type(), Type::Bool);
        assert_eq!(Type::IVec2.component_type(), Type::Int);
        assert_eq!(Type::Mat4.component_type(), Type::Float);
        assert_eq!(Type::Float.component_type(), Type::Float);
    }

    #[test]
    fn vector_construction() {
        assert_eq!(Type::vector_of(Type::Float, 3), Some(Type::Vec3));
        assert_eq!(Type::vector_of(Type::Bool, 1), Some(Type::Bool));
        assert_eq!(Type::vector_of(Type::Int, 4), Some(Type::IVec4));
        assert_eq!(Type::vector_of(Type::Float, 5), None);
        assert_eq!(Type::vector_of(Type::Mat2, 2), None);
    }

    #[test]
    fn index_results() {
        assert_eq!(Type::Vec3.index_result(), Some(Type::Float));
        assert_eq!(Type::IVec2.index_result(), Some(Type::Int));
        assert_eq!(Type::Mat3.index_result(), Some(Type::Vec3));
        assert_eq!(Type::Float.index_result(), None);
    }

    #[test]
    fn struct_types_compare_by_declaration() {
        let a = Type::Struct(SymbolId(1));
        let b = Type::Struct(SymbolId(1));
        let c = Type::Struct(SymbolId(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn minimal_float_text() {
        assert_eq!(format_float_minimal(1.0), "1.0");
        assert_eq!(format_float_minimal(0.5), "0.5");
        assert_eq!(format_float_minimal(-2.0), "-2.0");
        assert_eq!(format_float_minimal(0.25), "0.25");
    }

    #[test]
    fn folded_literals_carry_minimal_text() {
        assert_eq!(
            Literal::int(7),
            Literal::Int {
                value: 7,
                text: "7".into()
            }
        );
        assert_eq!(
            Literal::float(2.0),
            Literal::Float {
                value: 2.0,
                text: "2.0".into()
            }
        );
    }
}
