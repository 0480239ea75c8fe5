use serde::Serialize;

use crate::source::{Range, Span};

/// A token produced by the Glisten lexer.
///
/// Comment trivia is carried on the next non-comment token; the `Eof` token
/// carries any trailing comments of the file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range,
    /// Spans of comments preceding this token (compile purpose only).
    pub comments: Vec<Span>,
}

impl Token {
    /// Create a new token with no attached trivia.
    pub fn new(kind: TokenKind, range: Range) -> Self {
        Self {
            kind,
            range,
            comments: Vec::new(),
        }
    }
}

/// Every kind of token in the shading language.
///
/// Covers the GLSL ES keyword set plus the non-standard `export`/`import`
/// extension keywords, all operators, literals, preprocessor directives,
/// comments (format purpose), identifiers, and the end-of-file marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords (44) ──────────────────────────────────────────────────
    Attribute,
    Bool,
    Break,
    BVec2,
    BVec3,
    BVec4,
    Const,
    Continue,
    Discard,
    Do,
    Else,
    Export,
    False,
    Float,
    For,
    Highp,
    If,
    Import,
    In,
    Inout,
    Int,
    Invariant,
    IVec2,
    IVec3,
    IVec4,
    Lowp,
    Mat2,
    Mat3,
    Mat4,
    Mediump,
    Out,
    Precision,
    Return,
    Sampler2D,
    SamplerCube,
    Struct,
    True,
    Uniform,
    Varying,
    Vec2,
    Vec3,
    Vec4,
    Void,
    While,

    // ── Operators ──────────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `^^`
    CaretCaret,
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `<<`
    LtLt,
    /// `>>`
    GtGt,
    /// `=`
    Eq,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `<<=`
    LtLtEq,
    /// `>>=`
    GtGtEq,
    /// `&=`
    AmpEq,
    /// `|=`
    PipeEq,
    /// `^=`
    CaretEq,
    /// `?`
    Question,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,

    // ── Delimiters ─────────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // ── Literals and identifiers ───────────────────────────────────────
    /// Integer literal: decimal, octal (`017`), or hexadecimal (`0xFF`).
    IntLiteral,
    /// Floating-point literal in any of its six shapes.
    FloatLiteral,
    /// String literal (used by `#include "path"`).
    StringLiteral,
    /// Regular identifier.
    Identifier,

    // ── Preprocessor directives ────────────────────────────────────────
    /// `#version`
    Version,
    /// `#extension`
    Extension,
    /// `#include`
    Include,
    /// Any other `#word` directive; the lexeme covers the whole line.
    Pragma,

    // ── Comments (format purpose only) ─────────────────────────────────
    /// `// ...`
    SingleLineComment,
    /// `/* ... */`
    MultiLineComment,

    // ── Special ────────────────────────────────────────────────────────
    /// End of file.
    Eof,
}

impl TokenKind {
    /// Whether this keyword names a constructible type (scalar, vector,
    /// matrix). Sampler types are opaque and have no constructor.
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Void
                | TokenKind::Bool
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::BVec2
                | TokenKind::BVec3
                | TokenKind::BVec4
                | TokenKind::IVec2
                | TokenKind::IVec3
                | TokenKind::IVec4
                | TokenKind::Vec2
                | TokenKind::Vec3
                | TokenKind::Vec4
                | TokenKind::Mat2
                | TokenKind::Mat3
                | TokenKind::Mat4
                | TokenKind::Sampler2D
                | TokenKind::SamplerCube
        )
    }

    /// Whether this token is a comment (format purpose).
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::SingleLineComment | TokenKind::MultiLineComment
        )
    }
}

/// All keyword spellings, for the renamer blacklist.
pub const KEYWORDS: &[&str] = &[
    "attribute",
    "bool",
    "break",
    "bvec2",
    "bvec3",
    "bvec4",
    "const",
    "continue",
    "discard",
    "do",
    "else",
    "export",
    "false",
    "float",
    "for",
    "highp",
    "if",
    "import",
    "in",
    "inout",
    "int",
    "invariant",
    "ivec2",
    "ivec3",
    "ivec4",
    "lowp",
    "mat2",
    "mat3",
    "mat4",
    "mediump",
    "out",
    "precision",
    "return",
    "sampler2D",
    "samplerCube",
    "struct",
    "true",
    "uniform",
    "varying",
    "vec2",
    "vec3",
    "vec4",
    "void",
    "while",
];

/// Words reserved by the shading language for future use. Using one is an
/// error, and the renamer must never generate one. `default` is not in
/// this table: it names an `#extension` behavior, so it must lex as an
/// ordinary identifier.
pub const RESERVED_WORDS: &[&str] = &[
    "asm",
    "cast",
    "class",
    "double",
    "dvec2",
    "dvec3",
    "dvec4",
    "enum",
    "extern",
    "external",
    "fixed",
    "flat",
    "fvec2",
    "fvec3",
    "fvec4",
    "goto",
    "half",
    "hvec2",
    "hvec3",
    "hvec4",
    "inline",
    "input",
    "interface",
    "long",
    "namespace",
    "noinline",
    "output",
    "packed",
    "public",
    "sampler1D",
    "sampler1DShadow",
    "sampler2DRect",
    "sampler2DRectShadow",
    "sampler2DShadow",
    "sampler3D",
    "sampler3DRect",
    "short",
    "sizeof",
    "static",
    "superp",
    "switch",
    "template",
    "this",
    "typedef",
    "union",
    "unsigned",
    "using",
    "volatile",
];

/// Look up a keyword from its string representation.
///
/// Returns `Some(TokenKind)` if the string is a shading-language keyword
/// (including the `export`/`import` extensions), `None` otherwise. The lexer
/// calls this to distinguish keywords from identifiers after scanning an
/// identifier-shaped lexeme.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "attribute" => Some(TokenKind::Attribute),
        "bool" => Some(TokenKind::Bool),
        "break" => Some(TokenKind::Break),
        "bvec2" => Some(TokenKind::BVec2),
        "bvec3" => Some(TokenKind::BVec3),
        "bvec4" => Some(TokenKind::BVec4),
        "const" => Some(TokenKind::Const),
        "continue" => Some(TokenKind::Continue),
        "discard" => Some(TokenKind::Discard),
        "do" => Some(TokenKind::Do),
        "else" => Some(TokenKind::Else),
        "export" => Some(TokenKind::Export),
        "false" => Some(TokenKind::False),
        "float" => Some(TokenKind::Float),
        "for" => Some(TokenKind::For),
        "highp" => Some(TokenKind::Highp),
        "if" => Some(TokenKind::If),
        "import" => Some(TokenKind::Import),
        "in" => Some(TokenKind::In),
        "inout" => Some(TokenKind::Inout),
        "int" => Some(TokenKind::Int),
        "invariant" => Some(TokenKind::Invariant),
        "ivec2" => Some(TokenKind::IVec2),
        "ivec3" => Some(TokenKind::IVec3),
        "ivec4" => Some(TokenKind::IVec4),
        "lowp" => Some(TokenKind::Lowp),
        "mat2" => Some(TokenKind::Mat2),
        "mat3" => Some(TokenKind::Mat3),
        "mat4" => Some(TokenKind::Mat4),
        "mediump" => Some(TokenKind::Mediump),
        "out" => Some(TokenKind::Out),
        "precision" => Some(TokenKind::Precision),
        "return" => Some(TokenKind::Return),
        "sampler2D" => Some(TokenKind::Sampler2D),
        "samplerCube" => Some(TokenKind::SamplerCube),
        "struct" => Some(TokenKind::Struct),
        "true" => Some(TokenKind::True),
        "uniform" => Some(TokenKind::Uniform),
        "varying" => Some(TokenKind::Varying),
        "vec2" => Some(TokenKind::Vec2),
        "vec3" => Some(TokenKind::Vec3),
        "vec4" => Some(TokenKind::Vec4),
        "void" => Some(TokenKind::Void),
        "while" => Some(TokenKind::While),
        _ => None,
    }
}

/// Whether the string is a reserved word.
pub fn is_reserved_word(s: &str) -> bool {
    RESERVED_WORDS.binary_search(&s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;

    #[test]
    fn keyword_lookup() {
        assert_eq!(keyword_from_str("vec4"), Some(TokenKind::Vec4));
        assert_eq!(keyword_from_str("export"), Some(TokenKind::Export));
        assert_eq!(keyword_from_str("samplerCube"), Some(TokenKind::SamplerCube));
        assert_eq!(keyword_from_str("main"), None);
        assert_eq!(keyword_from_str("Vec4"), None); // case-sensitive
    }

    #[test]
    fn keyword_table_matches_lookup() {
        for kw in KEYWORDS {
            assert!(
                keyword_from_str(kw).is_some(),
                "KEYWORDS entry {kw:?} must be recognized by keyword_from_str"
            );
        }
        assert_eq!(KEYWORDS.len(), 44);
    }

    #[test]
    fn reserved_words_are_sorted_for_binary_search() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }

    #[test]
    fn reserved_word_lookup() {
        assert!(is_reserved_word("goto"));
        assert!(is_reserved_word("sampler3D"));
        assert!(!is_reserved_word("vec4"));
        assert!(!is_reserved_word("foo"));
    }

    #[test]
    fn type_keyword_classification() {
        assert!(TokenKind::Vec4.is_type_keyword());
        assert!(TokenKind::Mat3.is_type_keyword());
        assert!(TokenKind::Sampler2D.is_type_keyword());
        assert!(!TokenKind::Uniform.is_type_keyword());
        assert!(!TokenKind::Identifier.is_type_keyword());
    }

    #[test]
    fn token_new_has_no_trivia() {
        let tok = Token::new(TokenKind::Vec4, Range::new(SourceId(0), 0, 4));
        assert!(tok.comments.is_empty());
        assert_eq!(tok.range.span.len(), 4);
    }
}
