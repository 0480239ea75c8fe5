use glisten_common::diag::{DiagnosticKind, Log};
use glisten_common::source::SourceId;
use glisten_common::token::TokenKind;
use glisten_lexer::{Lexer, TokenizePurpose};

/// Tokenize and return (kind, lexeme) pairs for easy assertions.
fn lex(source: &str) -> Vec<(TokenKind, String)> {
    let (tokens, log) = lex_with_log(source, TokenizePurpose::Compile);
    assert!(
        !log.has_errors(),
        "unexpected lex errors: {:?}",
        log.diagnostics()
    );
    tokens
}

fn lex_with_log(source: &str, purpose: TokenizePurpose) -> (Vec<(TokenKind, String)>, Log) {
    let mut log = Log::new();
    let tokens = Lexer::tokenize(SourceId(0), source, purpose, &mut log);
    let out = tokens
        .iter()
        .map(|t| {
            let span = t.range.span;
            (t.kind, source[span.start as usize..span.end as usize].to_string())
        })
        .collect();
    (out, log)
}

#[test]
fn keywords_and_identifiers() {
    let tokens = lex("uniform vec4 color;");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::Uniform, "uniform".into()),
            (TokenKind::Vec4, "vec4".into()),
            (TokenKind::Identifier, "color".into()),
            (TokenKind::Semicolon, ";".into()),
            (TokenKind::Eof, "".into()),
        ]
    );
}

#[test]
fn all_six_float_shapes() {
    let tokens = lex("1.0 1. .5 1e3 1.5e-3 .5e+2");
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::FloatLiteral,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[4].1, "1.5e-3");
}

#[test]
fn int_shapes() {
    let tokens = lex("42 017 0xFF 0");
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::IntLiteral,
            TokenKind::IntLiteral,
            TokenKind::IntLiteral,
            TokenKind::IntLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn exponent_needs_digits() {
    // `1e` is the int `1` followed by the identifier `e`.
    let tokens = lex("1e");
    assert_eq!(
        tokens,
        vec![
            (TokenKind::IntLiteral, "1".into()),
            (TokenKind::Identifier, "e".into()),
            (TokenKind::Eof, "".into()),
        ]
    );
}

#[test]
fn maximal_munch_operators() {
    let tokens = lex("<<= << <= < ++ += + ^^ ^= >>=");
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::LtLtEq,
            TokenKind::LtLt,
            TokenKind::LtEq,
            TokenKind::Lt,
            TokenKind::PlusPlus,
            TokenKind::PlusEq,
            TokenKind::Plus,
            TokenKind::CaretCaret,
            TokenKind::CaretEq,
            TokenKind::GtGtEq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn adjacent_operators_without_spaces() {
    let tokens = lex("a+++b");
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    // Greedy: `a ++ + b`.
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::PlusPlus,
            TokenKind::Plus,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_attach_as_trivia_when_compiling() {
    let mut log = Log::new();
    let tokens = Lexer::tokenize(
        SourceId(0),
        "/* a */ // b\nfoo",
        TokenizePurpose::Compile,
        &mut log,
    );
    assert_eq!(tokens.len(), 2); // foo, eof
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(tokens[0].comments.len(), 2);
    assert!(tokens[1].comments.is_empty());
}

#[test]
fn trailing_comments_attach_to_eof() {
    let mut log = Log::new();
    let tokens = Lexer::tokenize(
        SourceId(0),
        "foo // trailing",
        TokenizePurpose::Compile,
        &mut log,
    );
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[1].kind, TokenKind::Eof);
    assert_eq!(tokens[1].comments.len(), 1);
}

#[test]
fn comments_are_tokens_when_formatting() {
    let (tokens, log) = lex_with_log("/* a */ foo // b", TokenizePurpose::Format);
    assert!(!log.has_errors());
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::MultiLineComment,
            TokenKind::Identifier,
            TokenKind::SingleLineComment,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn reserved_word_is_reported_and_dropped() {
    let (tokens, log) = lex_with_log("goto x;", TokenizePurpose::Compile);
    assert_eq!(log.error_count(), 1);
    assert_eq!(log.diagnostics()[0].kind, DiagnosticKind::ReservedWord);
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    // The reserved word itself is gone; lexing continued.
    assert_eq!(
        kinds,
        vec![TokenKind::Identifier, TokenKind::Semicolon, TokenKind::Eof]
    );
}

#[test]
fn unknown_character_is_fatal() {
    let (tokens, log) = lex_with_log("a @ b", TokenizePurpose::Compile);
    assert_eq!(log.error_count(), 1);
    assert_eq!(log.diagnostics()[0].kind, DiagnosticKind::Syntax);
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    // Lexing stopped at `@`, but the stream still ends with Eof.
    assert_eq!(kinds, vec![TokenKind::Identifier, TokenKind::Eof]);
}

#[test]
fn unterminated_block_comment_is_fatal() {
    let (tokens, log) = lex_with_log("/* nope", TokenizePurpose::Compile);
    assert_eq!(log.error_count(), 1);
    assert_eq!(tokens.last().map(|(k, _)| *k), Some(TokenKind::Eof));
}

#[test]
fn directives() {
    let source = "#version 300\n#extension GL_OES_standard_derivatives : enable\n#pragma optimize(off)\n#include \"util.glsl\"";
    let tokens = lex(source);
    let kinds: Vec<_> = tokens.iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Version,
            TokenKind::IntLiteral,
            TokenKind::Extension,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::Pragma,
            TokenKind::Include,
            TokenKind::StringLiteral,
            TokenKind::Eof,
        ]
    );
    // Pragmas keep their whole line verbatim.
    assert_eq!(tokens[6].1, "#pragma optimize(off)");
    assert_eq!(tokens[8].1, "\"util.glsl\"");
}

#[test]
fn token_ranges_reconstruct_the_source() {
    let source = "void f() { /* hi */ gl_FragColor = vec4(1.0); }";
    let mut log = Log::new();
    let tokens = Lexer::tokenize(SourceId(0), source, TokenizePurpose::Format, &mut log);
    assert!(!log.has_errors());

    // Tokens are in order and non-overlapping, and the gaps between them
    // contain only whitespace (format purpose keeps comments as tokens).
    let mut pos = 0u32;
    for token in &tokens {
        let span = token.range.span;
        assert!(span.start >= pos, "tokens must not overlap");
        let gap = &source[pos as usize..span.start as usize];
        assert!(
            gap.chars().all(char::is_whitespace),
            "gap {gap:?} must be pure whitespace"
        );
        assert_eq!(
            span.len() as usize,
            source[span.start as usize..span.end as usize].len()
        );
        pos = span.end;
    }
    let tail = &source[pos as usize..];
    assert!(tail.chars().all(char::is_whitespace));
}

#[test]
fn tokenize_is_deterministic() {
    let source = "export void main() { gl_FragColor = vec4(1.0); }";
    let mut log_a = Log::new();
    let mut log_b = Log::new();
    let a = Lexer::tokenize(SourceId(0), source, TokenizePurpose::Compile, &mut log_a);
    let b = Lexer::tokenize(SourceId(0), source, TokenizePurpose::Compile, &mut log_b);
    assert_eq!(a, b);
}
