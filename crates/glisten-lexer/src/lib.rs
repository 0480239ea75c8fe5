// Glisten lexer -- tokenizer for the Glisten shading language.

mod scanner;

use glisten_common::diag::{DiagnosticKind, Log};
use glisten_common::source::{Range, SourceId, Span};
use glisten_common::token::{is_reserved_word, keyword_from_str, Token, TokenKind};
use scanner::Scanner;

/// What the token stream is for.
///
/// Compilation discards whitespace and attaches comments as trivia to the
/// next non-comment token. Formatting tools need the comments as real
/// tokens so they can be printed back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizePurpose {
    Compile,
    Format,
}

/// The Glisten lexer. Converts one source text into a stream of tokens.
///
/// Maximal-munch: multi-character operators are tried before their
/// prefixes, and numeric literals swallow every shape the language allows.
/// A synthesized `Eof` token always terminates the stream, carrying any
/// trailing comment trivia.
pub struct Lexer<'src> {
    scanner: Scanner<'src>,
    id: SourceId,
    purpose: TokenizePurpose,
    /// Comment spans waiting to be attached to the next real token.
    pending_comments: Vec<Span>,
}

/// Outcome of one lexing step.
enum Step {
    Tok(Token),
    /// Nothing to emit (trivia recorded, or an erroneous token dropped).
    Skip,
    /// Unrecoverable lexical error: stop, the stream ends with `Eof`.
    Fatal,
}

impl<'src> Lexer<'src> {
    /// Tokenize an entire source. Diagnostics go into `log`; the returned
    /// stream always ends with an `Eof` token.
    pub fn tokenize(
        id: SourceId,
        source: &'src str,
        purpose: TokenizePurpose,
        log: &mut Log,
    ) -> Vec<Token> {
        let lexer = Lexer {
            scanner: Scanner::new(source),
            id,
            purpose,
            pending_comments: Vec::new(),
        };
        lexer.run(log)
    }

    fn run(mut self, log: &mut Log) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.scanner.pos();
            if self.scanner.is_at_end() {
                tokens.push(self.make(TokenKind::Eof, start));
                break;
            }
            match self.next_token(start, log) {
                Step::Tok(token) => tokens.push(token),
                Step::Skip => {}
                Step::Fatal => {
                    let pos = self.scanner.pos();
                    tokens.push(self.make(TokenKind::Eof, pos));
                    break;
                }
            }
        }
        tokens
    }

    /// Finish a token spanning from `start` to the current position,
    /// attaching any pending comment trivia.
    fn make(&mut self, kind: TokenKind, start: u32) -> Token {
        let mut token = Token::new(kind, Range::new(self.id, start, self.scanner.pos()));
        token.comments = std::mem::take(&mut self.pending_comments);
        token
    }

    fn range(&self, start: u32) -> Range {
        Range::new(self.id, start, self.scanner.pos())
    }

    /// Skip whitespace. Newlines are not significant in the shading
    /// language outside of directives, and directives are handled by
    /// consuming to end of line where needed.
    fn skip_whitespace(&mut self) {
        self.scanner
            .eat_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'));
    }

    fn next_token(&mut self, start: u32, log: &mut Log) -> Step {
        let byte = self.scanner.peek().expect("next_token called at eof");
        match byte {
            // ── Comments and division ──────────────────────────────────
            b'/' if self.scanner.peek_at(1) == Some(b'/') => self.lex_line_comment(start),
            b'/' if self.scanner.peek_at(1) == Some(b'*') => self.lex_block_comment(start, log),
            b'/' => self.lex_with_eq(TokenKind::Slash, TokenKind::SlashEq, start),

            // ── Number literals ────────────────────────────────────────
            b'0'..=b'9' => self.lex_number(start, log),
            b'.' if self.scanner.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.lex_number(start, log)
            }

            // ── Identifiers and keywords ───────────────────────────────
            b if is_identifier_start(b) => self.lex_identifier(start, log),

            // ── Directives ─────────────────────────────────────────────
            b'#' => self.lex_directive(start),

            // ── String literals (include paths) ────────────────────────
            b'"' => self.lex_string(start, log),

            // ── Operators and delimiters ───────────────────────────────
            b'+' => self.lex_plus(start),
            b'-' => self.lex_minus(start),
            b'*' => self.lex_with_eq(TokenKind::Star, TokenKind::StarEq, start),
            b'%' => self.lex_with_eq(TokenKind::Percent, TokenKind::PercentEq, start),
            b'=' => self.lex_with_eq(TokenKind::Eq, TokenKind::EqEq, start),
            b'!' => self.lex_with_eq(TokenKind::Bang, TokenKind::NotEq, start),
            b'<' => self.lex_lt(start),
            b'>' => self.lex_gt(start),
            b'&' => self.lex_amp(start),
            b'|' => self.lex_pipe(start),
            b'^' => self.lex_caret(start),
            b'~' => self.single(TokenKind::Tilde, start),
            b'?' => self.single(TokenKind::Question, start),
            b':' => self.single(TokenKind::Colon, start),
            b';' => self.single(TokenKind::Semicolon, start),
            b',' => self.single(TokenKind::Comma, start),
            b'.' => self.single(TokenKind::Dot, start),
            b'(' => self.single(TokenKind::LParen, start),
            b')' => self.single(TokenKind::RParen, start),
            b'[' => self.single(TokenKind::LBracket, start),
            b']' => self.single(TokenKind::RBracket, start),
            b'{' => self.single(TokenKind::LBrace, start),
            b'}' => self.single(TokenKind::RBrace, start),

            // ── Anything else is fatal ─────────────────────────────────
            _ => {
                let c = self.scanner.current_char().unwrap_or('\u{FFFD}');
                self.scanner.bump_char();
                log.error(
                    DiagnosticKind::Syntax,
                    format!("syntax error {c:?}"),
                    self.range(start),
                );
                Step::Fatal
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Consume one byte and return a token of the given kind.
    fn single(&mut self, kind: TokenKind, start: u32) -> Step {
        self.scanner.bump();
        Step::Tok(self.make(kind, start))
    }

    /// Consume one byte, then an optional `=`: `*` vs `*=` and friends.
    fn lex_with_eq(&mut self, plain: TokenKind, with_eq: TokenKind, start: u32) -> Step {
        self.scanner.bump();
        if self.scanner.peek() == Some(b'=') {
            self.scanner.bump();
            Step::Tok(self.make(with_eq, start))
        } else {
            Step::Tok(self.make(plain, start))
        }
    }

    // ── Operator lexing ────────────────────────────────────────────────

    /// `+` -> `Plus`, `++` -> `PlusPlus`, `+=` -> `PlusEq`
    fn lex_plus(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'+') => self.single(TokenKind::PlusPlus, start),
            Some(b'=') => self.single(TokenKind::PlusEq, start),
            _ => Step::Tok(self.make(TokenKind::Plus, start)),
        }
    }

    /// `-` -> `Minus`, `--` -> `MinusMinus`, `-=` -> `MinusEq`
    fn lex_minus(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'-') => self.single(TokenKind::MinusMinus, start),
            Some(b'=') => self.single(TokenKind::MinusEq, start),
            _ => Step::Tok(self.make(TokenKind::Minus, start)),
        }
    }

    /// `<` -> `Lt`, `<=` -> `LtEq`, `<<` -> `LtLt`, `<<=` -> `LtLtEq`
    fn lex_lt(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'=') => self.single(TokenKind::LtEq, start),
            Some(b'<') => self.lex_with_eq(TokenKind::LtLt, TokenKind::LtLtEq, start),
            _ => Step::Tok(self.make(TokenKind::Lt, start)),
        }
    }

    /// `>` -> `Gt`, `>=` -> `GtEq`, `>>` -> `GtGt`, `>>=` -> `GtGtEq`
    fn lex_gt(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'=') => self.single(TokenKind::GtEq, start),
            Some(b'>') => self.lex_with_eq(TokenKind::GtGt, TokenKind::GtGtEq, start),
            _ => Step::Tok(self.make(TokenKind::Gt, start)),
        }
    }

    /// `&` -> `Amp`, `&&` -> `AmpAmp`, `&=` -> `AmpEq`
    fn lex_amp(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'&') => self.single(TokenKind::AmpAmp, start),
            Some(b'=') => self.single(TokenKind::AmpEq, start),
            _ => Step::Tok(self.make(TokenKind::Amp, start)),
        }
    }

    /// `|` -> `Pipe`, `||` -> `PipePipe`, `|=` -> `PipeEq`
    fn lex_pipe(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'|') => self.single(TokenKind::PipePipe, start),
            Some(b'=') => self.single(TokenKind::PipeEq, start),
            _ => Step::Tok(self.make(TokenKind::Pipe, start)),
        }
    }

    /// `^` -> `Caret`, `^^` -> `CaretCaret`, `^=` -> `CaretEq`
    fn lex_caret(&mut self, start: u32) -> Step {
        self.scanner.bump();
        match self.scanner.peek() {
            Some(b'^') => self.single(TokenKind::CaretCaret, start),
            Some(b'=') => self.single(TokenKind::CaretEq, start),
            _ => Step::Tok(self.make(TokenKind::Caret, start)),
        }
    }

    // ── Comments ───────────────────────────────────────────────────────

    /// `// ...` to end of line.
    fn lex_line_comment(&mut self, start: u32) -> Step {
        self.scanner.eat_while(|b| b != b'\n' && b != b'\r');
        self.finish_comment(TokenKind::SingleLineComment, start)
    }

    /// `/* ... */`. An unterminated block comment is a fatal syntax error.
    fn lex_block_comment(&mut self, start: u32, log: &mut Log) -> Step {
        self.scanner.bump(); // /
        self.scanner.bump(); // *
        loop {
            match self.scanner.bump() {
                None => {
                    log.error(
                        DiagnosticKind::Syntax,
                        "unterminated comment",
                        self.range(start),
                    );
                    return Step::Fatal;
                }
                Some(b'*') if self.scanner.peek() == Some(b'/') => {
                    self.scanner.bump();
                    break;
                }
                Some(_) => {}
            }
        }
        self.finish_comment(TokenKind::MultiLineComment, start)
    }

    /// Compile purpose attaches the comment to the next token; format
    /// purpose emits it as a token of its own.
    fn finish_comment(&mut self, kind: TokenKind, start: u32) -> Step {
        match self.purpose {
            TokenizePurpose::Compile => {
                let span = Span::new(start, self.scanner.pos());
                self.pending_comments.push(span);
                Step::Skip
            }
            TokenizePurpose::Format => Step::Tok(self.make(kind, start)),
        }
    }

    // ── Literals ───────────────────────────────────────────────────────

    /// Lex an int or float literal.
    ///
    /// Floats come in six shapes (`1.0`, `1.`, `.5`, `1e3`, `1.5e-3`,
    /// `.5e+2`); ints are decimal, octal (leading zero), or hex (`0x`).
    fn lex_number(&mut self, start: u32, log: &mut Log) -> Step {
        if self.scanner.peek() == Some(b'0')
            && matches!(self.scanner.peek_at(1), Some(b'x') | Some(b'X'))
        {
            self.scanner.bump();
            self.scanner.bump();
            self.scanner.eat_while(|b| b.is_ascii_hexdigit());
            return Step::Tok(self.make(TokenKind::IntLiteral, start));
        }

        let mut is_float = false;
        self.scanner.eat_while(|b| b.is_ascii_digit());
        if self.scanner.peek() == Some(b'.') {
            is_float = true;
            self.scanner.bump();
            self.scanner.eat_while(|b| b.is_ascii_digit());
        }

        // An exponent only counts when digits actually follow it;
        // otherwise `1e` is the int `1` and the identifier `e`.
        if matches!(self.scanner.peek(), Some(b'e') | Some(b'E')) {
            let has_exponent = match self.scanner.peek_at(1) {
                Some(b) if b.is_ascii_digit() => true,
                Some(b'+') | Some(b'-') => {
                    self.scanner.peek_at(2).is_some_and(|b| b.is_ascii_digit())
                }
                _ => false,
            };
            if has_exponent {
                is_float = true;
                self.scanner.bump(); // e
                if matches!(self.scanner.peek(), Some(b'+') | Some(b'-')) {
                    self.scanner.bump();
                }
                self.scanner.eat_while(|b| b.is_ascii_digit());
            }
        }

        if is_float {
            return Step::Tok(self.make(TokenKind::FloatLiteral, start));
        }

        let text = self.scanner.lexeme(start, self.scanner.pos());
        if text.len() > 1 && text.starts_with('0') && text.bytes().any(|b| b > b'7') {
            log.error(
                DiagnosticKind::Syntax,
                format!("invalid octal literal \"{text}\""),
                self.range(start),
            );
            return Step::Skip;
        }
        Step::Tok(self.make(TokenKind::IntLiteral, start))
    }

    /// Lex an identifier, keyword, or reserved word.
    ///
    /// Reserved words are reported and dropped; lexing continues.
    fn lex_identifier(&mut self, start: u32, log: &mut Log) -> Step {
        self.scanner.eat_while(is_identifier_continue);
        let text = self.scanner.lexeme(start, self.scanner.pos());
        if let Some(keyword) = keyword_from_str(text) {
            return Step::Tok(self.make(keyword, start));
        }
        if is_reserved_word(text) {
            log.error(
                DiagnosticKind::ReservedWord,
                format!("\"{text}\" is a reserved word"),
                self.range(start),
            );
            return Step::Skip;
        }
        Step::Tok(self.make(TokenKind::Identifier, start))
    }

    /// Lex a `#word` directive.
    ///
    /// `#version`, `#extension`, and `#include` get their own kinds and
    /// their arguments lex as ordinary tokens. Any other directive is a
    /// pragma preserved verbatim, so its lexeme covers the whole line.
    fn lex_directive(&mut self, start: u32) -> Step {
        self.scanner.bump(); // #
        self.scanner.eat_while(is_identifier_continue);
        let word = self.scanner.lexeme(start, self.scanner.pos());
        let kind = match word {
            "#version" => TokenKind::Version,
            "#extension" => TokenKind::Extension,
            "#include" => TokenKind::Include,
            _ => {
                self.scanner.eat_while(|b| b != b'\n' && b != b'\r');
                TokenKind::Pragma
            }
        };
        Step::Tok(self.make(kind, start))
    }

    /// Lex a string literal. Only `#include` paths use these; there are no
    /// escape sequences. An unterminated string is fatal.
    fn lex_string(&mut self, start: u32, log: &mut Log) -> Step {
        self.scanner.bump(); // opening quote
        loop {
            match self.scanner.bump() {
                Some(b'"') => return Step::Tok(self.make(TokenKind::StringLiteral, start)),
                None | Some(b'\n') => {
                    log.error(
                        DiagnosticKind::Syntax,
                        "unterminated string literal",
                        self.range(start),
                    );
                    return Step::Fatal;
                }
                Some(_) => {}
            }
        }
    }
}

fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

fn is_identifier_continue(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

// ── Literal decoding ───────────────────────────────────────────────────

/// Decode an int literal lexeme (decimal, octal, or hex) into a wrapped
/// 32-bit value. Called once when the literal node is built; the value is
/// carried on the node from then on.
pub fn decode_int_literal(text: &str) -> i32 {
    let (digits, radix) = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
    {
        (hex, 16u32)
    } else if text.len() > 1 && text.starts_with('0') {
        (&text[1..], 8)
    } else {
        (text, 10)
    };
    let mut value: u32 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix).unwrap_or(0);
        value = value.wrapping_mul(radix).wrapping_add(digit);
    }
    value as i32
}

/// Decode a float literal lexeme into its value.
pub fn decode_float_literal(text: &str) -> f64 {
    // `1.e2` is a valid shading-language float but not a valid Rust one.
    let normalized = text.replace(".e", "e").replace(".E", "E");
    normalized.parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_decimal_int() {
        assert_eq!(decode_int_literal("0"), 0);
        assert_eq!(decode_int_literal("42"), 42);
        assert_eq!(decode_int_literal("2147483647"), i32::MAX);
        // Wraps two's-complement past i32::MAX.
        assert_eq!(decode_int_literal("2147483648"), i32::MIN);
    }

    #[test]
    fn decode_octal_int() {
        assert_eq!(decode_int_literal("017"), 15);
        assert_eq!(decode_int_literal("07"), 7);
    }

    #[test]
    fn decode_hex_int() {
        assert_eq!(decode_int_literal("0xFF"), 255);
        assert_eq!(decode_int_literal("0x0"), 0);
        assert_eq!(decode_int_literal("0xFFFFFFFF"), -1);
    }

    #[test]
    fn decode_float_shapes() {
        assert_eq!(decode_float_literal("1.0"), 1.0);
        assert_eq!(decode_float_literal("1."), 1.0);
        assert_eq!(decode_float_literal(".5"), 0.5);
        assert_eq!(decode_float_literal("1e3"), 1000.0);
        assert_eq!(decode_float_literal("1.5e-3"), 0.0015);
        assert_eq!(decode_float_literal(".5e+2"), 50.0);
        assert_eq!(decode_float_literal("1.e2"), 100.0);
    }
}
