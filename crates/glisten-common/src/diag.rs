use std::fmt;

use serde::Serialize;

use crate::source::Range;

/// How bad a diagnostic is. Warnings never fail a compilation; a single
/// error makes `compile` return nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// The closed set of diagnostic kinds the compiler can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// Tokenizer or parser could not make sense of the input.
    Syntax,
    /// A reserved word was used as an identifier.
    ReservedWord,
    /// A name did not resolve in any enclosing scope.
    UndefinedSymbol,
    /// A name was defined twice in the same scope.
    RedefinedSymbol,
    /// Two types that should agree do not.
    TypeMismatch,
    /// A swizzle mixed alphabets, repeated where it must not, or indexed
    /// past the vector length.
    BadSwizzle,
    /// A constructor call with the wrong component count or argument types.
    BadConstructor,
    /// More than one overload matched a call exactly.
    AmbiguousCall,
    /// No overload matched a call.
    NoMatchingOverload,
    /// An assignment target or out/inout argument is not an l-value.
    BadLValue,
    /// `break` or `continue` outside any loop.
    OutsideLoop,
    /// A `const` variable without a constant initializer.
    ConstNeedsLiteralInit,
    /// `#include` target could not be resolved.
    IncludeNotFound,
    /// `#include` chain revisited a source already being parsed.
    IncludeCycle,
    /// `#extension` with an unknown behavior.
    UnsupportedExtension,
    /// Advisory only (dead code, division by zero during folding).
    Warning,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::ReservedWord => "reservedWord",
            DiagnosticKind::UndefinedSymbol => "undefinedSymbol",
            DiagnosticKind::RedefinedSymbol => "redefinedSymbol",
            DiagnosticKind::TypeMismatch => "typeMismatch",
            DiagnosticKind::BadSwizzle => "badSwizzle",
            DiagnosticKind::BadConstructor => "badConstructor",
            DiagnosticKind::AmbiguousCall => "ambiguousCall",
            DiagnosticKind::NoMatchingOverload => "noMatchingOverload",
            DiagnosticKind::BadLValue => "badLValue",
            DiagnosticKind::OutsideLoop => "outsideLoop",
            DiagnosticKind::ConstNeedsLiteralInit => "constNeedsLiteralInit",
            DiagnosticKind::IncludeNotFound => "includeNotFound",
            DiagnosticKind::IncludeCycle => "includeCycle",
            DiagnosticKind::UnsupportedExtension => "unsupportedExtension",
            DiagnosticKind::Warning => "warning",
        };
        write!(f, "{name}")
    }
}

/// One reported problem: severity, kind, human-readable message, and the
/// offending range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub message: String,
    pub range: Range,
}

/// Append-only diagnostic log shared by every stage of a compilation.
///
/// Diagnostics are kept in the order discovered: tokenizer first, then
/// parser, resolver, and rewriter. Stages never throw; they log and keep
/// going over the partial tree.
#[derive(Debug, Default)]
pub struct Log {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, range: Range) {
        self.error_count += 1;
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            kind,
            message: message.into(),
            range,
        });
    }

    /// Record a warning.
    pub fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>, range: Range) {
        self.warning_count += 1;
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            range,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;

    fn range() -> Range {
        Range::new(SourceId(0), 0, 1)
    }

    #[test]
    fn log_counts_by_severity() {
        let mut log = Log::new();
        assert!(!log.has_errors());
        log.warning(DiagnosticKind::Warning, "dead code", range());
        assert!(!log.has_errors());
        log.error(DiagnosticKind::Syntax, "unexpected token", range());
        assert!(log.has_errors());
        assert_eq!(log.error_count(), 1);
        assert_eq!(log.warning_count(), 1);
        assert_eq!(log.diagnostics().len(), 2);
    }

    #[test]
    fn log_preserves_discovery_order() {
        let mut log = Log::new();
        log.error(DiagnosticKind::Syntax, "first", range());
        log.error(DiagnosticKind::UndefinedSymbol, "second", range());
        let kinds: Vec<_> = log.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::Syntax, DiagnosticKind::UndefinedSymbol]
        );
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(DiagnosticKind::BadSwizzle.to_string(), "badSwizzle");
        assert_eq!(DiagnosticKind::IncludeCycle.to_string(), "includeCycle");
        assert_eq!(
            DiagnosticKind::NoMatchingOverload.to_string(),
            "noMatchingOverload"
        );
    }
}
