//! Result packaging.
//!
//! Turns a [`CompilerResult`](crate::CompilerResult) into a JSON document
//! or into constant declarations for a host language. Constant names are
//! derived from the shader or symbol name by inserting `_` at every
//! lowercase-or-digit to uppercase boundary and uppercasing the whole
//! string.

use crate::CompilerResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Js,
    Skew,
    Cpp,
    Rust,
}

/// Render a result in the requested format.
pub fn format_result(result: &CompilerResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(result)
                .expect("a compiler result always serializes");
            text.push('\n');
            text
        }
        OutputFormat::Js => constants(result, |name, value| {
            format!("export const {name} = {value};\n")
        }),
        OutputFormat::Skew => constants(result, |name, value| {
            format!("const {name} = {value}\n")
        }),
        OutputFormat::Cpp => {
            let body = constants(result, |name, value| {
                format!("static const char *{name} = {value};\n")
            });
            format!("#ifndef GLSLX_STRINGS_H\n#define GLSLX_STRINGS_H\n\n{body}\n#endif\n")
        }
        OutputFormat::Rust => constants(result, |name, value| {
            format!("pub static {name}: &str = {value};\n")
        }),
    }
}

/// Emit `GLSLX_SOURCE_*` constants for every shader and `GLSLX_NAME_*`
/// constants for every renamed symbol.
fn constants(result: &CompilerResult, declare: impl Fn(&str, &str) -> String) -> String {
    let mut out = String::new();
    for shader in &result.shaders {
        let name = format!("GLSLX_SOURCE_{}", constant_case(&shader.name));
        let value = quote(&shader.contents);
        out.push_str(&declare(&name, &value));
    }
    for (original, renamed) in &result.renaming {
        let name = format!("GLSLX_NAME_{}", constant_case(original));
        let value = quote(renamed);
        out.push_str(&declare(&name, &value));
    }
    out
}

/// `fancyName` -> `FANCY_NAME`.
fn constant_case(name: &str) -> String {
    let mut out = String::new();
    let mut previous = '\0';
    for c in name.chars() {
        if c.is_ascii_uppercase() && (previous.is_ascii_lowercase() || previous.is_ascii_digit()) {
            out.push('_');
        }
        out.push(c.to_ascii_uppercase());
        previous = c;
    }
    out
}

fn quote(text: &str) -> String {
    serde_json::to_string(text).expect("a string always serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shader;
    use std::collections::BTreeMap;

    fn sample() -> CompilerResult {
        let mut renaming = BTreeMap::new();
        renaming.insert("helperName".to_string(), "a".to_string());
        CompilerResult {
            shaders: vec![Shader {
                name: "fancyMain2D".to_string(),
                contents: "void main(){}".to_string(),
            }],
            renaming,
        }
    }

    #[test]
    fn constant_case_inserts_underscores() {
        assert_eq!(constant_case("main"), "MAIN");
        assert_eq!(constant_case("fancyName"), "FANCY_NAME");
        assert_eq!(constant_case("shader2D"), "SHADER2_D");
        assert_eq!(constant_case("ALREADY"), "ALREADY");
    }

    #[test]
    fn json_has_two_space_indent_and_trailing_newline() {
        let text = format_result(&sample(), OutputFormat::Json);
        assert!(text.starts_with("{\n  \"shaders\""));
        assert!(text.ends_with("\n"));
        assert!(text.contains("\"helperName\": \"a\""));
    }

    #[test]
    fn js_constants() {
        let text = format_result(&sample(), OutputFormat::Js);
        assert!(text.contains("export const GLSLX_SOURCE_FANCY_MAIN2_D = \"void main(){}\";"));
        assert!(text.contains("export const GLSLX_NAME_HELPER_NAME = \"a\";"));
    }

    #[test]
    fn cpp_output_is_guarded() {
        let text = format_result(&sample(), OutputFormat::Cpp);
        assert!(text.starts_with("#ifndef GLSLX_STRINGS_H\n#define GLSLX_STRINGS_H\n"));
        assert!(text.trim_end().ends_with("#endif"));
        assert!(text.contains("static const char *GLSLX_SOURCE_FANCY_MAIN2_D"));
    }

    #[test]
    fn rust_output_uses_static_strs() {
        let text = format_result(&sample(), OutputFormat::Rust);
        assert!(text.contains("pub static GLSLX_SOURCE_FANCY_MAIN2_D: &str = \"void main(){}\";"));
    }
}
