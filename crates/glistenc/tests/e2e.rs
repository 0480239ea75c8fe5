//! End-to-end pipeline tests through the public `compile` entry point.

use glisten_common::diag::DiagnosticKind;
use glisten_parser::FileAccess;
use glistenc::{compile, type_check, Options, RenameSymbols};

fn compile_one(source: &str) -> glistenc::CompileOutput {
    compile(&[("shader.glsl", source)], &Options::default())
}

#[test]
fn minimal_export() {
    let output = compile_one("export void main() { gl_FragColor = vec4(1.0); }");
    let result = output.result.expect("compiles cleanly");

    assert_eq!(result.shaders.len(), 1);
    assert_eq!(result.shaders[0].name, "main");
    assert_eq!(result.shaders[0].contents, "void main(){gl_FragColor=vec4(1.0);}");
    // Only `main` exists and it kept its name.
    assert!(result.renaming.is_empty());
}

#[test]
fn compile_returns_nothing_on_errors() {
    let output = compile_one("export void main() { gl_FragColor = vec4(1.0) }"); // missing ;
    assert!(output.result.is_none());
    assert!(output.compilation.log.has_errors());
}

#[test]
fn swizzle_validation() {
    let output = compile_one("void f() { vec2 a; float b = a.xyz.x; }");
    assert!(output.result.is_none());
    let kinds: Vec<_> = output
        .compilation
        .log
        .diagnostics()
        .iter()
        .map(|d| d.kind)
        .collect();
    assert_eq!(kinds, vec![DiagnosticKind::BadSwizzle]);
}

#[test]
fn overload_resolution_end_to_end() {
    let ok = compile_one(
        "float g(int i) { return 1.0; }\n\
         float g(float x) { return 2.0; }\n\
         export void main() { gl_FragColor = vec4(g(1), g(1.0), 0.0, 1.0); }\n",
    );
    assert!(ok.result.is_some(), "{:?}", ok.compilation.log.diagnostics());

    let bad = compile_one(
        "float g(int i) { return 1.0; }\n\
         float g(float x) { return 2.0; }\n\
         export void main() { gl_FragColor = vec4(g(true)); }\n",
    );
    assert!(bad.result.is_none());
    assert_eq!(
        bad.compilation.log.diagnostics()[0].kind,
        DiagnosticKind::NoMatchingOverload
    );
}

#[test]
fn dead_code_elimination() {
    let output =
        compile_one("export void main() { if (false) { discard; } gl_FragColor = vec4(0.0); }");
    let result = output.result.expect("compiles cleanly");
    let contents = &result.shaders[0].contents;
    assert!(!contents.contains("if"), "{contents}");
    assert!(!contents.contains("discard"), "{contents}");
    assert_eq!(contents, "void main(){gl_FragColor=vec4(0.0);}");
}

#[test]
fn include_cycle_is_reported() {
    let access: &FileAccess = &|_includer, path| {
        let contents = match path {
            "a.glsl" => "#include \"b.glsl\"\n",
            "b.glsl" => "#include \"a.glsl\"\n",
            _ => return None,
        };
        Some((path.to_string(), contents.to_string()))
    };
    let options = Options {
        file_access: Some(access),
        ..Options::default()
    };
    let output = compile(&[("a.glsl", "#include \"b.glsl\"\n")], &options);
    assert!(output.result.is_none());
    assert!(output
        .compilation
        .log
        .diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::IncludeCycle));
}

#[test]
fn include_resolves_through_the_callback() {
    let access: &FileAccess = &|_includer, path| {
        (path == "lib.glsl").then(|| {
            (
                "lib.glsl".to_string(),
                "float half_of(float x) { return x * 0.5; }\n".to_string(),
            )
        })
    };
    let options = Options {
        file_access: Some(access),
        ..Options::default()
    };
    let output = compile(
        &[(
            "shader.glsl",
            "#include \"lib.glsl\"\nexport void main() { gl_FragColor = vec4(half_of(1.0)); }\n",
        )],
        &options,
    );
    assert!(
        output.result.is_some(),
        "{:?}",
        output.compilation.log.diagnostics()
    );
}

#[test]
fn two_exports_share_one_renamed_helper() {
    let output = compile_one(
        "float brightness(vec3 c) { return dot(c, vec3(1.0)); }\n\
         export void vertex() { gl_Position = vec4(brightness(vec3(1.0))); }\n\
         export void fragment() { gl_FragColor = vec4(brightness(vec3(0.5))); }\n",
    );
    let result = output.result.expect("compiles cleanly");
    assert_eq!(result.shaders.len(), 2);
    assert_eq!(result.shaders[0].name, "vertex");
    assert_eq!(result.shaders[1].name, "fragment");

    // The helper has exactly one entry in the rename map, and both
    // shaders define a function by that name.
    let renamed = result.renaming.get("brightness").expect("helper renamed");
    for shader in &result.shaders {
        assert!(
            shader.contents.contains(&format!("float {renamed}(")),
            "{}",
            shader.contents
        );
        assert!(shader.contents.contains("void main()"), "{}", shader.contents);
    }
    // Each entry point was renamed to `main`.
    assert_eq!(result.renaming.get("vertex"), Some(&"main".to_string()));
    assert_eq!(result.renaming.get("fragment"), Some(&"main".to_string()));
}

#[test]
fn unused_uniforms_are_trimmed_per_export() {
    let output = compile_one(
        "uniform vec4 tint;\n\
         uniform vec4 only_vertex;\n\
         export void vertex() { gl_Position = only_vertex; }\n\
         export void fragment() { gl_FragColor = tint; }\n",
    );
    let result = output.result.expect("compiles cleanly");
    let vertex = &result.shaders[0].contents;
    let fragment = &result.shaders[1].contents;

    let tint = result.renaming.get("tint").expect("tint renamed");
    let only_vertex = result.renaming.get("only_vertex").expect("renamed");
    assert!(vertex.contains(&format!("vec4 {only_vertex};")), "{vertex}");
    assert!(!vertex.contains(&format!("vec4 {tint};")), "{vertex}");
    assert!(fragment.contains(&format!("vec4 {tint};")), "{fragment}");
    assert!(
        !fragment.contains(&format!("vec4 {only_vertex};")),
        "{fragment}"
    );
}

#[test]
fn renaming_none_keeps_every_name() {
    let options = Options {
        rename_symbols: RenameSymbols::None,
        ..Options::default()
    };
    let output = compile(
        &[(
            "shader.glsl",
            "float helper(float x) { return x; }\nexport void entry() { gl_FragColor = vec4(helper(1.0)); }\n",
        )],
        &options,
    );
    let result = output.result.expect("compiles cleanly");
    assert!(result.renaming.is_empty());
    assert!(result.shaders[0].contents.contains("helper"));
    assert!(result.shaders[0].contents.contains("entry"));
}

#[test]
fn pretty_print_without_rewriting() {
    let options = Options {
        compact_syntax_tree: false,
        remove_whitespace: false,
        rename_symbols: RenameSymbols::None,
        trim_symbols: false,
        ..Options::default()
    };
    let output = compile(
        &[(
            "shader.glsl",
            "export void main() { if (true) { gl_FragColor = vec4(1.0); } }",
        )],
        &options,
    );
    let result = output.result.expect("compiles cleanly");
    let contents = &result.shaders[0].contents;
    // Not rewritten: the `if (true)` is still there, pretty-printed.
    assert!(contents.contains("if (true) {"), "{contents}");
    assert!(contents.contains("  gl_FragColor = vec4(1.0);"), "{contents}");
}

#[test]
fn directives_survive_the_pipeline() {
    let output = compile_one(
        "#version 100\n\
         #extension GL_OES_standard_derivatives : enable\n\
         precision mediump float;\n\
         export void main() { gl_FragColor = vec4(fwidth(0.5)); }\n",
    );
    let result = output.result.expect("compiles cleanly");
    let contents = &result.shaders[0].contents;
    assert!(contents.starts_with("#version 100\n"), "{contents}");
    assert!(
        contents.contains("#extension GL_OES_standard_derivatives : enable\n"),
        "{contents}"
    );
    assert!(contents.contains("precision mediump float;"), "{contents}");
}

#[test]
fn type_check_reports_without_compiling() {
    let comp = type_check(
        &[("shader.glsl", "void f() { int x = 1.0; }")],
        &Options::default(),
    );
    assert!(comp.log.has_errors());
    assert_eq!(comp.log.diagnostics()[0].kind, DiagnosticKind::TypeMismatch);
}

#[test]
fn json_packaging_round_trips_through_serde() {
    let output = compile_one("export void main() { gl_FragColor = vec4(1.0); }");
    let result = output.result.expect("compiles cleanly");
    let text = glistenc::output::format_result(&result, glistenc::output::OutputFormat::Json);
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(parsed["shaders"][0]["name"], "main");
    assert_eq!(
        parsed["shaders"][0]["contents"],
        "void main(){gl_FragColor=vec4(1.0);}"
    );
}
