use glisten_common::diag::DiagnosticKind;
use glisten_common::ids::NodeId;
use glisten_common::ty::Type;
use glisten_parser::ast::NodeKind;
use glisten_parser::symbol::{Symbol, SymbolFlags};
use glisten_parser::Compilation;

fn parse_source(source: &str) -> Compilation {
    let mut comp = Compilation::new();
    let id = comp.sources.add("test.glsl", source);
    glisten_parser::parse(&mut comp, id, None);
    comp
}

fn find_symbol<'a>(comp: &'a Compilation, name: &str) -> &'a Symbol {
    comp.symbols
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("no symbol named {name:?}"))
}

fn find_nodes(comp: &Compilation, kind: NodeKind) -> Vec<NodeId> {
    let mut out = Vec::new();
    comp.ast.visit(comp.global_node, &mut |id| {
        if comp.ast[id].kind == kind {
            out.push(id);
        }
    });
    out
}

#[test]
fn global_variable_declaration() {
    let comp = parse_source("uniform vec4 color;");
    assert!(!comp.log.has_errors());

    let globals = comp.ast.children(comp.global_node);
    assert_eq!(globals.len(), 1);
    assert_eq!(comp.ast[globals[0]].kind, NodeKind::Variables);

    let color = find_symbol(&comp, "color");
    assert_eq!(color.ty, Type::Vec4);
    assert!(color.flags.contains(SymbolFlags::UNIFORM));
}

#[test]
fn prototype_and_definition_are_siblings() {
    let comp = parse_source("float f(float x);\nfloat f(float x) { return x; }");
    assert!(!comp.log.has_errors());

    let functions = find_nodes(&comp, NodeKind::Function);
    assert_eq!(functions.len(), 2);

    let proto = comp.ast[functions[0]].symbol.unwrap();
    let def = comp.ast[functions[1]].symbol.unwrap();
    assert_eq!(comp.symbols[proto].sibling, Some(def));
    assert_eq!(comp.symbols[def].sibling, Some(proto));

    // The scope binding was upgraded to the definition.
    assert_eq!(comp.scopes.find(comp.global_scope, "f"), Some(def));
}

#[test]
fn overloads_form_a_chain() {
    let comp = parse_source("float g(int i);\nfloat g(float x);");
    assert!(!comp.log.has_errors());

    let head = comp.scopes.find(comp.global_scope, "g").unwrap();
    let next = comp.symbols[head].overload.expect("overload link");
    assert_eq!(comp.symbols[head].name, "g");
    assert_eq!(comp.symbols[next].name, "g");
    // One takes an int, the other a float.
    let head_param = comp.symbols[head].parameters[0];
    let next_param = comp.symbols[next].parameters[0];
    assert_eq!(comp.symbols[head_param].ty, Type::Int);
    assert_eq!(comp.symbols[next_param].ty, Type::Float);
}

#[test]
fn duplicate_definition_is_reported() {
    let comp = parse_source("void f() {}\nvoid f() {}");
    assert_eq!(comp.log.error_count(), 1);
    assert_eq!(
        comp.log.diagnostics()[0].kind,
        DiagnosticKind::RedefinedSymbol
    );
}

#[test]
fn export_marks_the_following_function() {
    let comp = parse_source("export void main() {}");
    assert!(!comp.log.has_errors());
    let main = find_symbol(&comp, "main");
    assert!(main.flags.contains(SymbolFlags::EXPORTED));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let comp = parse_source("void f() { int x = 1 + 2 * 3; }");
    assert!(!comp.log.has_errors());

    let adds = find_nodes(&comp, NodeKind::Add);
    assert_eq!(adds.len(), 1);
    let add = adds[0];
    let rhs = comp.ast.child(add, 1);
    assert_eq!(comp.ast[rhs].kind, NodeKind::Multiply);
}

#[test]
fn hook_binds_tighter_than_assignment() {
    let comp = parse_source("void f() { int x; x = true ? 1 : 2; }");
    assert!(!comp.log.has_errors());

    let assigns = find_nodes(&comp, NodeKind::Assign);
    assert_eq!(assigns.len(), 1);
    let rhs = comp.ast.child(assigns[0], 1);
    assert_eq!(comp.ast[rhs].kind, NodeKind::Hook);
}

#[test]
fn comma_expressions_flatten_into_one_sequence() {
    let comp = parse_source("void f() { int a; int b; int c; a, b, c; }");
    assert!(!comp.log.has_errors());

    let sequences = find_nodes(&comp, NodeKind::Sequence);
    assert_eq!(sequences.len(), 1);
    assert_eq!(comp.ast.children(sequences[0]).len(), 3);
}

#[test]
fn names_resolve_at_parse_time() {
    let comp = parse_source("void f() { int x; x; }");
    assert!(!comp.log.has_errors());

    let names = find_nodes(&comp, NodeKind::Name);
    let reference = *names.last().unwrap();
    let symbol = comp.ast[reference].symbol.expect("resolved");
    assert_eq!(comp.symbols[symbol].name, "x");
}

#[test]
fn undefined_name_is_reported_once() {
    let comp = parse_source("void f() { y; }");
    assert_eq!(comp.log.error_count(), 1);
    assert_eq!(
        comp.log.diagnostics()[0].kind,
        DiagnosticKind::UndefinedSymbol
    );
}

#[test]
fn parser_recovers_after_a_bad_statement() {
    let comp = parse_source("void f() { int x = ; }\nvoid g() {}");
    assert!(comp.log.has_errors());
    // The error did not stop the rest of the file from parsing.
    let g = find_symbol(&comp, "g");
    assert!(g.is_function());
}

#[test]
fn struct_definition_collects_fields() {
    let comp = parse_source("struct Light { vec3 position; float intensity; };");
    assert!(!comp.log.has_errors());

    let light = find_symbol(&comp, "Light");
    assert!(light.is_struct());
    assert_eq!(light.fields.len(), 2);
    assert_eq!(comp.symbols[light.fields[0]].name, "position");
    assert_eq!(comp.symbols[light.fields[1]].ty, Type::Float);
    assert_eq!(light.ty, Type::Struct(light.id));
}

#[test]
fn struct_name_is_usable_as_a_type() {
    let comp = parse_source("struct S { float x; };\nvoid f() { S s; }");
    assert!(!comp.log.has_errors());

    let s_type = find_symbol(&comp, "S").id;
    let local = find_symbol(&comp, "s");
    assert_eq!(local.ty, Type::Struct(s_type));
}

#[test]
fn modifier_block_applies_its_qualifier() {
    let comp = parse_source("uniform { vec4 a; vec4 b; }");
    assert!(!comp.log.has_errors());

    let blocks = find_nodes(&comp, NodeKind::ModifierBlock);
    assert_eq!(blocks.len(), 1);
    assert_eq!(comp.ast.children(blocks[0]).len(), 2);
    assert!(find_symbol(&comp, "a").flags.contains(SymbolFlags::UNIFORM));
    assert!(find_symbol(&comp, "b").flags.contains(SymbolFlags::UNIFORM));
}

#[test]
fn for_initializer_scope_does_not_leak() {
    let comp = parse_source("void f() { for (int i = 0; ; ) {} int i = 1; }");
    // No redefinition error: the loop's `i` lives in its own scope.
    assert!(!comp.log.has_errors());
}

#[test]
fn version_directive_is_recorded() {
    let comp = parse_source("#version 100\nvoid f() {}");
    assert!(!comp.log.has_errors());
    assert_eq!(comp.version, Some(100));
    assert_eq!(find_nodes(&comp, NodeKind::Version).len(), 1);
}

#[test]
fn version_after_code_is_an_error() {
    let comp = parse_source("void f() {}\n#version 100");
    assert_eq!(comp.log.error_count(), 1);
    assert_eq!(comp.log.diagnostics()[0].kind, DiagnosticKind::Syntax);
}

#[test]
fn extension_updates_the_behavior_map() {
    use glisten_parser::ExtensionBehavior;
    let comp = parse_source("#extension GL_OES_standard_derivatives : enable\nvoid f() {}");
    assert!(!comp.log.has_errors());
    assert_eq!(
        comp.extensions.get("GL_OES_standard_derivatives"),
        Some(&ExtensionBehavior::Enable)
    );
}

#[test]
fn extension_default_behavior_is_recorded() {
    use glisten_parser::ExtensionBehavior;
    let comp = parse_source("#extension GL_EXT_frag_depth : default\n");
    assert!(!comp.log.has_errors(), "{:?}", comp.log.diagnostics());
    assert_eq!(
        comp.extensions.get("GL_EXT_frag_depth"),
        Some(&ExtensionBehavior::Default)
    );
}

#[test]
fn unknown_extension_behavior_is_reported() {
    let comp = parse_source("#extension GL_OES_standard_derivatives : maybe\n");
    assert_eq!(comp.log.error_count(), 1);
    assert_eq!(
        comp.log.diagnostics()[0].kind,
        DiagnosticKind::UnsupportedExtension
    );
}

#[test]
fn include_splices_declarations_in_place() {
    let mut comp = Compilation::new();
    let id = comp
        .sources
        .add("main.glsl", "#include \"lib.glsl\"\nvoid f() { helper(); }");
    let access: &glisten_parser::FileAccess = &|_includer, path| {
        (path == "lib.glsl").then(|| ("lib.glsl".to_string(), "void helper() {}".to_string()))
    };
    glisten_parser::parse(&mut comp, id, Some(access));

    assert!(!comp.log.has_errors(), "{:?}", comp.log.diagnostics());
    // helper was defined before f used it.
    let helper = find_symbol(&comp, "helper");
    assert!(helper.is_function());
    let globals = comp.ast.children(comp.global_node);
    assert_eq!(comp.ast[globals[0]].kind, NodeKind::Function);
}

#[test]
fn include_cycles_are_detected() {
    let mut comp = Compilation::new();
    let id = comp.sources.add("a.glsl", "#include \"b.glsl\"\n");
    let access: &glisten_parser::FileAccess = &|_includer, path| {
        let contents = match path {
            "b.glsl" => "#include \"a.glsl\"\n",
            "a.glsl" => "#include \"b.glsl\"\n",
            _ => return None,
        };
        Some((path.to_string(), contents.to_string()))
    };
    glisten_parser::parse(&mut comp, id, Some(access));

    let cycle = comp
        .log
        .diagnostics()
        .iter()
        .find(|d| d.kind == DiagnosticKind::IncludeCycle)
        .expect("cycle diagnostic");
    // The cycle closes on a.glsl, so the diagnostic points at the
    // directive in a.glsl that the loop runs through.
    let source = comp.sources.get(cycle.range.source);
    assert_eq!(source.name, "a.glsl");
    assert_eq!(source.text(cycle.range.span), "#include \"b.glsl\"");
}

#[test]
fn array_declarators() {
    let comp = parse_source("uniform vec4 lights[4];\nvoid f() { float data[]; }");
    assert!(!comp.log.has_errors());
    assert_eq!(find_symbol(&comp, "lights").array_size, Some(Some(4)));
    assert_eq!(find_symbol(&comp, "data").array_size, Some(None));
}
