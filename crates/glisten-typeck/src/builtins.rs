//! The synthesized built-in API source.
//!
//! The built-in variables and functions of the shading language are
//! expressed as ordinary declarations in a generated `<api>` source and
//! run through the normal parser; every symbol it creates is tagged
//! NATIVE. That set is the entire built-in vocabulary: nothing else is
//! implicitly known, and NATIVE symbols are never renamed, rewritten, or
//! emitted.

use glisten_parser::Compilation;

/// Register the built-in API into a fresh compilation. Call before
/// parsing any user source.
pub fn register(comp: &mut Compilation) {
    let api = api_source();
    let id = comp.sources.add("<api>", api);
    glisten_parser::parse_native(comp, id);
    debug_assert!(
        !comp.log.has_errors(),
        "the builtin API must parse cleanly: {:?}",
        comp.log.diagnostics()
    );
}

/// Expand `genType` patterns over the float scalar/vector family.
fn gen_type(out: &mut String, pattern: &str) {
    for ty in ["float", "vec2", "vec3", "vec4"] {
        out.push_str(&pattern.replace("genType", ty));
        out.push('\n');
    }
}

/// Expand `genType` patterns over the vector types only. Used for the
/// float-second-operand variants, whose scalar instance would otherwise
/// collide with the plain `genType` overload.
fn gen_vec(out: &mut String, pattern: &str) {
    for ty in ["vec2", "vec3", "vec4"] {
        out.push_str(&pattern.replace("genType", ty));
        out.push('\n');
    }
}

/// Expand `N` over the vector dimensions 2..4.
fn per_dimension(out: &mut String, pattern: &str) {
    for n in ["2", "3", "4"] {
        out.push_str(&pattern.replace('N', n));
        out.push('\n');
    }
}

fn api_source() -> String {
    let mut api = String::new();

    // ── Built-in variables and constants ───────────────────────────────
    api.push_str(
        "struct gl_DepthRangeParameters { float near; float far; float diff; };\n\
         uniform gl_DepthRangeParameters gl_DepthRange;\n\
         vec4 gl_Position;\n\
         float gl_PointSize;\n\
         vec4 gl_FragCoord;\n\
         bool gl_FrontFacing;\n\
         vec2 gl_PointCoord;\n\
         vec4 gl_FragColor;\n\
         vec4 gl_FragData[4];\n\
         const int gl_MaxVertexAttribs = 8;\n\
         const int gl_MaxVertexUniformVectors = 128;\n\
         const int gl_MaxVaryingVectors = 8;\n\
         const int gl_MaxVertexTextureImageUnits = 0;\n\
         const int gl_MaxCombinedTextureImageUnits = 8;\n\
         const int gl_MaxTextureImageUnits = 8;\n\
         const int gl_MaxFragmentUniformVectors = 16;\n\
         const int gl_MaxDrawBuffers = 1;\n",
    );

    // ── Angle and trigonometry ─────────────────────────────────────────
    gen_type(&mut api, "genType radians(genType x);");
    gen_type(&mut api, "genType degrees(genType x);");
    gen_type(&mut api, "genType sin(genType x);");
    gen_type(&mut api, "genType cos(genType x);");
    gen_type(&mut api, "genType tan(genType x);");
    gen_type(&mut api, "genType asin(genType x);");
    gen_type(&mut api, "genType acos(genType x);");
    gen_type(&mut api, "genType atan(genType y, genType x);");
    gen_type(&mut api, "genType atan(genType x);");

    // ── Exponential ────────────────────────────────────────────────────
    gen_type(&mut api, "genType pow(genType x, genType y);");
    gen_type(&mut api, "genType exp(genType x);");
    gen_type(&mut api, "genType log(genType x);");
    gen_type(&mut api, "genType exp2(genType x);");
    gen_type(&mut api, "genType log2(genType x);");
    gen_type(&mut api, "genType sqrt(genType x);");
    gen_type(&mut api, "genType inversesqrt(genType x);");

    // ── Common ─────────────────────────────────────────────────────────
    gen_type(&mut api, "genType abs(genType x);");
    gen_type(&mut api, "genType sign(genType x);");
    gen_type(&mut api, "genType floor(genType x);");
    gen_type(&mut api, "genType ceil(genType x);");
    gen_type(&mut api, "genType fract(genType x);");
    gen_type(&mut api, "genType mod(genType x, genType y);");
    gen_vec(&mut api, "genType mod(genType x, float y);");
    gen_type(&mut api, "genType min(genType x, genType y);");
    gen_vec(&mut api, "genType min(genType x, float y);");
    gen_type(&mut api, "genType max(genType x, genType y);");
    gen_vec(&mut api, "genType max(genType x, float y);");
    gen_type(&mut api, "genType clamp(genType x, genType lo, genType hi);");
    gen_vec(&mut api, "genType clamp(genType x, float lo, float hi);");
    gen_type(&mut api, "genType mix(genType x, genType y, genType t);");
    gen_vec(&mut api, "genType mix(genType x, genType y, float t);");
    gen_type(&mut api, "genType step(genType edge, genType x);");
    gen_vec(&mut api, "genType step(float edge, genType x);");
    gen_type(&mut api, "genType smoothstep(genType lo, genType hi, genType x);");
    gen_vec(&mut api, "genType smoothstep(float lo, float hi, genType x);");

    // ── Geometric ──────────────────────────────────────────────────────
    gen_type(&mut api, "float length(genType x);");
    gen_type(&mut api, "float distance(genType a, genType b);");
    gen_type(&mut api, "float dot(genType a, genType b);");
    api.push_str("vec3 cross(vec3 a, vec3 b);\n");
    gen_type(&mut api, "genType normalize(genType x);");
    gen_type(&mut api, "genType faceforward(genType n, genType i, genType nref);");
    gen_type(&mut api, "genType reflect(genType i, genType n);");
    gen_type(&mut api, "genType refract(genType i, genType n, float eta);");

    // ── Matrix ─────────────────────────────────────────────────────────
    per_dimension(&mut api, "matN matrixCompMult(matN a, matN b);");

    // ── Vector relational ──────────────────────────────────────────────
    per_dimension(&mut api, "bvecN lessThan(vecN a, vecN b);");
    per_dimension(&mut api, "bvecN lessThan(ivecN a, ivecN b);");
    per_dimension(&mut api, "bvecN lessThanEqual(vecN a, vecN b);");
    per_dimension(&mut api, "bvecN lessThanEqual(ivecN a, ivecN b);");
    per_dimension(&mut api, "bvecN greaterThan(vecN a, vecN b);");
    per_dimension(&mut api, "bvecN greaterThan(ivecN a, ivecN b);");
    per_dimension(&mut api, "bvecN greaterThanEqual(vecN a, vecN b);");
    per_dimension(&mut api, "bvecN greaterThanEqual(ivecN a, ivecN b);");
    per_dimension(&mut api, "bvecN equal(vecN a, vecN b);");
    per_dimension(&mut api, "bvecN equal(ivecN a, ivecN b);");
    per_dimension(&mut api, "bvecN equal(bvecN a, bvecN b);");
    per_dimension(&mut api, "bvecN notEqual(vecN a, vecN b);");
    per_dimension(&mut api, "bvecN notEqual(ivecN a, ivecN b);");
    per_dimension(&mut api, "bvecN notEqual(bvecN a, bvecN b);");
    per_dimension(&mut api, "bool any(bvecN x);");
    per_dimension(&mut api, "bool all(bvecN x);");
    per_dimension(&mut api, "bvecN not(bvecN x);");

    // ── Texture lookup ─────────────────────────────────────────────────
    api.push_str(
        "vec4 texture2D(sampler2D s, vec2 p);\n\
         vec4 texture2D(sampler2D s, vec2 p, float bias);\n\
         vec4 texture2DProj(sampler2D s, vec3 p);\n\
         vec4 texture2DProj(sampler2D s, vec3 p, float bias);\n\
         vec4 texture2DProj(sampler2D s, vec4 p);\n\
         vec4 texture2DProj(sampler2D s, vec4 p, float bias);\n\
         vec4 texture2DLod(sampler2D s, vec2 p, float lod);\n\
         vec4 texture2DProjLod(sampler2D s, vec3 p, float lod);\n\
         vec4 texture2DProjLod(sampler2D s, vec4 p, float lod);\n\
         vec4 textureCube(samplerCube s, vec3 p);\n\
         vec4 textureCube(samplerCube s, vec3 p, float bias);\n\
         vec4 textureCubeLod(samplerCube s, vec3 p, float lod);\n",
    );

    // ── Derivatives (GL_OES_standard_derivatives) ──────────────────────
    gen_type(&mut api, "genType dFdx(genType x);");
    gen_type(&mut api, "genType dFdy(genType x);");
    gen_type(&mut api, "genType fwidth(genType x);");

    api
}

#[cfg(test)]
mod tests {
    use super::*;
    use glisten_parser::symbol::SymbolFlags;

    #[test]
    fn api_parses_cleanly_and_is_native() {
        let mut comp = Compilation::new();
        register(&mut comp);
        assert!(!comp.log.has_errors(), "{:?}", comp.log.diagnostics());

        // Spot-check a few well-known symbols.
        for name in ["gl_FragColor", "sin", "texture2D", "mix", "gl_DepthRange"] {
            let symbol = comp
                .symbols
                .iter()
                .find(|s| s.name == name)
                .unwrap_or_else(|| panic!("missing builtin {name:?}"));
            assert!(symbol.flags.contains(SymbolFlags::NATIVE), "{name} not native");
        }
    }

    #[test]
    fn sin_has_four_overloads() {
        let mut comp = Compilation::new();
        register(&mut comp);
        let head = comp.scopes.find(comp.global_scope, "sin").unwrap();
        let mut count = 0;
        let mut cursor = Some(head);
        while let Some(current) = cursor {
            count += 1;
            cursor = comp.symbols[current].overload;
        }
        assert_eq!(count, 4);
    }
}
