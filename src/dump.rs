//! Render an AST back to rep source in canonical form.
//!
//! The output parses back to an AST equal to the input. Directives are emitted
//! first, then enums, PODs and classes, each group in declaration order.
//! Since the AST does not record what a conditional enclosed, `#if`/`#endif`
//! pairs are hoisted to the top and no longer wrap their declarations.

use crate::ast::{Ast, Class};

const INDENT: &str = "    ";

/// Canonical rep text for a whole document.
pub fn to_source(ast: &Ast) -> String {
    let mut sections = Vec::new();
    if !ast.directives.is_empty() {
        sections.push(
            ast.directives
                .iter()
                .map(|d| format!("{}\n", d.text))
                .collect::<String>(),
        );
    }
    if !ast.enums.is_empty() {
        sections.push(ast.enums.iter().map(|e| format!("{}\n", e)).collect());
    }
    if !ast.pods.is_empty() {
        sections.push(ast.pods.iter().map(|p| format!("{}\n", p)).collect());
    }
    for class in &ast.classes {
        sections.push(class_source(class));
    }
    sections.join("\n")
}

/// Canonical rep text for one class, members grouped by kind.
pub fn class_source(class: &Class) -> String {
    let mut out = format!("class {}\n{{\n", class.name);
    for e in &class.enums {
        out.push_str(&format!("{}{}\n", INDENT, e));
    }
    for property in &class.properties {
        out.push_str(&format!("{}PROP({})\n", INDENT, property));
    }
    for slot in &class.slots {
        out.push_str(&format!("{}SLOT({})\n", INDENT, slot));
    }
    for signal in &class.signals {
        out.push_str(&format!("{}SIGNAL({})\n", INDENT, signal.signature()));
    }
    out.push_str("};\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn class_layout() {
        let ast = parse("class A {\nPROP(int x=1 READONLY)\nSLOT(ping(int))\nSIGNAL(done())\n}").expect("parse");
        assert_eq!(
            class_source(&ast.classes[0]),
            "class A\n{\n    PROP(int x = 1 READONLY)\n    SLOT(void ping(int __repc_variable_1))\n    SIGNAL(done())\n};\n"
        );
    }

    #[test]
    fn empty_ast_is_empty_text() {
        assert_eq!(to_source(&Ast::default()), "");
    }

    #[test]
    fn directives_are_hoisted_out_of_classes() {
        let ast = parse("class A\n{\n#if 1\nPROP(int a)\n#endif\n};").expect("parse");
        let text = to_source(&ast);
        assert_eq!(text, "#if 1\n#endif\n\nclass A\n{\n    PROP(int a)\n};\n");
        assert_eq!(parse(&text).expect("reparse"), ast);
    }

    #[test]
    fn sections_are_separated() {
        let ast = parse("#include \"a.h\"\nENUM E {x}\nPOD P(int a)\nclass C {}").expect("parse");
        assert_eq!(
            to_source(&ast),
            "#include \"a.h\"\n\nENUM E {x = 0}\n\nPOD P(int a)\n\nclass C\n{\n};\n"
        );
    }
}
