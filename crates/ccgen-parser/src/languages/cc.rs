//! C/C++ include extraction using tree-sitter

use ccgen_core::{Includes, SourceInfo};
use tree_sitter::Node;

/// Collect `#include` directives and entry-point presence from a parsed tree.
pub fn extract_source_info(root: Node, source: &[u8]) -> SourceInfo {
    let mut info = SourceInfo::default();
    visit_node(root, source, &mut info);
    info
}

fn visit_node(node: Node, source: &[u8], info: &mut SourceInfo) {
    match node.kind() {
        "preproc_include" => {
            extract_include(node, source, &mut info.includes);
            return;
        }
        "function_definition" => {
            if is_main_definition(node, source) {
                info.has_main = true;
            }
            // Nested includes inside function bodies are still visited below.
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(child, source, info);
    }
}

fn extract_include(node: Node, source: &[u8], includes: &mut Includes) {
    let Some(path) = node.child_by_field_name("path") else {
        return;
    };
    let Ok(text) = path.utf8_text(source) else {
        return;
    };
    match path.kind() {
        "string_literal" => {
            let header = text.trim().trim_matches('"');
            if !header.is_empty() {
                includes.double_quote.push(header.to_string());
            }
        }
        "system_lib_string" => {
            let header = text.trim().trim_start_matches('<').trim_end_matches('>');
            if !header.is_empty() {
                includes.bracket.push(header.to_string());
            }
        }
        // Macro-expanded include paths cannot be resolved without a preprocessor.
        _ => {}
    }
}

/// `int main(...) { ... }` at any nesting level of the preprocessor tree.
fn is_main_definition(node: Node, source: &[u8]) -> bool {
    let returns_int = node
        .child_by_field_name("type")
        .and_then(|t| t.utf8_text(source).ok())
        .is_some_and(|t| t == "int");
    if !returns_int {
        return false;
    }
    let Some(declarator) = node.child_by_field_name("declarator") else {
        return false;
    };
    if declarator.kind() != "function_declarator" {
        return false;
    }
    declarator
        .child_by_field_name("declarator")
        .filter(|name| name.kind() == "identifier")
        .and_then(|name| name.utf8_text(source).ok())
        .is_some_and(|name| name == "main")
}
