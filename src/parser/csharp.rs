use std::fs;
use std::path::Path;
use tracing::{debug, trace};
use tree_sitter::{Node, Parser};

use crate::discovery::{
    Attribute, ClassDeclaration, Declaration, MethodDeclaration, OtherDeclaration,
};
use crate::element::Span;
use crate::error::{IoError, ParserError, Result};
use crate::utils::unquote_string;

/// Lowers C# syntax trees to the discovery declaration model.
pub struct CSharpParser {
    parser: Parser,
}

impl CSharpParser {
    pub fn new() -> std::result::Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .map_err(|_| ParserError::language_setup_failed("c_sharp"))?;
        Ok(Self { parser })
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<Declaration> {
        if !path.exists() {
            return Err(IoError::file_not_found(path).into());
        }
        let source = fs::read_to_string(path).map_err(|e| IoError::read_error(path, e))?;
        Ok(self.parse(&source, path)?)
    }

    pub fn parse(
        &mut self,
        source: &str,
        path: &Path,
    ) -> std::result::Result<Declaration, ParserError> {
        trace!(path = %path.display(), bytes = source.len(), "parsing");

        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParserError::parse_failed(path))?;
        let root = tree.root_node();
        if root.kind() != "compilation_unit" {
            return Err(ParserError::invalid_node_type("compilation_unit", root.kind()));
        }
        if root.has_error() {
            debug!(path = %path.display(), "source has syntax errors, lowering what parsed");
        }

        let lowering = Lowering {
            source: source.as_bytes(),
        };
        Ok(Declaration::root(lowering.compilation_unit(root)))
    }
}

/// Where a declaration sits: its namespace and, for nested members, the
/// enclosing type.
#[derive(Debug, Clone, Default)]
struct Scope {
    namespace: String,
    outer: Option<String>,
    outer_type_parameters: usize,
    /// Methods are only kept directly inside classes and records.
    in_class: bool,
}

impl Scope {
    fn namespace(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            ..Self::default()
        }
    }

    fn qualify_namespace(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.namespace, name)
        }
    }

    fn qualify_type(&self, segment: &str) -> String {
        match &self.outer {
            Some(outer) => format!("{outer}+{segment}"),
            None => self.qualify_namespace(segment),
        }
    }

    fn nested(&self, full_name: &str, type_parameters: usize, in_class: bool) -> Self {
        Self {
            namespace: self.namespace.clone(),
            outer: Some(full_name.to_string()),
            outer_type_parameters: type_parameters,
            in_class,
        }
    }
}

struct Lowering<'s> {
    source: &'s [u8],
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }

    fn field_text(&self, node: Node, field: &str) -> &'s str {
        node.child_by_field_name(field)
            .map(|n| self.text(n))
            .unwrap_or("")
    }

    fn compilation_unit(&self, node: Node) -> Vec<Declaration> {
        let mut top = Vec::new();
        let mut file_scoped: Option<(String, Vec<Declaration>)> = None;

        for child in named_children(node) {
            if child.kind() == "file_scoped_namespace_declaration" {
                let name = self.field_text(child, "name").to_string();
                let members = self.members(child, &Scope::namespace(&name));
                file_scoped = Some((name, members));
                continue;
            }

            // Older grammars leave file-scoped namespace members as siblings.
            match file_scoped.as_mut() {
                Some((name, members)) => {
                    members.extend(self.member(child, &Scope::namespace(name)))
                }
                None => top.extend(self.member(child, &Scope::default())),
            }
        }

        if let Some((name, members)) = file_scoped {
            top.push(Declaration::namespace(name, members));
        }
        top
    }

    fn members(&self, node: Node, scope: &Scope) -> Vec<Declaration> {
        named_children(node)
            .into_iter()
            .filter_map(|child| self.member(child, scope))
            .collect()
    }

    fn member(&self, node: Node, scope: &Scope) -> Option<Declaration> {
        match node.kind() {
            "namespace_declaration" => {
                let name = scope.qualify_namespace(self.field_text(node, "name"));
                let members = node
                    .child_by_field_name("body")
                    .map(|body| self.members(body, &Scope::namespace(&name)))
                    .unwrap_or_default();
                Some(Declaration::namespace(name, members))
            }
            "class_declaration" | "record_declaration" => Some(self.class(node, scope).into()),
            "struct_declaration" | "record_struct_declaration" | "interface_declaration" => {
                let (full_name, type_parameters) = self.type_name(node, scope);
                let inner = scope.nested(&full_name, type_parameters, false);
                let children = node
                    .child_by_field_name("body")
                    .map(|body| self.members(body, &inner))
                    .unwrap_or_default();
                Some(
                    OtherDeclaration {
                        label: Some(full_name),
                        children,
                    }
                    .into(),
                )
            }
            "method_declaration" if scope.in_class => {
                let outer = scope.outer.as_deref()?;
                Some(self.method(node, outer).into())
            }
            _ => None,
        }
    }

    /// CLR full name and total generic arity, enclosing types included.
    fn type_name(&self, node: Node, scope: &Scope) -> (String, usize) {
        let name = self.field_text(node, "name");
        let own = child_of_kind(node, "type_parameter_list")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|n| n.kind() == "type_parameter")
                    .count()
            })
            .unwrap_or(0);

        let segment = if own > 0 {
            format!("{name}`{own}")
        } else {
            name.to_string()
        };
        (scope.qualify_type(&segment), own + scope.outer_type_parameters)
    }

    fn class(&self, node: Node, scope: &Scope) -> ClassDeclaration {
        let (full_name, type_parameters) = self.type_name(node, scope);
        let mut class = ClassDeclaration::new(full_name.clone()).with_type_parameters(type_parameters);
        class.modifiers = self.modifiers(node);
        class.attributes = self.attributes(node);
        class.base_types = self.base_types(node);
        if let Some(name) = node.child_by_field_name("name") {
            class = class.with_spans(span_of(name), span_of(node));
        }

        let inner = scope.nested(&full_name, type_parameters, true);
        if let Some(body) = node.child_by_field_name("body") {
            class.members = self.members(body, &inner);
        }
        class
    }

    fn base_types(&self, node: Node) -> Vec<String> {
        let Some(list) = child_of_kind(node, "base_list") else {
            return Vec::new();
        };
        named_children(list)
            .into_iter()
            .filter_map(|child| match child.kind() {
                "argument_list" => None,
                "primary_constructor_base_type" => child.child_by_field_name("type"),
                _ => Some(child),
            })
            .map(|base| clr_type_reference(self.text(base)))
            .filter(|name| !name.is_empty())
            .collect()
    }

    fn method(&self, node: Node, containing_type: &str) -> MethodDeclaration {
        let name = self.field_text(node, "name");
        let mut method = MethodDeclaration::new(containing_type, name);
        method.modifiers = self.modifiers(node);
        method.attributes = self.attributes(node);
        method.parameters = child_of_kind(node, "parameter_list")
            .map(|list| {
                named_children(list)
                    .into_iter()
                    .filter(|n| n.kind() == "parameter")
                    .count()
            })
            .unwrap_or(0);
        if let Some(name) = node.child_by_field_name("name") {
            method = method.with_spans(span_of(name), span_of(node));
        }
        method
    }

    fn modifiers(&self, node: Node) -> Vec<String> {
        named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "modifier")
            .map(|n| self.text(n).trim().to_string())
            .collect()
    }

    fn attributes(&self, node: Node) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        for list in named_children(node)
            .into_iter()
            .filter(|n| n.kind() == "attribute_list")
        {
            for attr in named_children(list)
                .into_iter()
                .filter(|n| n.kind() == "attribute")
            {
                attributes.push(self.attribute(attr));
            }
        }
        attributes
    }

    fn attribute(&self, node: Node) -> Attribute {
        let mut attribute = Attribute::new(self.field_text(node, "name"));
        let Some(arguments) = child_of_kind(node, "attribute_argument_list") else {
            return attribute;
        };

        for argument in named_children(arguments)
            .into_iter()
            .filter(|n| n.kind() == "attribute_argument")
        {
            attribute = match split_named_argument(self.text(argument)) {
                (Some(name), value) => attribute.with_named_argument(name, unquote_string(value)),
                (None, value) => attribute.with_argument(unquote_string(value)),
            };
        }
        attribute
    }
}

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    named_children(node).into_iter().find(|n| n.kind() == kind)
}

fn span_of(node: Node) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

/// `global::Ns.Base<int, List<string>>` becomes ``Ns.Base`2``.
fn clr_type_reference(text: &str) -> String {
    let text = match text.split_once("::") {
        Some((alias, name)) if !alias.contains('<') => name,
        _ => text,
    };

    let mut name = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut arity = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        match c {
            '<' => {
                if depth == 0 {
                    arity = 1;
                }
                depth += 1;
            }
            ',' if depth == 1 => arity += 1,
            '>' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    name.push_str(&format!("`{arity}"));
                }
            }
            _ if depth == 0 => name.push(c),
            _ => {}
        }
    }
    name
}

/// Splits `Skip = "reason"` and `reason: "x"` into name and value.
fn split_named_argument(text: &str) -> (Option<&str>, &str) {
    for separator in ['=', ':'] {
        if let Some((name, value)) = text.split_once(separator) {
            let name = name.trim();
            if is_identifier(name) && !value.starts_with(separator) {
                return (Some(name), value.trim());
            }
        }
    }
    (None, text.trim())
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
