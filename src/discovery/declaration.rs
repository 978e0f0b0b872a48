//! Declaration tree handed to a scan session by a front end.
//!
//! Only the three node kinds the walker dispatches on are modelled: type
//! declarations that may be test containers, method declarations, and
//! everything else (namespaces, structs, the file root) which is only
//! descended into.

use crate::element::{Span, TypeName};
use crate::utils::extract_last_segment;

const ATTRIBUTE_SUFFIX: &str = "Attribute";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeArgument {
    pub name: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub arguments: Vec<AttributeArgument>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, value: impl Into<String>) -> Self {
        self.arguments.push(AttributeArgument {
            name: None,
            value: value.into(),
        });
        self
    }

    pub fn with_named_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push(AttributeArgument {
            name: Some(name.into()),
            value: value.into(),
        });
        self
    }

    /// Matches `Fact`, `FactAttribute`, `Xunit.Fact` and `global::Xunit.FactAttribute`
    /// against the simple name `Fact`.
    pub fn is_named(&self, simple_name: &str) -> bool {
        let own = extract_last_segment(&self.name);
        let own = own.strip_suffix(ATTRIBUTE_SUFFIX).unwrap_or(&own);
        let wanted = simple_name
            .strip_suffix(ATTRIBUTE_SUFFIX)
            .unwrap_or(simple_name);
        !own.is_empty() && own == wanted
    }

    pub fn positional(&self) -> impl Iterator<Item = &str> {
        self.arguments
            .iter()
            .filter(|arg| arg.name.is_none())
            .map(|arg| arg.value.as_str())
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|arg| arg.name.as_deref() == Some(name))
            .map(|arg| arg.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDeclaration {
    pub type_name: TypeName,
    pub modifiers: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub type_parameters: usize,
    /// Base class and interfaces as written, generic arity in CLR form
    /// (`BaseTests`, `Ns.Fixture`1`).
    pub base_types: Vec<String>,
    pub name_span: Option<Span>,
    pub span: Option<Span>,
    pub members: Vec<Declaration>,
}

impl ClassDeclaration {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: TypeName::new(type_name),
            modifiers: Vec::new(),
            attributes: Vec::new(),
            type_parameters: 0,
            base_types: Vec::new(),
            name_span: None,
            span: None,
            members: Vec::new(),
        }
    }

    pub fn with_base_type(mut self, base_type: impl Into<String>) -> Self {
        self.base_types.push(base_type.into());
        self
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_type_parameters(mut self, count: usize) -> Self {
        self.type_parameters = count;
        self
    }

    pub fn with_spans(mut self, name_span: Span, span: Span) -> Self {
        self.name_span = Some(name_span);
        self.span = Some(span);
        self
    }

    pub fn with_member(mut self, member: impl Into<Declaration>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn has_attribute(&self, simple_name: &str) -> bool {
        self.attributes.iter().any(|a| a.is_named(simple_name))
    }

    /// Methods declared directly in this declaration.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.members.iter().filter_map(|member| match member {
            Declaration::Method(method) => Some(method),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    pub name: String,
    pub containing_type: TypeName,
    pub modifiers: Vec<String>,
    pub attributes: Vec<Attribute>,
    pub parameters: usize,
    pub name_span: Option<Span>,
    pub span: Option<Span>,
}

impl MethodDeclaration {
    pub fn new(containing_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            containing_type: TypeName::new(containing_type),
            modifiers: Vec::new(),
            attributes: Vec::new(),
            parameters: 0,
            name_span: None,
            span: None,
        }
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_parameters(mut self, count: usize) -> Self {
        self.parameters = count;
        self
    }

    pub fn with_spans(mut self, name_span: Span, span: Span) -> Self {
        self.name_span = Some(name_span);
        self.span = Some(span);
        self
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.iter().any(|m| m == modifier)
    }

    pub fn attributes_named<'a>(
        &'a self,
        simple_name: &'a str,
    ) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.attributes
            .iter()
            .filter(move |a| a.is_named(simple_name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OtherDeclaration {
    /// Namespace or type name, when the node has one.
    pub label: Option<String>,
    pub children: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Class(ClassDeclaration),
    Method(MethodDeclaration),
    Other(OtherDeclaration),
}

impl Declaration {
    /// An unlabelled node grouping top-level declarations of a file.
    pub fn root(children: Vec<Declaration>) -> Self {
        Declaration::Other(OtherDeclaration {
            label: None,
            children,
        })
    }

    pub fn namespace(name: impl Into<String>, children: Vec<Declaration>) -> Self {
        Declaration::Other(OtherDeclaration {
            label: Some(name.into()),
            children,
        })
    }

    pub fn children(&self) -> &[Declaration] {
        match self {
            Declaration::Class(class) => &class.members,
            Declaration::Method(_) => &[],
            Declaration::Other(other) => &other.children,
        }
    }

    /// Every class declaration in the tree, in document order.
    pub fn classes(&self) -> Vec<&ClassDeclaration> {
        let mut found = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Declaration::Class(class) = node {
                found.push(class);
            }
            stack.extend(node.children().iter().rev());
        }
        found
    }
}

impl From<ClassDeclaration> for Declaration {
    fn from(value: ClassDeclaration) -> Self {
        Declaration::Class(value)
    }
}

impl From<MethodDeclaration> for Declaration {
    fn from(value: MethodDeclaration) -> Self {
        Declaration::Method(value)
    }
}

impl From<OtherDeclaration> for Declaration {
    fn from(value: OtherDeclaration) -> Self {
        Declaration::Other(value)
    }
}
