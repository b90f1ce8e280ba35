//! Field descriptors and type declarations

use crate::object::{Scalar, ScalarType};

/// Where a field's value lives in markup
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// An attribute of the element
    Attribute,
    /// A child element with the field's markup name
    ChildElement,
    /// The element's own text content
    TextContent,
}

/// Element type of a collection
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Scalar(ScalarType),
    Object(String),
}

impl ItemKind {
    pub fn object(type_name: impl Into<String>) -> Self {
        Self::Object(type_name.into())
    }
}

/// Target value kind of a field
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Scalar(ScalarType),
    /// Nested object of the named type
    Object(String),
    /// Ordered collection of same-named child elements
    Collection(ItemKind),
}

/// How one field of a type maps to markup
#[derive(Clone, Debug, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    xml_name: String,
    binding: BindingKind,
    value_kind: ValueKind,
    required: bool,
    default: Option<Scalar>,
}

impl FieldDescriptor {
    /// Required field with an explicit binding and value kind
    pub fn new(name: &str, binding: BindingKind, value_kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            xml_name: name.to_string(),
            binding,
            value_kind,
            required: true,
            default: None,
        }
    }

    /// Required scalar attribute
    pub fn attribute(name: &str, ty: ScalarType) -> Self {
        Self::new(name, BindingKind::Attribute, ValueKind::Scalar(ty))
    }

    /// Required scalar held as the text of a child element
    pub fn child(name: &str, ty: ScalarType) -> Self {
        Self::new(name, BindingKind::ChildElement, ValueKind::Scalar(ty))
    }

    /// Required scalar held as the element's own text
    pub fn text(name: &str, ty: ScalarType) -> Self {
        Self::new(name, BindingKind::TextContent, ValueKind::Scalar(ty))
    }

    /// Required nested object in a child element
    pub fn nested(name: &str, type_name: &str) -> Self {
        Self::new(
            name,
            BindingKind::ChildElement,
            ValueKind::Object(type_name.to_string()),
        )
    }

    /// Optional collection of repeated child elements; see [`FieldDescriptor::required`]
    pub fn collection(name: &str, item: ItemKind) -> Self {
        let mut field = Self::new(name, BindingKind::ChildElement, ValueKind::Collection(item));
        field.required = false;
        field
    }

    /// Use a different attribute or element name in markup
    pub fn rename(mut self, xml_name: &str) -> Self {
        self.xml_name = xml_name.to_string();
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Mark as required; a required collection needs at least one item
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Optional with a value used when the markup omits the field
    pub fn with_default(mut self, default: impl Into<Scalar>) -> Self {
        self.required = false;
        self.default = Some(default.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn xml_name(&self) -> &str {
        &self.xml_name
    }

    pub const fn binding(&self) -> BindingKind {
        self.binding
    }

    pub const fn value_kind(&self) -> &ValueKind {
        &self.value_kind
    }

    pub const fn is_required(&self) -> bool {
        self.required
    }

    pub const fn default_value(&self) -> Option<&Scalar> {
        self.default.as_ref()
    }
}

/// Caller-supplied, not yet validated, field table of a type
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDeclaration {
    pub(crate) type_name: String,
    pub(crate) element_name: Option<String>,
    pub(crate) fields: Vec<FieldDescriptor>,
}

impl TypeDeclaration {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            element_name: None,
            fields: Vec::new(),
        }
    }

    /// Root tag used for this type; defaults to the type name
    pub fn element(mut self, element_name: &str) -> Self {
        self.element_name = Some(element_name.to_string());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}
