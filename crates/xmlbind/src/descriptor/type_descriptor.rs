//! Validated structural description of a type

use std::collections::HashSet;

use crate::descriptor::field::{BindingKind, FieldDescriptor, TypeDeclaration, ValueKind};
use crate::error::{Error, Result};
use crate::xml::parser::is_valid_name;

/// How a type's fields map to markup, checked for consistency
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDescriptor {
    type_name: String,
    element_name: String,
    fields: Vec<FieldDescriptor>,
    text_field: Option<usize>,
    attributes: HashSet<String>,
    children: HashSet<String>,
}

impl TypeDescriptor {
    /// Validate a declaration.
    ///
    /// Fails with `UnsupportedType` if the type has no fields, more than one
    /// text-content field, clashing names, non-scalar attribute/text fields, or
    /// defaults that do not fit their field.
    pub fn from_declaration(declaration: TypeDeclaration) -> Result<Self> {
        let TypeDeclaration {
            type_name,
            element_name,
            fields,
        } = declaration;
        let unsupported = |message: String| Error::unsupported(&type_name, message);

        if type_name.is_empty() {
            return Err(unsupported("type name is empty".to_string()));
        }
        if let Some(element_name) = element_name.as_deref() {
            if !is_valid_name(element_name) {
                return Err(unsupported(format!("`{element_name}` is not a valid element name")));
            }
        } else if !is_valid_name(&type_name) {
            return Err(unsupported(format!(
                "type name `{type_name}` is not a valid element name; declare one with `element`"
            )));
        }
        if fields.is_empty() {
            return Err(unsupported("type exposes no bindable fields".to_string()));
        }

        let mut names = HashSet::new();
        let mut attributes = HashSet::new();
        let mut children = HashSet::new();
        let mut text_field = None;

        for (index, field) in fields.iter().enumerate() {
            if field.name().is_empty() || field.xml_name().is_empty() {
                return Err(unsupported(format!("field #{index} has an empty name")));
            }
            if !names.insert(field.name().to_string()) {
                return Err(unsupported(format!("duplicate field `{}`", field.name())));
            }

            let scalar = match field.value_kind() {
                ValueKind::Scalar(ty) => Some(*ty),
                ValueKind::Object(_) | ValueKind::Collection(_) => None,
            };

            if field.binding() != BindingKind::TextContent && !is_valid_name(field.xml_name()) {
                return Err(unsupported(format!(
                    "`{}` is not a valid markup name for field `{}`",
                    field.xml_name(),
                    field.name()
                )));
            }

            match field.binding() {
                BindingKind::Attribute => {
                    if scalar.is_none() {
                        return Err(unsupported(format!(
                            "attribute field `{}` must be a scalar",
                            field.name()
                        )));
                    }
                    if !attributes.insert(field.xml_name().to_string()) {
                        return Err(unsupported(format!(
                            "attribute `{}` is bound by more than one field",
                            field.xml_name()
                        )));
                    }
                }
                BindingKind::ChildElement => {
                    if !children.insert(field.xml_name().to_string()) {
                        return Err(unsupported(format!(
                            "child element `{}` is bound by more than one field",
                            field.xml_name()
                        )));
                    }
                }
                BindingKind::TextContent => {
                    if scalar.is_none() {
                        return Err(unsupported(format!(
                            "text content field `{}` must be a scalar",
                            field.name()
                        )));
                    }
                    if let Some(previous) = text_field.replace(index) {
                        let first = fields.get(previous).map_or("", FieldDescriptor::name);
                        return Err(unsupported(format!(
                            "fields `{first}` and `{}` both bind text content",
                            field.name()
                        )));
                    }
                }
            }

            if let Some(default) = field.default_value() {
                if field.is_required() {
                    return Err(unsupported(format!(
                        "required field `{}` cannot have a default",
                        field.name()
                    )));
                }
                if scalar != Some(default.scalar_type()) {
                    return Err(unsupported(format!(
                        "default for `{}` does not match its declared type",
                        field.name()
                    )));
                }
            }
        }

        Ok(Self {
            element_name: element_name.unwrap_or_else(|| type_name.clone()),
            type_name,
            fields,
            text_field,
            attributes,
            children,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Tag of the root element when this type is bound at the top level
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Fields in declared order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn text_field(&self) -> Option<&FieldDescriptor> {
        self.text_field.and_then(|index| self.fields.get(index))
    }

    pub fn binds_attribute(&self, xml_name: &str) -> bool {
        self.attributes.contains(xml_name)
    }

    pub fn binds_child(&self, xml_name: &str) -> bool {
        self.children.contains(xml_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::field::ItemKind;
    use crate::error::ErrorKind;
    use crate::object::ScalarType;

    fn person() -> TypeDeclaration {
        TypeDeclaration::new("person")
            .field(FieldDescriptor::attribute("age", ScalarType::Integer))
            .field(FieldDescriptor::child("name", ScalarType::String))
    }

    fn rejects(declaration: TypeDeclaration) -> bool {
        matches!(
            TypeDescriptor::from_declaration(declaration).map_err(|e| e.kind().clone()),
            Err(ErrorKind::UnsupportedType { .. })
        )
    }

    #[test]
    fn test_valid_declaration() -> Result<()> {
        let descriptor = TypeDescriptor::from_declaration(person().element("human"))?;
        assert_eq!(descriptor.type_name(), "person");
        assert_eq!(descriptor.element_name(), "human");
        assert!(descriptor.binds_attribute("age"));
        assert!(descriptor.binds_child("name"));
        assert!(!descriptor.binds_child("age"));
        assert!(descriptor.text_field().is_none());
        assert_eq!(descriptor.fields().len(), 2);
        Ok(())
    }

    #[test]
    fn test_rejects_empty_type() {
        assert!(rejects(TypeDeclaration::new("empty")));
    }

    #[test]
    fn test_rejects_two_text_fields() {
        let declaration = TypeDeclaration::new("note")
            .field(FieldDescriptor::text("body", ScalarType::String))
            .field(FieldDescriptor::text("other", ScalarType::String));
        assert!(rejects(declaration));
    }

    #[test]
    fn test_rejects_name_clashes() {
        assert!(rejects(
            person().field(FieldDescriptor::attribute("age", ScalarType::String))
        ));
        assert!(rejects(person().field(
            FieldDescriptor::child("alias", ScalarType::String).rename("name")
        )));
        assert!(rejects(person().field(
            FieldDescriptor::attribute("years", ScalarType::Integer).rename("age")
        )));
    }

    #[test]
    fn test_rejects_structured_attribute_or_text() {
        assert!(rejects(TypeDeclaration::new("a").field(FieldDescriptor::new(
            "x",
            BindingKind::Attribute,
            ValueKind::Object("b".to_string())
        ))));
        assert!(rejects(TypeDeclaration::new("a").field(FieldDescriptor::new(
            "x",
            BindingKind::TextContent,
            ValueKind::Collection(ItemKind::Scalar(ScalarType::String))
        ))));
    }

    #[test]
    fn test_rejects_names_that_cannot_be_written() {
        assert!(rejects(
            person().field(FieldDescriptor::child("full name", ScalarType::String))
        ));
        assert!(rejects(person().field(
            FieldDescriptor::attribute("nick", ScalarType::String).rename("1st")
        )));
        assert!(rejects(person().element("a person")));
        assert!(rejects(
            TypeDeclaration::new("http config")
                .field(FieldDescriptor::attribute("port", ScalarType::Integer))
        ));

        // a text field's name never appears in markup
        let note = TypeDeclaration::new("note")
            .field(FieldDescriptor::text("body text", ScalarType::String));
        assert!(!rejects(note));
        assert!(!rejects(TypeDeclaration::new("http config").element("http").field(
            FieldDescriptor::attribute("port", ScalarType::Integer)
        )));
    }

    #[test]
    fn test_rejects_mistyped_default() {
        let declaration = TypeDeclaration::new("server")
            .field(FieldDescriptor::attribute("port", ScalarType::Integer).with_default("80"));
        assert!(rejects(declaration));

        let nested_default = TypeDeclaration::new("server")
            .field(FieldDescriptor::nested("tls", "tls").with_default("none"));
        assert!(rejects(nested_default));
    }
}
