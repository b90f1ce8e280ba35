//! Object graph to element tree

use tracing::trace;

use crate::bind::context::Context;
use crate::bind::Options;
use crate::descriptor::{
    BindingKind, FieldDescriptor, ItemKind, Registry, TypeDescriptor, ValueKind,
};
use crate::error::{Error, ErrorKind, Result};
use crate::object::{Object, ObjectRef, ScalarType, Value};
use crate::xml::{Element, Node};

/// Walks an object graph alongside a type descriptor
pub(crate) struct Unbinder<'r> {
    registry: &'r Registry,
    ctx: Context,
}

impl<'r> Unbinder<'r> {
    pub(crate) fn new(registry: &'r Registry, descriptor: &TypeDescriptor, options: Options) -> Self {
        Self {
            registry,
            ctx: Context::new(descriptor.element_name(), options),
        }
    }

    pub(crate) fn unbind_root(
        mut self,
        object: &ObjectRef,
        descriptor: &TypeDescriptor,
    ) -> Result<Element> {
        self.unbind_object(object, descriptor, descriptor.element_name())
    }

    fn unbind_object(
        &mut self,
        object: &ObjectRef,
        descriptor: &TypeDescriptor,
        element_name: &str,
    ) -> Result<Element> {
        if !self.ctx.enter(object) {
            return Err(self.ctx.error(ErrorKind::CyclicReference));
        }
        let result = {
            let guard = object.read_recursive();
            self.unbind_fields(&guard, descriptor, element_name)
        };
        self.ctx.leave(object);
        result
    }

    fn unbind_fields(
        &mut self,
        object: &Object,
        descriptor: &TypeDescriptor,
        element_name: &str,
    ) -> Result<Element> {
        if object.type_name() != descriptor.type_name() {
            return Err(self.ctx.error(ErrorKind::TypeMismatch {
                raw: format!("<object {}>", object.type_name()),
            }));
        }
        if self.ctx.strict() {
            if let Some((name, _)) = object.fields().find(|(name, _)| descriptor.field(name).is_none()) {
                return Err(self.ctx.error_at(name, ErrorKind::UnexpectedField));
            }
        }

        let mut element = Element::new(element_name);
        for field in descriptor.fields() {
            self.ctx.push(field.xml_name());
            let result = match object.get(field.name()) {
                Some(value) => self.unbind_field(&mut element, field, value),
                None if field.is_required() => Err(self.ctx.error(ErrorKind::MissingField)),
                None => Ok(()),
            };
            self.ctx.pop();
            result?;
        }
        Ok(element)
    }

    fn unbind_field(
        &mut self,
        element: &mut Element,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<()> {
        match (field.binding(), field.value_kind()) {
            (BindingKind::Attribute, ValueKind::Scalar(ty)) => {
                let text = self.scalar_text(value, *ty)?;
                element.attributes.insert(field.xml_name().to_string(), text);
            }
            (BindingKind::TextContent, ValueKind::Scalar(ty)) => {
                let text = self.scalar_text(value, *ty)?;
                if !text.is_empty() {
                    element.children.push(Node::Text(text));
                }
            }
            (BindingKind::ChildElement, ValueKind::Scalar(ty)) => {
                let text = self.scalar_text(value, *ty)?;
                element.children.push(Node::Element(text_element(field.xml_name(), text)));
            }
            (BindingKind::ChildElement, ValueKind::Object(type_name)) => {
                let child = self.nested(value, type_name, field.xml_name())?;
                element.children.push(Node::Element(child));
            }
            (BindingKind::ChildElement, ValueKind::Collection(item)) => {
                let Some(items) = value.as_list() else {
                    return Err(self.mismatch(value));
                };
                if items.is_empty() && field.is_required() {
                    return Err(self.ctx.error(ErrorKind::MissingField));
                }
                for (index, value) in items.iter().enumerate() {
                    self.ctx.push_index(index);
                    let child = match item {
                        ItemKind::Scalar(ty) => self
                            .scalar_text(value, *ty)
                            .map(|text| text_element(field.xml_name(), text)),
                        ItemKind::Object(type_name) => self.nested(value, type_name, field.xml_name()),
                    };
                    self.ctx.pop();
                    element.children.push(Node::Element(child?));
                }
            }
            // rejected when the descriptor is built
            (BindingKind::Attribute | BindingKind::TextContent, _) => {}
        }
        Ok(())
    }

    fn nested(&mut self, value: &Value, type_name: &str, element_name: &str) -> Result<Element> {
        let Some(object) = value.as_object() else {
            return Err(self.mismatch(value));
        };
        trace!(type_name, element = element_name, "unbinding nested object");
        let descriptor = self
            .registry
            .describe(type_name)
            .map_err(|err| self.ctx.locate(err))?;
        self.unbind_object(object, &descriptor, element_name)
    }

    fn scalar_text(&self, value: &Value, ty: ScalarType) -> Result<String> {
        match value.as_scalar() {
            Some(scalar) if scalar.scalar_type() == ty => Ok(scalar.to_markup()),
            _ => Err(self.mismatch(value)),
        }
    }

    fn mismatch(&self, value: &Value) -> Error {
        self.ctx.error(ErrorKind::TypeMismatch {
            raw: value.describe(),
        })
    }
}

/// `<name>text</name>`, self-closing when the text is empty
fn text_element(name: &str, text: String) -> Element {
    let element = Element::new(name);
    if text.is_empty() {
        element
    } else {
        element.with_text(text)
    }
}
