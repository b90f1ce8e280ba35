//! Element tree to object graph

use tracing::trace;

use crate::bind::context::Context;
use crate::bind::Options;
use crate::descriptor::{
    BindingKind, FieldDescriptor, ItemKind, Registry, TypeDescriptor, ValueKind,
};
use crate::error::{ErrorKind, Result};
use crate::object::{Object, ObjectRef, Scalar, ScalarType, Value};
use crate::xml::Element;

/// Walks an element tree alongside a type descriptor
pub(crate) struct Binder<'r> {
    registry: &'r Registry,
    ctx: Context,
}

impl<'r> Binder<'r> {
    pub(crate) fn new(registry: &'r Registry, root: &Element, options: Options) -> Self {
        Self {
            registry,
            ctx: Context::new(&root.name, options),
        }
    }

    pub(crate) fn bind_root(mut self, element: &Element, type_name: &str) -> Result<ObjectRef> {
        let descriptor = self.registry.describe(type_name)?;
        if element.name != descriptor.element_name() {
            return Err(self.ctx.error(ErrorKind::TypeMismatch {
                raw: element.name.clone(),
            }));
        }
        let object = self.bind_element(element, &descriptor)?;
        Ok(ObjectRef::new(object))
    }

    fn bind_element(&mut self, element: &Element, descriptor: &TypeDescriptor) -> Result<Object> {
        if self.ctx.strict() {
            self.reject_unknown(element, descriptor)?;
        }

        let mut object = Object::new(descriptor.type_name());
        for field in descriptor.fields() {
            self.ctx.push(field.xml_name());
            let value = self.bind_field(element, field);
            self.ctx.pop();
            if let Some(value) = value? {
                object.set(field.name(), value);
            }
        }
        Ok(object)
    }

    fn bind_field(&mut self, element: &Element, field: &FieldDescriptor) -> Result<Option<Value>> {
        match (field.binding(), field.value_kind()) {
            (BindingKind::Attribute, ValueKind::Scalar(ty)) => match element.attribute(field.xml_name()) {
                Some(raw) => self.scalar(raw, *ty).map(Some),
                None => self.absent(field),
            },
            (BindingKind::TextContent, ValueKind::Scalar(ty)) => {
                let raw = element.text().unwrap_or_default();
                if !field.is_required() && raw.trim().is_empty() {
                    return self.absent(field);
                }
                self.scalar(&raw, *ty).map(Some)
            }
            (BindingKind::ChildElement, ValueKind::Scalar(ty)) => match self.single_child(element, field)? {
                Some(child) => self.scalar_element(child, *ty).map(Some),
                None => self.absent(field),
            },
            (BindingKind::ChildElement, ValueKind::Object(type_name)) => {
                match self.single_child(element, field)? {
                    Some(child) => self.nested(child, type_name).map(Some),
                    None => self.absent(field),
                }
            }
            (BindingKind::ChildElement, ValueKind::Collection(item)) => {
                self.collection(element, field, item)
            }
            // rejected when the descriptor is built
            (BindingKind::Attribute | BindingKind::TextContent, _) => Ok(None),
        }
    }

    fn collection(
        &mut self,
        element: &Element,
        field: &FieldDescriptor,
        item: &ItemKind,
    ) -> Result<Option<Value>> {
        let children: Vec<&Element> = element.children_named(field.xml_name()).collect();
        if children.is_empty() && field.is_required() {
            return Err(self.ctx.error(ErrorKind::MissingField));
        }

        let mut items = Vec::with_capacity(children.len());
        for (index, child) in children.into_iter().enumerate() {
            self.ctx.push_index(index);
            let value = match item {
                ItemKind::Scalar(ty) => self.scalar_element(child, *ty),
                ItemKind::Object(type_name) => self.nested(child, type_name),
            };
            self.ctx.pop();
            items.push(value?);
        }
        Ok(Some(Value::List(items)))
    }

    fn nested(&mut self, child: &Element, type_name: &str) -> Result<Value> {
        trace!(element = %child.name, type_name, "binding nested object");
        let descriptor = self
            .registry
            .describe(type_name)
            .map_err(|err| self.ctx.locate(err))?;
        let object = self.bind_element(child, &descriptor)?;
        Ok(Value::Object(ObjectRef::new(object)))
    }

    /// First child named after the field; strict mode rejects repeats
    fn single_child<'e>(
        &self,
        element: &'e Element,
        field: &FieldDescriptor,
    ) -> Result<Option<&'e Element>> {
        let mut matches = element.children_named(field.xml_name());
        let first = matches.next();
        if self.ctx.strict() && matches.next().is_some() {
            return Err(self.ctx.error(ErrorKind::UnexpectedField));
        }
        Ok(first)
    }

    /// Scalar held as the text of an element with no markup of its own
    fn scalar_element(&self, child: &Element, ty: ScalarType) -> Result<Value> {
        if self.ctx.strict() {
            if let Some(name) = child.attributes.keys().find(|name| !is_namespace_declaration(name)) {
                return Err(self.ctx.error_at(name, ErrorKind::UnexpectedField));
            }
            if let Some(grandchild) = child.child_elements().next() {
                return Err(self.ctx.error_at(&grandchild.name, ErrorKind::UnexpectedField));
            }
        }
        let raw = child.text().unwrap_or_default();
        self.scalar(&raw, ty)
    }

    fn scalar(&self, raw: &str, ty: ScalarType) -> Result<Value> {
        Scalar::parse(raw, ty)
            .map(Value::Scalar)
            .ok_or_else(|| self.ctx.error(ErrorKind::TypeMismatch { raw: raw.to_string() }))
    }

    /// Missing field: default, absence, or `MissingField`
    fn absent(&self, field: &FieldDescriptor) -> Result<Option<Value>> {
        if let Some(default) = field.default_value() {
            return Ok(Some(Value::Scalar(default.clone())));
        }
        if field.is_required() {
            return Err(self.ctx.error(ErrorKind::MissingField));
        }
        Ok(None)
    }

    fn reject_unknown(&self, element: &Element, descriptor: &TypeDescriptor) -> Result<()> {
        if let Some(name) = element
            .attributes
            .keys()
            .find(|name| !is_namespace_declaration(name) && !descriptor.binds_attribute(name))
        {
            return Err(self.ctx.error_at(name, ErrorKind::UnexpectedField));
        }
        if let Some(child) = element
            .child_elements()
            .find(|child| !descriptor.binds_child(&child.name))
        {
            return Err(self.ctx.error_at(&child.name, ErrorKind::UnexpectedField));
        }
        if descriptor.text_field().is_none() && element.has_significant_text() {
            return Err(self.ctx.error_at("#text", ErrorKind::UnexpectedField));
        }
        Ok(())
    }
}

fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
