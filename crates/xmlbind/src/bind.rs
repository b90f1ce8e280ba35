//! Binding between element trees and object graphs

mod binder;
mod context;
mod unbinder;

use tracing::debug;

use crate::descriptor::Registry;
use crate::error::Result;
use crate::object::ObjectRef;
use crate::xml::Element;

use binder::Binder;
use unbinder::Unbinder;

/// Options shared by bind and unbind
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Fail with `UnexpectedField` on markup or object fields the descriptor
    /// does not declare, instead of ignoring them
    pub strict: bool,
}

impl Options {
    pub const fn lenient() -> Self {
        Self { strict: false }
    }

    pub const fn strict() -> Self {
        Self { strict: true }
    }
}

/// Bind an element tree to a new object of `type_name`
pub fn bind(element: &Element, type_name: &str, registry: &Registry) -> Result<ObjectRef> {
    bind_with_options(element, type_name, registry, Options::default())
}

/// Bind with explicit options
pub fn bind_with_options(
    element: &Element,
    type_name: &str,
    registry: &Registry,
    options: Options,
) -> Result<ObjectRef> {
    debug!(type_name, root = %element.name, strict = options.strict, "binding");
    Binder::new(registry, element, options).bind_root(element, type_name)
}

/// Unbind an object of `type_name` into an element tree
pub fn unbind(object: &ObjectRef, type_name: &str, registry: &Registry) -> Result<Element> {
    unbind_with_options(object, type_name, registry, Options::default())
}

/// Unbind with explicit options
pub fn unbind_with_options(
    object: &ObjectRef,
    type_name: &str,
    registry: &Registry,
    options: Options,
) -> Result<Element> {
    debug!(type_name, strict = options.strict, "unbinding");
    let descriptor = registry.describe(type_name)?;
    Unbinder::new(registry, &descriptor, options).unbind_root(object, &descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptor, ItemKind, TypeDeclaration};
    use crate::error::ErrorKind;
    use crate::object::{Object, ScalarType, Value};
    use crate::xml::Parser;

    fn registry() -> Registry {
        let registry = Registry::new();
        registry.declare(
            TypeDeclaration::new("person")
                .field(FieldDescriptor::attribute("age", ScalarType::Integer))
                .field(FieldDescriptor::child("name", ScalarType::String)),
        );
        registry.declare(
            TypeDeclaration::new("node")
                .field(FieldDescriptor::attribute("id", ScalarType::Integer))
                .field(FieldDescriptor::nested("next", "node").optional())
                .field(FieldDescriptor::collection("child", ItemKind::object("node"))),
        );
        registry
    }

    fn parse(input: &str) -> Result<Element> {
        Parser::new(input.as_bytes()).parse().map(|doc| doc.root)
    }

    fn path_of(result: Result<impl std::fmt::Debug>) -> Option<(ErrorKind, String)> {
        let err = result.err()?;
        Some((err.kind().clone(), err.path()?.to_string()))
    }

    #[test]
    fn test_bind_person() -> Result<()> {
        let registry = registry();
        let object = bind(&parse(r#"<person age="30"><name>Ada</name></person>"#)?, "person", &registry)?;
        let object = object.read();
        assert_eq!(object.get_i64("age"), Some(30));
        assert_eq!(object.get_str("name"), Some("Ada"));
        Ok(())
    }

    #[test]
    fn test_missing_attribute_path() -> Result<()> {
        let registry = registry();
        let result = bind(&parse("<person><name>Ada</name></person>")?, "person", &registry);
        assert_eq!(
            path_of(result),
            Some((ErrorKind::MissingField, "person.age".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_nested_collection_paths() -> Result<()> {
        let registry = registry();
        let tree = parse(r#"<node id="1"><child id="2"/><child id="x"/></node>"#)?;
        assert_eq!(
            path_of(bind(&tree, "node", &registry)),
            Some((
                ErrorKind::TypeMismatch {
                    raw: "x".to_string()
                },
                "node.child[1].id".to_string()
            ))
        );
        Ok(())
    }

    #[test]
    fn test_self_reference_is_cyclic() {
        let registry = registry();
        let node = ObjectRef::new(Object::new("node").with("id", 1_i64));
        node.write().set("next", node.clone());

        assert_eq!(
            path_of(unbind(&node, "node", &registry)),
            Some((ErrorKind::CyclicReference, "node.next".to_string()))
        );
        node.write().remove("next");
    }

    #[test]
    fn test_lenient_is_the_default() -> Result<()> {
        let registry = registry();
        assert_eq!(Options::lenient(), Options::default());

        let tree = parse(r#"<person age="30" extra="1"><name>Ada</name><hobby/></person>"#)?;
        let lenient = bind_with_options(&tree, "person", &registry, Options::lenient())?;
        assert_eq!(lenient, bind(&tree, "person", &registry)?);
        assert_eq!(
            path_of(bind_with_options(&tree, "person", &registry, Options::strict())),
            Some((ErrorKind::UnexpectedField, "person.extra".to_string()))
        );
        Ok(())
    }

    #[test]
    fn test_shared_acyclic_object_is_allowed() -> Result<()> {
        let registry = registry();
        let leaf = ObjectRef::new(Object::new("node").with("id", 2_i64));
        let root = ObjectRef::new(
            Object::new("node")
                .with("id", 1_i64)
                .with("next", leaf.clone())
                .with("child", vec![Value::Object(leaf.clone()), Value::Object(leaf)]),
        );
        let element = unbind(&root, "node", &registry)?;
        assert_eq!(element.child_elements().count(), 3);
        Ok(())
    }
}
