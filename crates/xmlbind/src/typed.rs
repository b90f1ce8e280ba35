//! Statically typed bindings on top of the dynamic object graph
//!
//! A type implementing [`XmlType`] declares its own field table and converts
//! itself to and from an [`Object`]. The functions here register the type,
//! then run the usual parse/bind or unbind/render pipeline.

use std::path::Path as FsPath;

use tracing::{debug, error, info, instrument};

use crate::bind::{bind, unbind};
use crate::descriptor::{Registry, TypeDeclaration};
use crate::error::{Error, ErrorKind, Result};
use crate::object::{Object, ObjectRef, Scalar, Value};
use crate::path::Path;
use crate::xml::{Element, Parser, Renderer};

/// A Rust type with a markup binding
pub trait XmlType: Sized {
    /// Registry key, also the default root tag
    const TYPE_NAME: &'static str;

    fn declare() -> TypeDeclaration;

    /// Register the types named by nested and collection fields
    fn register_nested(_registry: &Registry) {}

    fn to_object(&self) -> Object;

    fn from_object(object: &Object) -> Result<Self>;
}

/// Reads typed values out of a bound object.
///
/// Errors carry the path `type.field`.
#[derive(Clone, Copy, Debug)]
pub struct Fields<'a> {
    object: &'a Object,
}

impl<'a> Fields<'a> {
    pub const fn new(object: &'a Object) -> Self {
        Self { object }
    }

    pub fn has(&self, name: &str) -> bool {
        self.object.contains(name)
    }

    pub fn get(&self, name: &str) -> Result<&'a Value> {
        self.object
            .get(name)
            .ok_or_else(|| self.error(name, ErrorKind::MissingField))
    }

    pub fn string(&self, name: &str) -> Result<String> {
        self.scalar(name, |scalar| scalar.as_str().map(str::to_string))
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        self.scalar(name, |scalar| match scalar {
            Scalar::Integer(value) => Some(*value),
            _ => None,
        })
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.scalar(name, |scalar| match scalar {
            Scalar::Float(value) => Some(*value),
            _ => None,
        })
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        self.scalar(name, |scalar| match scalar {
            Scalar::Boolean(value) => Some(*value),
            _ => None,
        })
    }

    pub fn nested<T: XmlType>(&self, name: &str) -> Result<T> {
        let value = self.get(name)?;
        let object = value.as_object().ok_or_else(|| self.mismatch(name, value))?;
        let guard = object.read_recursive();
        T::from_object(&guard)
    }

    /// Collection of nested objects; absent reads as empty
    pub fn list<T: XmlType>(&self, name: &str) -> Result<Vec<T>> {
        self.items(name, |value| {
            let object = value.as_object()?;
            let guard = object.read_recursive();
            Some(T::from_object(&guard))
        })?
        .into_iter()
        .collect()
    }

    /// Collection of strings; absent reads as empty
    pub fn strings(&self, name: &str) -> Result<Vec<String>> {
        self.items(name, |value| {
            value.as_scalar()?.as_str().map(str::to_string)
        })
    }

    /// `None` when the field is absent, otherwise `read`'s result
    pub fn optional<T>(
        &self,
        name: &str,
        read: impl FnOnce(&Self, &str) -> Result<T>,
    ) -> Result<Option<T>> {
        if self.has(name) {
            read(self, name).map(Some)
        } else {
            Ok(None)
        }
    }

    fn scalar<T>(&self, name: &str, extract: impl FnOnce(&Scalar) -> Option<T>) -> Result<T> {
        let value = self.get(name)?;
        value
            .as_scalar()
            .and_then(extract)
            .ok_or_else(|| self.mismatch(name, value))
    }

    fn items<T>(&self, name: &str, mut extract: impl FnMut(&Value) -> Option<T>) -> Result<Vec<T>> {
        let Some(value) = self.object.get(name) else {
            return Ok(Vec::new());
        };
        let items = value.as_list().ok_or_else(|| self.mismatch(name, value))?;
        items
            .iter()
            .map(|item| extract(item).ok_or_else(|| self.mismatch(name, item)))
            .collect()
    }

    fn mismatch(&self, name: &str, value: &Value) -> Error {
        self.error(
            name,
            ErrorKind::TypeMismatch {
                raw: value.describe(),
            },
        )
    }

    fn error(&self, name: &str, kind: ErrorKind) -> Error {
        let mut path = Path::root(self.object.type_name());
        path.push_name(name);
        Error::binding(kind, &path)
    }
}

/// Collection value holding one object per item
pub fn objects<T: XmlType>(items: &[T]) -> Value {
    Value::List(items.iter().map(|item| Value::from(item.to_object())).collect())
}

/// Bind an element tree to a `T`
pub fn from_element<T: XmlType>(registry: &Registry, element: &Element) -> Result<T> {
    registry.register::<T>();
    let object = bind(element, T::TYPE_NAME, registry)?;
    let guard = object.read();
    T::from_object(&guard)
}

/// Unbind a `T` into an element tree
pub fn to_element<T: XmlType>(registry: &Registry, value: &T) -> Result<Element> {
    registry.register::<T>();
    unbind(&ObjectRef::new(value.to_object()), T::TYPE_NAME, registry)
}

/// Parse markup text and bind it to a `T`
pub fn from_xml_str<T: XmlType>(registry: &Registry, text: &str) -> Result<T> {
    let document = Parser::new(text.as_bytes()).parse()?;
    from_element(registry, &document.root)
}

/// Unbind a `T` and render it compactly
pub fn to_xml_string<T: XmlType>(registry: &Registry, value: &T) -> Result<String> {
    let element = to_element(registry, value)?;
    Ok(Renderer::new().render(&element))
}

/// Load a `T` from a markup file
#[instrument(skip(registry), fields(type_name = T::TYPE_NAME))]
pub fn from_file<T: XmlType>(registry: &Registry, path: &FsPath) -> Result<T> {
    debug!("Reading {}", path.display());

    let content = std::fs::read(path).map_err(|e| {
        error!("Failed to read file: {}", e);
        Error::from(e)
    })?;

    info!(bytes = content.len(), "File read successfully, binding");

    let document = Parser::new(&content).parse().map_err(|e| {
        error!("Failed to parse file: {}", e);
        e
    })?;
    let value = from_element(registry, &document.root);
    if let Err(err) = &value {
        error!("Binding failed: {}", err);
    }
    value
}
