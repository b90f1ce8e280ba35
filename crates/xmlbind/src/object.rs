//! Dynamic object graph produced by binding and consumed by unbinding

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Target type of a scalar field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    Integer,
    Float,
    Boolean,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A leaf value
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Scalar {
    pub const fn scalar_type(&self) -> ScalarType {
        match self {
            Self::String(_) => ScalarType::String,
            Self::Integer(_) => ScalarType::Integer,
            Self::Float(_) => ScalarType::Float,
            Self::Boolean(_) => ScalarType::Boolean,
        }
    }

    /// Convert markup text to a scalar of the requested type.
    ///
    /// Strings are taken verbatim; the other types ignore surrounding whitespace.
    pub fn parse(raw: &str, ty: ScalarType) -> Option<Self> {
        match ty {
            ScalarType::String => Some(Self::String(raw.to_string())),
            ScalarType::Integer => raw.trim().parse().ok().map(Self::Integer),
            ScalarType::Float => raw.trim().parse().ok().map(Self::Float),
            ScalarType::Boolean => match raw.trim() {
                "true" | "1" => Some(Self::Boolean(true)),
                "false" | "0" => Some(Self::Boolean(false)),
                _ => None,
            },
        }
    }

    /// Markup text form, the inverse of [`Scalar::parse`]
    pub fn to_markup(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Float(n) if n.is_nan() => "NaN".to_string(),
            Self::Float(n) if n.is_infinite() => {
                let text = if n.is_sign_positive() { "INF" } else { "-INF" };
                text.to_string()
            }
            Self::Float(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A field value in the object graph
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Object(ObjectRef),
    List(Vec<Value>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short description used in type mismatch reports
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(s) => s.to_markup(),
            Self::Object(o) => format!("<object {}>", o.read_recursive().type_name()),
            Self::List(items) => format!("<list of {}>", items.len()),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

macro_rules! value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.into())
                }
            }
        )*
    };
}

value_from_scalar!(&str, String, i64, f64, bool);

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(ObjectRef::new(value))
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

/// A typed record: type name plus ordered field values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Object {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Object {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_scalar()?.as_str()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)?.as_scalar()? {
            Scalar::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match self.get(name)?.as_scalar()? {
            Scalar::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)?.as_scalar()? {
            Scalar::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get_object(&self, name: &str) -> Option<&ObjectRef> {
        self.get(name)?.as_object()
    }

    pub fn get_list(&self, name: &str) -> Option<&[Value]> {
        self.get(name)?.as_list()
    }
}

thread_local! {
    static COMPARING: RefCell<HashSet<(*const (), *const ())>> = RefCell::new(HashSet::new());
    static FORMATTING: RefCell<HashSet<*const ()>> = RefCell::new(HashSet::new());
}

/// Shared handle to an [`Object`].
///
/// Handles may be stored in several places of a graph, including inside the
/// object they point to. Equality is structural; a pair of handles already
/// under comparison is assumed equal, so comparing cyclic graphs terminates.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read()
    }

    /// Read access that does not wait behind queued writers
    pub fn read_recursive(&self) -> RwLockReadGuard<'_, Object> {
        self.0.read_recursive()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Object> {
        self.0.write()
    }

    /// Identity of the shared object
    pub fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0).cast()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Clone of the current contents
    pub fn snapshot(&self) -> Object {
        self.read_recursive().clone()
    }
}

impl From<Object> for ObjectRef {
    fn from(object: Object) -> Self {
        Self::new(object)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let key = (self.addr(), other.addr());
        if !COMPARING.with(|set| set.borrow_mut().insert(key)) {
            return true;
        }
        let equal = *self.read_recursive() == *other.read_recursive();
        COMPARING.with(|set| set.borrow_mut().remove(&key));
        equal
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = self.addr();
        if !FORMATTING.with(|set| set.borrow_mut().insert(addr)) {
            return write!(f, "ObjectRef(<cycle {addr:p}>)");
        }
        let result = f.debug_tuple("ObjectRef").field(&*self.read_recursive()).finish();
        FORMATTING.with(|set| set.borrow_mut().remove(&addr));
        result
    }
}
