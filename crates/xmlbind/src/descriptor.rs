//! Type declarations, validated descriptors and their registry

pub mod field;
pub mod registry;
pub mod type_descriptor;

pub use field::{BindingKind, FieldDescriptor, ItemKind, TypeDeclaration, ValueKind};
pub use registry::Registry;
pub use type_descriptor::TypeDescriptor;
