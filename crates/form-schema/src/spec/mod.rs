pub mod field;
pub mod schema;

pub use field::{
    Field, FieldKind, FieldType, SelectOption, UnknownFieldType, ValidationRules,
};
pub use schema::{ImportError, ROOT_SCOPE, SCHEMA_VERSION, Schema, key_scopes};
