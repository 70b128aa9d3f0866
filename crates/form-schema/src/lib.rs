#![allow(missing_docs)]

pub mod computed;
pub mod expr;
pub mod factory;
pub mod persist;
pub mod preview;
pub mod shortcuts;
pub mod spec;
pub mod store;
pub mod tree;
pub mod validate;
pub mod values;
pub mod visibility;

pub use computed::apply_computed;
pub use expr::{ExprError, Expression, evaluate_computed, evaluate_visibility};
pub use factory::{create_field, fresh_id, fresh_key, regenerate_identity, sample_options};
pub use persist::{FileStorage, MemoryStorage, PersistError, PersistedState, Storage};
pub use preview::FormPreview;
pub use shortcuts::{Binding, EditorAction, Keystroke, ShortcutMap, Subscription, default_bindings};
pub use spec::{
    Field, FieldKind, FieldType, ImportError, SCHEMA_VERSION, Schema, SelectOption,
    ValidationRules,
};
pub use store::{DesignerStore, FieldPatch, Operation, StoreConfig, StoreError, ValidationPatch};
pub use validate::{ErrorCode, FieldError, ValidationReport, validate};
pub use values::{Values, seed_defaults};
pub use visibility::{VisibilityMap, resolve_visibility};
