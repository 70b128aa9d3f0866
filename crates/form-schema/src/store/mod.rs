//! The designer's document store.
//!
//! [`DesignerStore`] owns the present schema, a bounded undo/redo history,
//! the selection cursor and the clipboard. Every mutation builds a new
//! schema from the tree primitives, checks it, records the previous one in
//! history and then swaps it in. A rejected mutation leaves the store as it
//! was.

pub mod clipboard;
pub mod config;
pub mod history;
pub mod ops;
pub mod patch;

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::factory::create_field;
use crate::persist::{DesignerState, PersistError, PersistedHistory, PersistedState, Storage};
use crate::shortcuts::EditorAction;
use crate::spec::{Field, FieldKind, ImportError, Schema};
use crate::tree;

pub use clipboard::Clipboard;
pub use config::{DEFAULT_HISTORY_CAPACITY, DEFAULT_STORAGE_KEY, StoreConfig};
pub use history::{History, Snapshot};
pub use ops::Operation;
pub use patch::{FieldPatch, ValidationPatch};

/// Fresh identities are redrawn this many times when a pasted key happens
/// to collide with an existing one.
const PASTE_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no field with id '{0}'")]
    FieldNotFound(String),
    #[error("field '{0}' is not a section")]
    NotASection(String),
    #[error("index {index} is out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot patch field '{id}': {reason}")]
    InvalidPatch { id: String, reason: String },
    #[error(transparent)]
    Schema(#[from] ImportError),
}

pub struct DesignerStore {
    present: Snapshot,
    history: History,
    selected_id: Option<String>,
    clipboard: Clipboard,
    config: StoreConfig,
    storage: Option<Box<dyn Storage>>,
}

impl Default for DesignerStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl DesignerStore {
    /// Empty store without persistence.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            present: Arc::new(Schema::empty()),
            history: History::new(config.history_capacity),
            selected_id: None,
            clipboard: Clipboard::default(),
            config,
            storage: None,
        }
    }

    /// Store backed by `storage`. Saved state is loaded once here; if it is
    /// missing, unreadable or invalid the store starts empty.
    pub fn with_storage(config: StoreConfig, storage: impl Storage + 'static) -> Self {
        let mut store = Self::new(config);
        match load_state(&storage, &store.config.storage_key) {
            Ok(Some(state)) => {
                if let Err(err) = store.adopt(state) {
                    warn!(key = %store.config.storage_key, error = %err, "discarding persisted designer state");
                }
            }
            Ok(None) => debug!(key = %store.config.storage_key, "no persisted designer state"),
            Err(err) => {
                warn!(key = %store.config.storage_key, error = %err, "could not load designer state")
            }
        }
        store.storage = Some(Box::new(storage));
        store
    }

    fn adopt(&mut self, state: DesignerState) -> Result<(), ImportError> {
        state.schema.check()?;
        let capacity = self.config.history_capacity;
        let check_all = |schemas: Vec<Schema>| -> Result<Vec<Snapshot>, ImportError> {
            schemas
                .into_iter()
                .map(|schema| schema.check().map(|()| Arc::new(schema)))
                .collect()
        };
        let past = check_all(state.history.past)?;
        let future = check_all(state.history.future)?;
        self.history = History::from_parts(past, future, capacity);
        self.present = Arc::new(state.schema);
        self.selected_id = state.selected_id;
        Ok(())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        &self.present
    }

    /// Shared handle to the present schema.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.present)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Field> {
        self.selected_id
            .as_deref()
            .and_then(|id| tree::find_by_id(&self.present.fields, id))
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn find(&self, id: &str) -> Option<&Field> {
        tree::find_by_id(&self.present.fields, id)
    }

    /// Moves the cursor. The id is not checked against the tree.
    pub fn select(&mut self, id: Option<String>) {
        if self.selected_id != id {
            self.selected_id = id;
            self.save();
        }
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), StoreError> {
        let mut fields = self.present.fields.clone();
        fields.push(field);
        self.commit("add_field", fields)
    }

    pub fn add_child(&mut self, section_id: &str, field: Field) -> Result<(), StoreError> {
        self.require_section(section_id)?;
        let fields = tree::insert_child(&self.present.fields, section_id, field);
        self.commit("add_child", fields)
    }

    /// Merges `patch` into the field with `id`. A patch that changes
    /// nothing records no history.
    pub fn update_field(&mut self, id: &str, patch: &FieldPatch) -> Result<(), StoreError> {
        let current = self.require(id)?;
        let updated = patch.apply(current)?;
        if &updated == current {
            return Ok(());
        }
        let mut replacement = Some(updated);
        let fields = tree::map_all(&self.present.fields, &mut |field| {
            if field.id == id
                && let Some(updated) = replacement.take()
            {
                return updated;
            }
            field
        });
        self.commit("update_field", fields)
    }

    /// Removes the field and everything it owns. The selection is cleared
    /// when it pointed anywhere inside the removed subtree.
    pub fn remove_field(&mut self, id: &str) -> Result<(), StoreError> {
        let removed = self.require(id)?;
        let clears_selection = self
            .selected_id
            .as_deref()
            .is_some_and(|selected| tree::subtree_contains(removed, selected));
        let fields = tree::remove_by_id(&self.present.fields, id);
        if clears_selection {
            self.selected_id = None;
        }
        self.commit("remove_field", fields)
    }

    /// Reorders the root list. `from == to` is a no-op once both indices
    /// are in range.
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        check_range(self.present.fields.len(), from, to)?;
        if from == to {
            return Ok(());
        }
        let fields = tree::reorder_within(&self.present.fields, from, to);
        self.commit("move_field", fields)
    }

    /// Reorders the children of the section `parent_id`.
    pub fn move_child(&mut self, parent_id: &str, from: usize, to: usize) -> Result<(), StoreError> {
        let children = self.require_section(parent_id)?;
        check_range(children.len(), from, to)?;
        if from == to {
            return Ok(());
        }
        let fields = tree::map_all(&self.present.fields, &mut |mut field| {
            if field.id == parent_id
                && let Some(children) = field.children_mut()
            {
                *children = tree::reorder_within(children, from, to);
            }
            field
        });
        self.commit("move_child", fields)
    }

    /// Puts a deep copy of the field into the clipboard. History is not
    /// touched.
    pub fn copy(&mut self, id: &str) -> Result<(), StoreError> {
        let field = tree::find_by_id(&self.present.fields, id)
            .ok_or_else(|| StoreError::FieldNotFound(id.to_string()))?;
        self.clipboard.copy(field);
        debug!(id, "copied field");
        Ok(())
    }

    /// Inserts a fresh copy of the clipboard at the root or into `target`.
    /// Returns the id of the inserted field, or `None` when the clipboard
    /// is empty.
    pub fn paste(&mut self, target: Option<&str>) -> Result<Option<String>, StoreError> {
        if self.clipboard.is_empty() {
            return Ok(None);
        }
        if let Some(target) = target {
            self.require_section(target)?;
        }
        let mut attempt = 0;
        loop {
            attempt += 1;
            let Some(field) = self.clipboard.instantiate() else {
                return Ok(None);
            };
            let id = field.id.clone();
            let fields = match target {
                Some(target) => tree::insert_child(&self.present.fields, target, field),
                None => {
                    let mut fields = self.present.fields.clone();
                    fields.push(field);
                    fields
                }
            };
            match self.commit("paste", fields) {
                Ok(()) => return Ok(Some(id)),
                Err(StoreError::Schema(ImportError::DuplicateKey { .. })) if attempt < PASTE_ATTEMPTS => {
                    debug!(attempt, "pasted key collided; drawing new identities");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Steps back one snapshot. `false` at the start of history.
    pub fn undo(&mut self) -> bool {
        let moved = self.history.undo(&mut self.present);
        if moved {
            self.after_time_travel("undo");
        }
        moved
    }

    /// Steps forward one snapshot. `false` at the end of history.
    pub fn redo(&mut self) -> bool {
        let moved = self.history.redo(&mut self.present);
        if moved {
            self.after_time_travel("redo");
        }
        moved
    }

    fn after_time_travel(&mut self, label: &'static str) {
        if let Some(selected) = self.selected_id.as_deref()
            && tree::find_by_id(&self.present.fields, selected).is_none()
        {
            self.selected_id = None;
        }
        debug!(op = label, fields = self.present.fields.len(), "moved through history");
        self.save();
    }

    /// Replaces the present schema with a parsed external document. Nothing
    /// changes unless the whole document is acceptable.
    pub fn import_schema(&mut self, text: &str) -> Result<(), StoreError> {
        let schema = Schema::from_json(text)?;
        self.replace_schema(schema)
    }

    /// Replaces the present schema wholesale, as one undoable step.
    pub fn replace_schema(&mut self, schema: Schema) -> Result<(), StoreError> {
        schema.check()?;
        if let Some(selected) = self.selected_id.as_deref()
            && tree::find_by_id(&schema.fields, selected).is_none()
        {
            self.selected_id = None;
        }
        self.commit_schema("import", schema);
        Ok(())
    }

    /// Canonical text of the present schema.
    pub fn export_schema(&self) -> Result<String, serde_json::Error> {
        self.present.to_json()
    }

    /// Applies one wire-form operation. Returns whether the present schema
    /// changed.
    pub fn dispatch(&mut self, op: Operation) -> Result<bool, StoreError> {
        let before = self.snapshot();
        match op {
            Operation::Select { id } => self.select(id),
            Operation::Create {
                field_type,
                label,
                parent,
            } => {
                let label = label.unwrap_or_else(|| field_type.palette_label().to_string());
                let field = create_field(field_type, label);
                match parent {
                    Some(parent) => self.add_child(&parent, field)?,
                    None => self.add_field(field)?,
                }
            }
            Operation::AddField { field } => self.add_field(field)?,
            Operation::AddChild { section_id, field } => self.add_child(&section_id, field)?,
            Operation::UpdateField { id, patch } => self.update_field(&id, &patch)?,
            Operation::RemoveField { id } => self.remove_field(&id)?,
            Operation::MoveField { from, to } => self.move_field(from, to)?,
            Operation::MoveChild {
                parent_id,
                from,
                to,
            } => self.move_child(&parent_id, from, to)?,
            Operation::Copy { id } => self.copy(&id)?,
            Operation::Paste { target } => {
                self.paste(target.as_deref())?;
            }
            Operation::Undo => {
                self.undo();
            }
            Operation::Redo => {
                self.redo();
            }
            Operation::Import { schema } => self.replace_schema(schema)?,
        }
        Ok(!Arc::ptr_eq(&before, &self.present))
    }

    /// Runs a shortcut action against the current selection. Copy and
    /// delete need a selected field; paste goes into the selected section,
    /// or the root otherwise.
    pub fn perform(&mut self, action: EditorAction) -> Result<bool, StoreError> {
        let selected = self.selected_id.clone();
        match (action, selected) {
            (EditorAction::Undo, _) => Ok(self.undo()),
            (EditorAction::Redo, _) => Ok(self.redo()),
            (EditorAction::Copy, Some(id)) => self.copy(&id).map(|()| false),
            (EditorAction::Paste, selected) => {
                let target = selected
                    .filter(|id| self.find(id).is_some_and(Field::is_section));
                Ok(self.paste(target.as_deref())?.is_some())
            }
            (EditorAction::Delete, Some(id)) => self.remove_field(&id).map(|()| true),
            (EditorAction::Copy | EditorAction::Delete, None) => Ok(false),
        }
    }

    fn require(&self, id: &str) -> Result<&Field, StoreError> {
        tree::find_by_id(&self.present.fields, id).ok_or_else(|| StoreError::FieldNotFound(id.to_string()))
    }

    fn require_section(&self, id: &str) -> Result<&[Field], StoreError> {
        let field = self.require(id)?;
        match &field.kind {
            FieldKind::Section { children } => Ok(children),
            _ => Err(StoreError::NotASection(id.to_string())),
        }
    }

    fn commit(&mut self, label: &'static str, fields: Vec<Field>) -> Result<(), StoreError> {
        let next = Schema {
            version: self.present.version,
            fields,
        };
        next.check()?;
        self.commit_schema(label, next);
        Ok(())
    }

    fn commit_schema(&mut self, label: &'static str, next: Schema) {
        let previous = std::mem::replace(&mut self.present, Arc::new(next));
        self.history.record(previous);
        debug!(
            op = label,
            fields = self.present.fields.len(),
            undo_depth = self.history.past().len(),
            "committed schema mutation"
        );
        self.save();
    }

    fn save(&mut self) {
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        let state = DesignerState {
            schema: Schema::clone(&self.present),
            history: PersistedHistory {
                past: self.history.past().map(|s| Schema::clone(s)).collect(),
                future: self.history.future().map(|s| Schema::clone(s)).collect(),
            },
            selected_id: self.selected_id.clone(),
        };
        let result = PersistedState::new(state)
            .encode()
            .and_then(|text| storage.set(&self.config.storage_key, &text));
        if let Err(err) = result {
            warn!(key = %self.config.storage_key, error = %err, "could not save designer state");
        }
    }
}

fn load_state(storage: &dyn Storage, key: &str) -> Result<Option<DesignerState>, PersistError> {
    let Some(text) = storage.get(key)? else {
        return Ok(None);
    };
    Ok(Some(PersistedState::decode(&text)?.state))
}

fn check_range(len: usize, from: usize, to: usize) -> Result<(), StoreError> {
    for index in [from, to] {
        if index >= len {
            return Err(StoreError::IndexOutOfRange { index, len });
        }
    }
    Ok(())
}
