use crate::factory::regenerate_identity;
use crate::spec::Field;

/// Single-slot holder for a copied subtree.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<Field>,
}

impl Clipboard {
    /// Stores a deep copy of `field`, replacing any earlier copy. Ids are
    /// kept as they were at copy time.
    pub fn copy(&mut self, field: &Field) {
        self.slot = Some(field.clone());
    }

    pub fn peek(&self) -> Option<&Field> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// A fresh deep copy of the contents with a new id and key on every
    /// node. The stored copy is left untouched so it can be pasted again.
    pub fn instantiate(&self) -> Option<Field> {
        let mut field = self.slot.clone()?;
        regenerate_identity(&mut field);
        Some(field)
    }
}
