//! Keyboard shortcuts as explicit, detachable subscriptions.
//!
//! An embedding surface attaches its bindings when it mounts and detaches
//! them with the returned handle when it unmounts. Attaching again under the
//! same owner replaces the earlier subscription, so a remount never leaves
//! duplicate bindings behind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Editor commands a shortcut can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorAction {
    Undo,
    Redo,
    Copy,
    Paste,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeystrokeError {
    #[error("empty keystroke")]
    Empty,
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
    #[error("keystroke '{0}' has no key")]
    MissingKey(String),
}

/// A key plus modifiers. `ctrl`, `cmd` and `meta` all count as the primary
/// modifier so one binding serves every platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub primary: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: String,
}

impl Keystroke {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            primary: false,
            shift: false,
            alt: false,
            key: key.into().to_ascii_lowercase(),
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

impl FromStr for Keystroke {
    type Err = KeystrokeError;

    /// Parses `ctrl+shift+z`, `cmd-c` or `Delete`. Case does not matter.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim();
        if input.is_empty() {
            return Err(KeystrokeError::Empty);
        }
        let lowered = input.to_ascii_lowercase();
        let mut parts: Vec<&str> = lowered.split(['+', '-']).collect();
        let key = parts.pop().filter(|key| !key.is_empty());
        let Some(key) = key else {
            return Err(KeystrokeError::MissingKey(input.to_string()));
        };
        let mut stroke = Keystroke::new(key);
        for modifier in parts {
            match modifier {
                "ctrl" | "control" | "cmd" | "command" | "meta" | "super" => stroke.primary = true,
                "shift" => stroke.shift = true,
                "alt" | "option" => stroke.alt = true,
                other => return Err(KeystrokeError::UnknownModifier(other.to_string())),
            }
        }
        Ok(stroke)
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.primary {
            f.write_str("ctrl+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        f.write_str(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub keystroke: Keystroke,
    pub action: EditorAction,
}

impl Binding {
    pub fn new(keystroke: Keystroke, action: EditorAction) -> Self {
        Self { keystroke, action }
    }
}

/// Bindings of the designer: undo, redo (two spellings), copy, paste and
/// delete.
pub fn default_bindings() -> Vec<Binding> {
    vec![
        Binding::new(Keystroke::new("z").primary(), EditorAction::Undo),
        Binding::new(Keystroke::new("z").primary().shift(), EditorAction::Redo),
        Binding::new(Keystroke::new("y").primary(), EditorAction::Redo),
        Binding::new(Keystroke::new("c").primary(), EditorAction::Copy),
        Binding::new(Keystroke::new("v").primary(), EditorAction::Paste),
        Binding::new(Keystroke::new("delete"), EditorAction::Delete),
    ]
}

/// Handle for one attached set of bindings.
#[must_use = "dropping the handle makes the subscription impossible to detach"]
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: u64,
}

#[derive(Debug)]
struct Entry {
    id: u64,
    owner: String,
    bindings: Vec<Binding>,
}

#[derive(Debug, Default)]
pub struct ShortcutMap {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ShortcutMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `bindings` for `owner`, replacing what that owner had
    /// attached before.
    pub fn attach(&mut self, owner: impl Into<String>, bindings: Vec<Binding>) -> Subscription {
        let owner = owner.into();
        self.entries.retain(|entry| entry.owner != owner);
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Entry {
            id,
            owner,
            bindings,
        });
        Subscription { id }
    }

    /// Removes exactly the subscription behind `subscription`. Returns
    /// `false` when it was already replaced or detached.
    pub fn detach(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != subscription.id);
        self.entries.len() != before
    }

    /// Action bound to `keystroke`. Later subscriptions win.
    pub fn resolve(&self, keystroke: &Keystroke) -> Option<EditorAction> {
        self.entries.iter().rev().find_map(|entry| {
            entry
                .bindings
                .iter()
                .find(|binding| &binding.keystroke == keystroke)
                .map(|binding| binding.action)
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(input: &str) -> Keystroke {
        input.parse().expect("keystroke")
    }

    #[test]
    fn parses_platform_spellings_alike() {
        assert_eq!(key("ctrl+z"), key("Cmd-Z"));
        assert_eq!(key("meta+shift+z"), Keystroke::new("z").primary().shift());
        assert_eq!(key("Delete"), Keystroke::new("delete"));
        assert_eq!(key("ctrl+shift+z").to_string(), "ctrl+shift+z");
        assert!(matches!("hyper+z".parse::<Keystroke>(), Err(KeystrokeError::UnknownModifier(_))));
        assert!(matches!("ctrl+".parse::<Keystroke>(), Err(KeystrokeError::MissingKey(_))));
    }

    #[test]
    fn defaults_cover_designer_actions() {
        let mut map = ShortcutMap::new();
        let _sub = map.attach("designer", default_bindings());
        assert_eq!(map.resolve(&key("ctrl+z")), Some(EditorAction::Undo));
        assert_eq!(map.resolve(&key("cmd+shift+z")), Some(EditorAction::Redo));
        assert_eq!(map.resolve(&key("ctrl+y")), Some(EditorAction::Redo));
        assert_eq!(map.resolve(&key("delete")), Some(EditorAction::Delete));
        assert_eq!(map.resolve(&key("ctrl+x")), None);
    }

    #[test]
    fn remount_does_not_duplicate() {
        let mut map = ShortcutMap::new();
        let first = map.attach("designer", default_bindings());
        let second = map.attach("designer", default_bindings());
        assert_eq!(map.len(), 1);
        assert!(!map.detach(first));
        assert!(map.detach(second));
        assert!(map.is_empty());
        assert_eq!(map.resolve(&key("ctrl+z")), None);
    }

    #[test]
    fn detach_leaves_other_owners_alone() {
        let mut map = ShortcutMap::new();
        let designer = map.attach("designer", default_bindings());
        let _preview = map.attach(
            "preview",
            vec![Binding::new(key("ctrl+c"), EditorAction::Copy)],
        );
        assert!(map.detach(designer));
        assert_eq!(map.resolve(&key("ctrl+c")), Some(EditorAction::Copy));
        assert_eq!(map.resolve(&key("ctrl+z")), None);
    }
}
