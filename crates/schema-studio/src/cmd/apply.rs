use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Args;
use form_schema::{
    DesignerStore, FileStorage, Keystroke, Operation, ShortcutMap, default_bindings,
};

use crate::config::StudioConfig;

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// One operation or a list of operations, e.g. `{"op": "create", "type": "text"}`
    #[arg(long, value_name = "ops.json")]
    pub ops: Option<PathBuf>,
    /// Schema to start from; replaces the session's schema as one undoable step
    #[arg(long, value_name = "schema.json")]
    pub schema: Option<PathBuf>,
    /// Directory holding designer state between invocations
    #[arg(long, value_name = "DIR")]
    pub session: Option<PathBuf>,
    /// Keystrokes run after the operations, e.g. `ctrl+z` or `delete`
    #[arg(long = "key", value_name = "KEYSTROKE")]
    pub keys: Vec<Keystroke>,
    /// Write the resulting schema here instead of stdout
    #[arg(long, value_name = "schema.json")]
    pub out: Option<PathBuf>,
}

/// Runs the operations in order. Operations before a failing one stay
/// applied, and are saved when a session is in use.
pub fn run(args: ApplyArgs, config: &StudioConfig) -> Result<()> {
    if args.ops.is_none() && args.schema.is_none() && args.keys.is_empty() {
        bail!("nothing to apply: pass --ops, --schema or --key");
    }
    let mut store = match &args.session {
        Some(dir) => DesignerStore::with_storage(config.store.clone(), FileStorage::new(dir)),
        None => DesignerStore::new(config.store.clone()),
    };

    if let Some(path) = &args.schema {
        let text = super::read_text(path)?;
        store
            .import_schema(&text)
            .with_context(|| format!("{} is not a valid schema", path.display()))?;
    }

    let ops = match &args.ops {
        Some(path) => {
            let text = super::read_text(path)?;
            Operation::parse_batch(&text)
                .with_context(|| format!("{} does not hold valid operations", path.display()))?
        }
        None => Vec::new(),
    };
    let total = ops.len();
    let mut changed = 0usize;
    for (index, op) in ops.into_iter().enumerate() {
        tracing::debug!(index, ?op, "dispatching");
        if store
            .dispatch(op)
            .with_context(|| format!("operation #{} of {total} failed", index + 1))?
        {
            changed += 1;
        }
    }

    changed += perform_keys(&mut store, &args.keys)?;

    eprintln!(
        "applied {total} operation(s) and {} keystroke(s), {changed} changed the schema",
        args.keys.len()
    );
    let mut text = store.export_schema().context("failed to encode schema")?;
    text.push('\n');
    match &args.out {
        Some(path) => super::write_text(path, &text),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

/// Resolves each keystroke through the default bindings and performs it.
/// Returns how many of them changed the schema.
pub fn perform_keys(store: &mut DesignerStore, keys: &[Keystroke]) -> Result<usize> {
    if keys.is_empty() {
        return Ok(0);
    }
    let mut shortcuts = ShortcutMap::new();
    let subscription = shortcuts.attach("schema-studio", default_bindings());
    let mut changed = 0usize;
    for keystroke in keys {
        let action = shortcuts
            .resolve(keystroke)
            .ok_or_else(|| anyhow!("'{keystroke}' is not bound to an editor action"))?;
        if store
            .perform(action)
            .with_context(|| format!("'{keystroke}' failed"))?
        {
            changed += 1;
        }
    }
    let detached = shortcuts.detach(subscription);
    debug_assert!(detached, "studio bindings are attached once per run");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_schema::{FieldType, create_field};

    fn keys(raw: &[&str]) -> Vec<Keystroke> {
        raw.iter().map(|key| key.parse().expect("keystroke")).collect()
    }

    #[test]
    fn keystrokes_drive_history_and_selection() {
        let mut store = DesignerStore::default();
        let field = create_field(FieldType::Text, "Name");
        let id = field.id.clone();
        store.add_field(field).unwrap();
        store.select(Some(id.clone()));

        assert_eq!(perform_keys(&mut store, &keys(&["ctrl+c", "ctrl+v"])).unwrap(), 1);
        assert_eq!(store.schema().fields.len(), 2);
        assert_eq!(perform_keys(&mut store, &keys(&["delete", "cmd+z"])).unwrap(), 2);
        assert!(store.find(&id).is_some());
        assert_eq!(perform_keys(&mut store, &[]).unwrap(), 0);
    }

    #[test]
    fn unbound_keystroke_is_an_error() {
        let mut store = DesignerStore::default();
        let err = perform_keys(&mut store, &keys(&["ctrl+q"])).unwrap_err();
        assert!(err.to_string().contains("not bound"));
    }
}
