use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::DialogScript;

/// Scripts by name. Filled at startup, read-only while serving.
#[derive(Default)]
pub struct ScriptRegistry {
    scripts: HashMap<String, Arc<DialogScript>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in scripts.
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(DialogScript::party()?);
        Ok(registry)
    }

    /// Add a script, returning the one it replaced.
    pub fn register(&mut self, script: DialogScript) -> Option<Arc<DialogScript>> {
        self.scripts.insert(script.name.clone(), Arc::new(script))
    }

    /// Register every `*.json` script in `dir`. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read scripts directory {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let script = DialogScript::load(path)?;
            info!(script = %script.name, path = %path.display(), "loaded dialog script");
            self.register(script);
        }
        Ok(paths.len())
    }

    pub fn get(&self, name: &str) -> Option<Arc<DialogScript>> {
        self.scripts.get(name).cloned()
    }

    /// Registered script names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scripts.keys().cloned().collect();
        names.sort();
        names
    }
}
