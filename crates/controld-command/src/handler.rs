//! Command name dispatch.
//!
//! The [`CommandHandler`] is a cheap, clonable handle onto one shared
//! name-to-command map. Every transport holds a clone. The map lock is held
//! only to look a command up or to insert one; commands run with it released,
//! so a command such as `help` can consult the map itself.

use crate::binding::Command;
use crate::response;
use controld_core::Error;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info, warn};

/// Registered commands by name.
#[derive(Default)]
pub struct CommandMap {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandMap {
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Registered names in iteration order.
    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn insert(&mut self, command: Arc<dyn Command>) -> Option<Arc<dyn Command>> {
        self.commands.insert(command.name().to_string(), command)
    }
}

impl fmt::Debug for CommandMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.commands.keys()).finish()
    }
}

/// Shared command table.
#[derive(Debug, Clone, Default)]
pub struct CommandHandler {
    commands: Arc<Mutex<CommandMap>>,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the map lock cannot leave the map half-written,
    // so a poisoned lock is still safe to use.
    fn map(&self) -> MutexGuard<'_, CommandMap> {
        self.commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a command under its own name.
    ///
    /// A command already registered under that name is replaced and
    /// returned.
    pub fn register(&self, command: Arc<dyn Command>) -> Option<Arc<dyn Command>> {
        let name = command.name().to_string();
        let previous = self.map().insert(command);
        if previous.is_some() {
            warn!(command = %name, "command registered twice, replacing");
        } else {
            info!(command = %name, "command registered");
        }
        previous
    }

    /// Execute the command registered under `name`.
    ///
    /// An unknown name yields a `CMD_INVALID` response.
    pub fn dispatch(&self, name: &str, params: &Value) -> Value {
        // Clone the command out so the map lock is released while it runs
        let command = self.map().get(name);
        match command {
            Some(command) => {
                debug!(command = %name, "dispatching");
                command.execute(params)
            }
            None => {
                warn!(command = %name, "unknown command");
                response::failure(&Error::cmd_invalid(name))
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map().get(name).is_some()
    }

    /// Usage text of a registered command.
    pub fn usage(&self, name: &str) -> Option<String> {
        self.map().get(name).map(|command| command.usage().to_string())
    }

    pub fn names(&self) -> Vec<String> {
        self.map().names()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Weak reference to the command map, for commands that inspect it.
    pub fn downgrade(&self) -> Weak<Mutex<CommandMap>> {
        Arc::downgrade(&self.commands)
    }
}
