use crate::value::Value;
use std::collections::HashMap;

/// Mutable state shared by every command of one interactive session.
///
/// The session contains:
/// - `vars`: variables assigned by expression statements (e.g. `x = 1`).
/// - `should_exit`: a flag that a command can raise to stop the loop.
///
/// Fields are public so meta verbs and tests can reach them directly.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Variables visible to expressions, keyed by name.
    pub vars: HashMap<String, Value>,
    /// When set to true, the command loop stops after the current command.
    pub should_exit: bool,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a variable.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Set or override a variable.
    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Remove a variable, returning its previous value.
    pub fn remove_var(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Variables sorted by name.
    pub fn sorted_vars(&self) -> Vec<(&str, &Value)> {
        let mut vars: Vec<_> = self.vars.iter().map(|(k, v)| (k.as_str(), v)).collect();
        vars.sort_by(|a, b| a.0.cmp(b.0));
        vars
    }
}
