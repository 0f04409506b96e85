use crate::value::Value;
use std::collections::HashMap;

/// Variable and function bindings for one interpreter run.
///
/// Functions only record their declared parameter names; no body is stored.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: HashMap<String, Value>,
    functions: HashMap<String, Vec<String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Binds `name`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn define_function(&mut self, name: &str, params: Vec<String>) {
        self.functions.insert(name.to_string(), params);
    }

    pub fn function_params(&self, name: &str) -> Option<&[String]> {
        self.functions.get(name).map(Vec::as_slice)
    }
}
