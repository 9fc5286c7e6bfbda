use std::collections::HashMap;

use scanner::Token;

use crate::{value::Value, RuntimeError, RuntimeErrorType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScopeId(usize);

#[derive(Debug, Default)]
struct Scope {
    values: HashMap<String, Value>,
    enclosing: Option<ScopeId>,
}

/// Arena of nested scopes. Index 0 is the root scope and lives as long as the environment,
/// every other scope is pushed on block entry and popped on block exit.
#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Self { scopes: vec![Scope::default()], current: ScopeId(0) }
    }
}

impl Environment {
    pub fn push_scope(&mut self) {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope { values: HashMap::new(), enclosing: Some(self.current) });
        self.current = id;
        log::debug!("Pushed scope {}", id.0);
    }

    /// Pops the innermost scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if let Some(enclosing) = self.scope(self.current).enclosing {
            log::debug!("Popping scope {}", self.current.0);
            self.scopes.pop();
            self.current = enclosing;
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the innermost scope, replacing any previous binding there.
    pub fn define(&mut self, name: &str, value: Value) {
        let current = self.current;
        self.scope_mut(current).values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<&Value, RuntimeError> {
        self.resolve(name)
            .and_then(|id| self.scope(id).values.get(name.lexeme()))
            .ok_or_else(|| undefined(name))
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let id = self.resolve(name).ok_or_else(|| undefined(name))?;
        self.scope_mut(id).values.insert(name.lexeme().to_string(), value);
        Ok(())
    }

    /// Innermost scope that binds `name`.
    fn resolve(&self, name: &Token) -> Option<ScopeId> {
        let mut id = Some(self.current);
        while let Some(scope_id) = id {
            let scope = self.scope(scope_id);
            if scope.values.contains_key(name.lexeme()) {
                return Some(scope_id);
            }
            id = scope.enclosing;
        }
        None
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeErrorType::UndefinedVariable(name.lexeme().to_string()).at(name)
}
