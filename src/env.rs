use tracing::debug;

use crate::error::CalcError;

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: f64,
}

/// Variables of one session, in declaration order. Names are unique and
/// entries are never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolTable {
    vars: Vec<Variable>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding `pi` and `e`.
    pub fn with_constants() -> Self {
        Self {
            vars: vec![
                Variable {
                    name: "pi".to_string(),
                    value: std::f64::consts::PI,
                },
                Variable {
                    name: "e".to_string(),
                    value: std::f64::consts::E,
                },
            ],
        }
    }

    pub fn lookup(&self, name: &str) -> Result<f64, CalcError> {
        self.vars
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value)
            .ok_or_else(|| CalcError::undefined_name(name))
    }

    pub fn assign(&mut self, name: &str, value: f64) -> Result<(), CalcError> {
        let var = self
            .vars
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| CalcError::undefined_variable(name))?;
        debug!(name, old = var.value, new = value, "assign");
        var.value = value;
        Ok(())
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name)
    }

    pub fn declare(&mut self, name: &str, value: f64) -> Result<f64, CalcError> {
        if self.is_declared(name) {
            return Err(CalcError::declared_twice(name));
        }
        debug!(name, value, "declare");
        self.vars.push(Variable {
            name: name.to_string(),
            value,
        });
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }
}

impl std::fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, var) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", var.name, var.value)?;
        }
        write!(f, "}}")
    }
}
