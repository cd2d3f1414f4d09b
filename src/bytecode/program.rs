use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::instruction::{Instruction, Literal, VarSlot};

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("failed to read program: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed program: {0}")]
    Json(#[from] serde_json::Error),
    #[error("function `{0}` is defined more than once")]
    DuplicateFunction(String),
    #[error("parameter {index} of `{function}` is required but follows an optional parameter")]
    RequiredAfterOptional { function: String, index: usize },
}

/// One postfix expression with the source line it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub code: Vec<Instruction>,
    #[serde(default)]
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(default)]
    pub byref: bool,
    #[serde(default)]
    pub default: Option<Literal>,
}

/// A user function. Local slots are laid out as the formal parameters,
/// then the variadic array (if any), then `locals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub locals: Vec<String>,
    /// Slots of the creating frame captured by `MakeClosure`.
    #[serde(default)]
    pub captures: Vec<VarSlot>,
    #[serde(default)]
    pub body: Vec<Expression>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub globals: Vec<String>,
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    #[serde(default)]
    pub main: Vec<Expression>,
}

impl Expression {
    pub fn new(code: Vec<Instruction>, line: u32) -> Self {
        Self { code, line }
    }
}

impl ParamDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            byref: false,
            default: None,
        }
    }

    pub fn byref(mut self) -> Self {
        self.byref = true;
        self
    }

    pub fn with_default(mut self, default: Literal) -> Self {
        self.default = Some(default);
        self
    }
}

impl FunctionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            variadic: false,
            locals: Vec::new(),
            captures: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn local_count(&self) -> usize {
        self.params.len() + usize::from(self.variadic) + self.locals.len()
    }

    pub fn min_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }
}

impl Program {
    pub fn from_json(source: &str) -> Result<Self, ProgramError> {
        let program: Program = serde_json::from_str(source)?;
        program.validate()?;
        Ok(program)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn validate(&self) -> Result<(), ProgramError> {
        let mut seen = rustc_hash::FxHashSet::default();
        for function in &self.functions {
            if !seen.insert(function.name.to_lowercase()) {
                return Err(ProgramError::DuplicateFunction(function.name.clone()));
            }
            let mut optional = false;
            for (index, param) in function.params.iter().enumerate() {
                if param.default.is_some() {
                    optional = true;
                } else if optional {
                    return Err(ProgramError::RequiredAfterOptional {
                        function: function.name.clone(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }
}
