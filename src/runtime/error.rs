use std::{fmt, rc::Rc};

use thiserror::Error;

use crate::runtime::value::Value;

/// A registered runtime error. `message` may contain `{}` placeholders that
/// are filled positionally by [`Exception::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: &'static str,
    pub title: &'static str,
    pub message: &'static str,
    pub hint: Option<&'static str>,
}

pub const WRONG_NUMBER_OF_ARGUMENTS: ErrorCode = ErrorCode {
    code: "E1000",
    title: "WRONG NUMBER OF ARGUMENTS",
    message: "`{}` expects {} arguments, got {}.",
    hint: None,
};

pub const NOT_A_FUNCTION: ErrorCode = ErrorCode {
    code: "E1001",
    title: "NOT A FUNCTION",
    message: "Cannot call a non-function value (got {}).",
    hint: None,
};

pub const UNKNOWN_FUNCTION: ErrorCode = ErrorCode {
    code: "E1002",
    title: "UNKNOWN FUNCTION",
    message: "Function `{}` is not defined.",
    hint: None,
};

pub const UNKNOWN_PROPERTY: ErrorCode = ErrorCode {
    code: "E1003",
    title: "UNKNOWN PROPERTY",
    message: "This value of type {} has no property named `{}`.",
    hint: Some("Define the property, or a __Get meta-method on the prototype chain."),
};

pub const UNKNOWN_METHOD: ErrorCode = ErrorCode {
    code: "E1004",
    title: "UNKNOWN METHOD",
    message: "This value of type {} has no method named `{}`.",
    hint: Some("Define the method, or a __Call meta-method on the prototype chain."),
};

pub const READ_ONLY_PROPERTY: ErrorCode = ErrorCode {
    code: "E1005",
    title: "READ-ONLY PROPERTY",
    message: "Property `{}` has no setter.",
    hint: None,
};

pub const WRITE_ONLY_PROPERTY: ErrorCode = ErrorCode {
    code: "E1006",
    title: "WRITE-ONLY PROPERTY",
    message: "Property `{}` has no getter.",
    hint: None,
};

pub const NOT_AN_OBJECT: ErrorCode = ErrorCode {
    code: "E1007",
    title: "NOT AN OBJECT",
    message: "Expected an object, got {}.",
    hint: None,
};

pub const NOT_ASSIGNABLE: ErrorCode = ErrorCode {
    code: "E1008",
    title: "NOT ASSIGNABLE",
    message: "The left side of `{}` is not a writable variable.",
    hint: None,
};

pub const INVALID_BASE: ErrorCode = ErrorCode {
    code: "E1009",
    title: "INVALID BASE",
    message: "Cannot set base: {}.",
    hint: None,
};

pub const INDEX_OUT_OF_RANGE: ErrorCode = ErrorCode {
    code: "E1010",
    title: "INDEX OUT OF RANGE",
    message: "Index {} is out of range for length {}.",
    hint: Some("Indices start at 1; negative indices count from the end."),
};

pub const MISSING_PARAMETER: ErrorCode = ErrorCode {
    code: "E1011",
    title: "MISSING PARAMETER",
    message: "Parameter `{}` of `{}` is required.",
    hint: None,
};

pub const RECURSION_LIMIT: ErrorCode = ErrorCode {
    code: "E1012",
    title: "RECURSION LIMIT",
    message: "Call depth exceeded {} while calling `{}`.",
    hint: Some("Raise max_call_depth or check for unbounded recursion."),
};

pub const OUT_OF_MEMORY: ErrorCode = ErrorCode {
    code: "E1013",
    title: "OUT OF MEMORY",
    message: "Failed to allocate {} more bytes.",
    hint: None,
};

pub const TYPE_MISMATCH: ErrorCode = ErrorCode {
    code: "E1014",
    title: "TYPE MISMATCH",
    message: "`{}` expected {} to be {}, got {}.",
    hint: None,
};

pub const INVALID_TYPE_NAME: ErrorCode = ErrorCode {
    code: "E1015",
    title: "INVALID TYPE NAME",
    message: "`{}` is not a type category.",
    hint: Some("Use number, integer, float, string, object, alpha, digit, xdigit, space, upper, lower, alnum or byref."),
};

pub const THROWN: ErrorCode = ErrorCode {
    code: "E1016",
    title: "UNCAUGHT EXCEPTION",
    message: "{}",
    hint: None,
};

pub const INVALID_VALUE: ErrorCode = ErrorCode {
    code: "E1017",
    title: "INVALID VALUE",
    message: "{}",
    hint: None,
};

pub const KEY_NOT_FOUND: ErrorCode = ErrorCode {
    code: "E1018",
    title: "KEY NOT FOUND",
    message: "Key `{}` not found.",
    hint: None,
};

/// Evaluation errors abort the current expression; they indicate a malformed
/// instruction stream rather than a script-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("stack underflow at instruction {0}")]
    StackUnderflow(usize),
    #[error("expression left {0} values on the stack")]
    LeftoverValues(usize),
    #[error("expression produced no value")]
    NoResult,
    #[error("jump target {target} out of range at instruction {ip}")]
    BadJump { ip: usize, target: usize },
    #[error("unresolved variable slot {0}")]
    UnresolvedSlot(String),
    #[error("unknown function definition `{0}`")]
    UnknownDefinition(String),
}

#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error("{0}")]
    Thrown(Box<Exception>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    pub name: Rc<str>,
    pub line: u32,
}

/// A thrown value propagating toward the caller.
#[derive(Debug, Clone)]
pub struct Exception {
    pub code: &'static ErrorCode,
    pub message: String,
    pub what: Option<String>,
    pub extra: Option<String>,
    pub line: Option<u32>,
    pub stack: Vec<StackEntry>,
    /// The script value passed to `throw`, if any.
    pub payload: Option<Value>,
}

impl Exception {
    pub fn new(code: &'static ErrorCode, values: &[&str]) -> Self {
        Self {
            code,
            message: fill_template(code.message, values),
            what: None,
            extra: None,
            line: None,
            stack: Vec::new(),
            payload: None,
        }
    }

    pub fn with_what(mut self, what: impl Into<String>) -> Self {
        self.what = Some(what.into());
        self
    }

    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = Some(extra.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn at_line(&mut self, line: u32) {
        if self.line.is_none() && line > 0 {
            self.line = Some(line);
        }
    }

    pub fn push_frame(&mut self, name: Rc<str>, line: u32) {
        self.stack.push(StackEntry { name, line });
    }

    pub fn is(&self, code: &ErrorCode) -> bool {
        self.code.code == code.code
    }

    pub fn render(&self) -> String {
        let mut rendered = format!("error[{}]: {}\n{}", self.code.code, self.code.title, self.message);
        if let Some(extra) = &self.extra {
            rendered.push_str("\n  extra: ");
            rendered.push_str(extra);
        }
        if let Some(what) = &self.what {
            rendered.push_str("\n  what: ");
            rendered.push_str(what);
        }
        if let Some(line) = self.line {
            rendered.push_str(&format!("\n  --> line {}", line));
        }
        if let Some(hint) = self.code.hint {
            rendered.push_str("\n\nHint:\n  ");
            rendered.push_str(hint);
        }
        if !self.stack.is_empty() {
            rendered.push_str("\n\nStack trace:");
            for entry in &self.stack {
                rendered.push_str(&format!("\n  at {} (line {})", entry.name, entry.line));
            }
        }
        rendered
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code, self.message)
    }
}

impl From<Exception> for RuntimeError {
    fn from(exception: Exception) -> Self {
        RuntimeError::Thrown(Box::new(exception))
    }
}

impl RuntimeError {
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            RuntimeError::Thrown(e) => Some(e),
            RuntimeError::Eval(_) => None,
        }
    }

    pub fn is(&self, code: &ErrorCode) -> bool {
        self.exception().is_some_and(|e| e.is(code))
    }

    pub(crate) fn at_line(mut self, line: u32) -> Self {
        if let RuntimeError::Thrown(e) = &mut self {
            e.at_line(line);
        }
        self
    }

    pub fn render(&self) -> String {
        match self {
            RuntimeError::Thrown(e) => e.render(),
            RuntimeError::Eval(e) => format!("internal evaluation error: {}", e),
        }
    }
}

fn fill_template(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut values = values.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        out.push_str(values.next().copied().unwrap_or(""));
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

pub fn out_of_memory(requested: usize) -> RuntimeError {
    Exception::new(&OUT_OF_MEMORY, &[&requested.to_string()]).into()
}

pub fn type_mismatch(name: &str, label: &str, expected: &str, got: &str) -> RuntimeError {
    Exception::new(&TYPE_MISMATCH, &[name, label, expected, got]).into()
}

/// Receives exceptions nobody else handled: top-level failures and errors
/// raised inside finalizers.
pub trait ErrorSink {
    fn report(&self, error: &RuntimeError);
}

/// Default sink: logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &RuntimeError) {
        tracing::error!("{}", error.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_fills_placeholders_in_order() {
        let e = Exception::new(&WRONG_NUMBER_OF_ARGUMENTS, &["f", "2", "3"]);
        assert_eq!(e.message, "`f` expects 2 arguments, got 3.");
    }

    #[test]
    fn render_includes_location_and_stack() {
        let mut e = Exception::new(&READ_ONLY_PROPERTY, &["Size"]);
        e.at_line(4);
        e.at_line(9);
        e.push_frame(Rc::from("inner"), 4);
        e.push_frame(Rc::from("<main>"), 12);
        let rendered = e.render();
        assert!(rendered.starts_with("error[E1005]: READ-ONLY PROPERTY"));
        assert!(rendered.contains("--> line 4"));
        assert!(rendered.contains("Stack trace:\n  at inner (line 4)\n  at <main> (line 12)"));
    }

    #[test]
    fn eval_errors_are_not_exceptions() {
        let err = RuntimeError::from(EvalError::StackUnderflow(3));
        assert!(err.exception().is_none());
        assert_eq!(err.to_string(), "stack underflow at instruction 3");
    }
}
