use std::fmt;

use serde::{Deserialize, Serialize};

use super::op_code::{AssignOp, BinaryOp, UnaryOp};

/// A resolved variable location. `Free` slots index the running closure's
/// captured cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarSlot {
    Global(u32),
    Local(u32),
    Free(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Push(Literal),
    Var {
        slot: VarSlot,
        #[serde(default)]
        intent: Intent,
    },
    Func(String),
    Missing,
    Unary(UnaryOp),
    Binary(BinaryOp),
    Assign(AssignOp),
    /// Pops the left operand; if false pushes 0 and jumps to `end`.
    And {
        end: usize,
    },
    /// Pops the left operand; if true pushes 1 and jumps to `end`.
    Or {
        end: usize,
    },
    ToBool,
    JumpIfFalse {
        target: usize,
    },
    Jump {
        target: usize,
    },
    Comma,
    Pop,
    Return,
    Throw,
    /// Callee sits below its `argc` arguments.
    Call {
        argc: usize,
    },
    GetMember {
        name: String,
        argc: usize,
    },
    /// Stack: target, `argc` parameters, value.
    SetMember {
        name: String,
        argc: usize,
    },
    CallMethod {
        name: String,
        argc: usize,
    },
    GetItem {
        argc: usize,
    },
    SetItem {
        argc: usize,
    },
    ArrayLiteral {
        count: usize,
    },
    /// `count` key/value pairs.
    MapLiteral {
        count: usize,
    },
    ObjectLiteral {
        names: Vec<String>,
    },
    MakeClosure(String),
}

impl Instruction {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "Push",
            Instruction::Var { .. } => "Var",
            Instruction::Func(_) => "Func",
            Instruction::Missing => "Missing",
            Instruction::Unary(_) => "Unary",
            Instruction::Binary(_) => "Binary",
            Instruction::Assign(_) => "Assign",
            Instruction::And { .. } => "And",
            Instruction::Or { .. } => "Or",
            Instruction::ToBool => "ToBool",
            Instruction::JumpIfFalse { .. } => "JumpIfFalse",
            Instruction::Jump { .. } => "Jump",
            Instruction::Comma => "Comma",
            Instruction::Pop => "Pop",
            Instruction::Return => "Return",
            Instruction::Throw => "Throw",
            Instruction::Call { .. } => "Call",
            Instruction::GetMember { .. } => "GetMember",
            Instruction::SetMember { .. } => "SetMember",
            Instruction::CallMethod { .. } => "CallMethod",
            Instruction::GetItem { .. } => "GetItem",
            Instruction::SetItem { .. } => "SetItem",
            Instruction::ArrayLiteral { .. } => "ArrayLiteral",
            Instruction::MapLiteral { .. } => "MapLiteral",
            Instruction::ObjectLiteral { .. } => "ObjectLiteral",
            Instruction::MakeClosure(_) => "MakeClosure",
        }
    }

    pub fn operands(&self) -> String {
        match self {
            Instruction::Push(literal) => literal.to_string(),
            Instruction::Var { slot, intent } => match intent {
                Intent::Read => slot.to_string(),
                Intent::Write => format!("{} write", slot),
            },
            Instruction::Func(name) | Instruction::MakeClosure(name) => name.clone(),
            Instruction::Unary(op) => op.to_string(),
            Instruction::Binary(op) => op.to_string(),
            Instruction::Assign(op) => op.to_string(),
            Instruction::And { end } | Instruction::Or { end } => end.to_string(),
            Instruction::JumpIfFalse { target } | Instruction::Jump { target } => {
                target.to_string()
            }
            Instruction::Call { argc }
            | Instruction::GetItem { argc }
            | Instruction::SetItem { argc } => argc.to_string(),
            Instruction::GetMember { name, argc }
            | Instruction::SetMember { name, argc }
            | Instruction::CallMethod { name, argc } => format!("{} {}", name, argc),
            Instruction::ArrayLiteral { count } | Instruction::MapLiteral { count } => {
                count.to_string()
            }
            Instruction::ObjectLiteral { names } => names.join(","),
            Instruction::Missing
            | Instruction::ToBool
            | Instruction::Comma
            | Instruction::Pop
            | Instruction::Return
            | Instruction::Throw => String::new(),
        }
    }
}

impl fmt::Display for VarSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarSlot::Global(i) => write!(f, "global[{}]", i),
            VarSlot::Local(i) => write!(f, "local[{}]", i),
            VarSlot::Free(i) => write!(f, "free[{}]", i),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operands = self.operands();
        if operands.is_empty() {
            f.write_str(self.mnemonic())
        } else {
            write!(f, "{} {}", self.mnemonic(), operands)
        }
    }
}
