pub mod builder;
pub mod instruction;
pub mod op_code;
pub mod program;

pub use builder::ExprBuilder;
pub use instruction::{Instruction, Intent, Literal, VarSlot};
pub use op_code::{AssignOp, BinaryOp, UnaryOp, disassemble};
pub use program::{Expression, FunctionDef, ParamDef, Program, ProgramError};
