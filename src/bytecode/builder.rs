use super::{
    instruction::{Instruction, Intent, Literal, VarSlot},
    op_code::{AssignOp, BinaryOp, UnaryOp},
};

/// Assembles a postfix instruction stream, patching forward jumps for the
/// short-circuit and conditional forms.
#[derive(Debug, Default, Clone)]
pub struct ExprBuilder {
    instructions: Vec<Instruction>,
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, instruction: Instruction) -> usize {
        let pos = self.instructions.len();
        self.instructions.push(instruction);
        pos
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn build(&mut self) -> Vec<Instruction> {
        std::mem::take(&mut self.instructions)
    }

    pub fn int(&mut self, value: i64) -> &mut Self {
        self.emit(Instruction::Push(Literal::Integer(value)));
        self
    }

    pub fn float(&mut self, value: f64) -> &mut Self {
        self.emit(Instruction::Push(Literal::Float(value)));
        self
    }

    pub fn str(&mut self, value: &str) -> &mut Self {
        self.emit(Instruction::Push(Literal::String(value.to_string())));
        self
    }

    pub fn var(&mut self, slot: VarSlot) -> &mut Self {
        self.emit(Instruction::Var {
            slot,
            intent: Intent::Read,
        });
        self
    }

    pub fn var_mut(&mut self, slot: VarSlot) -> &mut Self {
        self.emit(Instruction::Var {
            slot,
            intent: Intent::Write,
        });
        self
    }

    pub fn global(&mut self, index: u32) -> &mut Self {
        self.var(VarSlot::Global(index))
    }

    pub fn global_mut(&mut self, index: u32) -> &mut Self {
        self.var_mut(VarSlot::Global(index))
    }

    pub fn local(&mut self, index: u32) -> &mut Self {
        self.var(VarSlot::Local(index))
    }

    pub fn local_mut(&mut self, index: u32) -> &mut Self {
        self.var_mut(VarSlot::Local(index))
    }

    pub fn func(&mut self, name: &str) -> &mut Self {
        self.emit(Instruction::Func(name.to_string()));
        self
    }

    pub fn missing(&mut self) -> &mut Self {
        self.emit(Instruction::Missing);
        self
    }

    pub fn unary(&mut self, op: UnaryOp) -> &mut Self {
        self.emit(Instruction::Unary(op));
        self
    }

    pub fn binary(&mut self, op: BinaryOp) -> &mut Self {
        self.emit(Instruction::Binary(op));
        self
    }

    pub fn assign(&mut self, op: AssignOp) -> &mut Self {
        self.emit(Instruction::Assign(op));
        self
    }

    pub fn call(&mut self, argc: usize) -> &mut Self {
        self.emit(Instruction::Call { argc });
        self
    }

    pub fn get_member(&mut self, name: &str, argc: usize) -> &mut Self {
        self.emit(Instruction::GetMember {
            name: name.to_string(),
            argc,
        });
        self
    }

    pub fn set_member(&mut self, name: &str, argc: usize) -> &mut Self {
        self.emit(Instruction::SetMember {
            name: name.to_string(),
            argc,
        });
        self
    }

    pub fn call_method(&mut self, name: &str, argc: usize) -> &mut Self {
        self.emit(Instruction::CallMethod {
            name: name.to_string(),
            argc,
        });
        self
    }

    pub fn get_item(&mut self, argc: usize) -> &mut Self {
        self.emit(Instruction::GetItem { argc });
        self
    }

    pub fn set_item(&mut self, argc: usize) -> &mut Self {
        self.emit(Instruction::SetItem { argc });
        self
    }

    pub fn array(&mut self, count: usize) -> &mut Self {
        self.emit(Instruction::ArrayLiteral { count });
        self
    }

    pub fn map(&mut self, count: usize) -> &mut Self {
        self.emit(Instruction::MapLiteral { count });
        self
    }

    pub fn object(&mut self, names: &[&str]) -> &mut Self {
        self.emit(Instruction::ObjectLiteral {
            names: names.iter().map(|n| n.to_string()).collect(),
        });
        self
    }

    pub fn closure(&mut self, name: &str) -> &mut Self {
        self.emit(Instruction::MakeClosure(name.to_string()));
        self
    }

    pub fn comma(&mut self) -> &mut Self {
        self.emit(Instruction::Comma);
        self
    }

    pub fn pop(&mut self) -> &mut Self {
        self.emit(Instruction::Pop);
        self
    }

    pub fn ret(&mut self) -> &mut Self {
        self.emit(Instruction::Return);
        self
    }

    pub fn throw(&mut self) -> &mut Self {
        self.emit(Instruction::Throw);
        self
    }

    /// `<left already emitted> and <right>`.
    pub fn and(&mut self, right: impl FnOnce(&mut Self)) -> &mut Self {
        let jump = self.emit(Instruction::And { end: usize::MAX });
        right(self);
        self.emit(Instruction::ToBool);
        self.patch(jump);
        self
    }

    /// `<left already emitted> or <right>`.
    pub fn or(&mut self, right: impl FnOnce(&mut Self)) -> &mut Self {
        let jump = self.emit(Instruction::Or { end: usize::MAX });
        right(self);
        self.emit(Instruction::ToBool);
        self.patch(jump);
        self
    }

    /// `<condition already emitted> ? <then> : <otherwise>`.
    pub fn ternary(
        &mut self,
        then: impl FnOnce(&mut Self),
        otherwise: impl FnOnce(&mut Self),
    ) -> &mut Self {
        let jump_else = self.emit(Instruction::JumpIfFalse { target: usize::MAX });
        then(self);
        let jump_end = self.emit(Instruction::Jump { target: usize::MAX });
        self.patch(jump_else);
        otherwise(self);
        self.patch(jump_end);
        self
    }

    fn patch(&mut self, pos: usize) {
        let here = self.instructions.len();
        match &mut self.instructions[pos] {
            Instruction::And { end } | Instruction::Or { end } => *end = here,
            Instruction::JumpIfFalse { target } | Instruction::Jump { target } => *target = here,
            _ => {}
        }
    }
}
