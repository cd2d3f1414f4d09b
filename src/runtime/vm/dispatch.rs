use crate::{
    bytecode::{
        instruction::{Instruction, Intent},
        op_code::{AssignOp, BinaryOp},
    },
    runtime::{
        dispatch::{self, InvokeMode},
        error::{Exception, RuntimeError, THROWN, UNKNOWN_FUNCTION, out_of_memory},
        func::literal_value,
        value::Value,
    },
};

use super::{Step, VM};

impl VM<'_> {
    pub(super) fn dispatch_instruction(
        &mut self,
        code: &[Instruction],
        ip: usize,
    ) -> Result<Step, RuntimeError> {
        match &code[ip] {
            Instruction::Push(literal) => self.push(literal_value(literal)),
            Instruction::Var { slot, intent } => {
                let cell = self.resolve_slot(*slot)?;
                self.push(Value::var(cell, *intent));
            }
            Instruction::Func(name) => {
                let func = self
                    .engine
                    .function(name)
                    .ok_or_else(|| Exception::new(&UNKNOWN_FUNCTION, &[name.as_str()]))?;
                self.push(Value::Object(func));
            }
            Instruction::Missing => self.push(Value::Missing),
            Instruction::Unary(op) => self.execute_unary_operation(*op)?,
            Instruction::Binary(BinaryOp::Concat) => {
                if self.append_in_place(code, ip)? {
                    return Ok(Step::Jump(ip + 2));
                }
                self.execute_binary_operation(BinaryOp::Concat)?;
            }
            Instruction::Binary(op) => self.execute_binary_operation(*op)?,
            Instruction::Assign(op) => self.execute_assignment(*op)?,
            Instruction::And { end } => {
                if !self.pop()?.to_bool() {
                    self.push(Value::from_bool(false));
                    return Ok(Step::Jump(*end));
                }
            }
            Instruction::Or { end } => {
                if self.pop()?.to_bool() {
                    self.push(Value::from_bool(true));
                    return Ok(Step::Jump(*end));
                }
            }
            Instruction::ToBool => {
                let value = self.pop()?;
                self.push(Value::from_bool(value.to_bool()));
            }
            Instruction::JumpIfFalse { target } => {
                if !self.pop()?.to_bool() {
                    return Ok(Step::Jump(*target));
                }
            }
            Instruction::Jump { target } => return Ok(Step::Jump(*target)),
            Instruction::Comma => {
                let right = self.pop()?;
                let left = self.pop()?;
                drop(left);
                self.push(right);
            }
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::Return => {
                let value = self.pop()?.into_resolved();
                return Ok(Step::Return(value));
            }
            Instruction::Throw => {
                let value = self.pop()?.into_resolved();
                return Err(thrown(value));
            }
            Instruction::Call { argc } => self.execute_call(*argc)?,
            Instruction::GetMember { name, argc } => self.execute_get(Some(name.as_str()), *argc)?,
            Instruction::SetMember { name, argc } => self.execute_set(Some(name.as_str()), *argc)?,
            Instruction::CallMethod { name, argc } => self.execute_call_method(name, *argc)?,
            Instruction::GetItem { argc } => self.execute_get(None, *argc)?,
            Instruction::SetItem { argc } => self.execute_set(None, *argc)?,
            Instruction::ArrayLiteral { count } => {
                let values = self.pop_n(*count)?;
                let array = self.engine.new_array(values)?;
                self.push(Value::Object(array));
            }
            Instruction::MapLiteral { count } => {
                let pairs = self.pop_n(count * 2)?;
                let map = Value::Object(self.engine.new_map());
                let mut pairs = pairs.into_iter();
                while let (Some(key), Some(value)) = (pairs.next(), pairs.next()) {
                    dispatch::invoke(self.engine, InvokeMode::Set, &map, None, vec![key, value])?;
                }
                self.push(map);
            }
            Instruction::ObjectLiteral { names } => {
                let values = self.pop_n(names.len())?;
                let object = Value::Object(self.engine.new_object());
                for (name, value) in names.iter().zip(values) {
                    dispatch::invoke(self.engine, InvokeMode::Set, &object, Some(name.as_str()), vec![value])?;
                }
                self.push(object);
            }
            Instruction::MakeClosure(name) => self.execute_make_closure(name)?,
        }
        Ok(Step::Next)
    }

    /// `x := x . y` appends to `x`'s buffer instead of building a new string.
    /// Returns false when the pattern does not apply.
    fn append_in_place(&mut self, code: &[Instruction], ip: usize) -> Result<bool, RuntimeError> {
        if code.get(ip + 1) != Some(&Instruction::Assign(AssignOp::Set)) {
            return Ok(false);
        }
        let (Some(Value::Var(target)), Some(Value::Var(left))) = (self.peek(2), self.peek(1))
        else {
            return Ok(false);
        };
        if target.intent != Intent::Write
            || !std::rc::Rc::ptr_eq(&target.var.target(), &left.var.target())
        {
            return Ok(false);
        }
        let right = self.pop()?;
        self.pop()?;
        // A right operand naming the same variable is copied out first.
        let suffix = right.to_str().into_owned();
        let target = self.pop()?;
        if let Value::Var(r) = &target {
            r.var
                .append(&suffix)
                .map_err(|_| out_of_memory(suffix.len()))?;
        }
        self.push(target);
        Ok(true)
    }
}

/// Converts a thrown script value into an exception. Objects supply their
/// `Message`, `What` and `Extra` fields.
pub(crate) fn thrown(value: Value) -> RuntimeError {
    let Value::Object(object) = &value else {
        let message = value.to_str().into_owned();
        return Exception::new(&THROWN, &[&message]).with_payload(value).into();
    };
    let field = |name: &str| {
        object
            .chain()
            .find_map(|link| link.own_value(name))
            .map(|v| v.to_str().into_owned())
            .filter(|text| !text.is_empty())
    };
    let message = field("Message").unwrap_or_else(|| object.type_name().to_string());
    let mut exception = Exception::new(&THROWN, &[&message]);
    if let Some(what) = field("What") {
        exception = exception.with_what(what);
    }
    if let Some(extra) = field("Extra") {
        exception = exception.with_extra(extra);
    }
    exception.with_payload(value).into()
}
