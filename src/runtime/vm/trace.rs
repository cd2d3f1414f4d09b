use crate::{bytecode::instruction::Instruction, runtime::value::Value};

use super::VM;

impl VM<'_> {
    pub(super) fn trace_instruction(&self, ip: usize, instruction: &Instruction) {
        tracing::trace!(
            target: "keyscript::vm",
            frame = %self.frame.name,
            depth = self.stack.len(),
            "{:04} {}",
            ip,
            instruction
        );
    }

    /// One line per stack slot, bottom first.
    pub fn render_stack(&self) -> String {
        self.stack
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{:>3}: {}", i, describe(value)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Var(r) => format!("&{} = {}", r.var.name(), r.var.get()),
        Value::String(s) => format!("{:?}", &**s),
        Value::Missing => "<missing>".to_string(),
        other => other.to_string(),
    }
}
