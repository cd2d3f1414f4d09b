use crate::runtime::{
    dispatch::{self, InvokeMode},
    error::RuntimeError,
};

use super::VM;

impl VM<'_> {
    /// Stack: target, `argc` parameters. `name` is `None` for `[]` access.
    pub(super) fn execute_get(&mut self, name: Option<&str>, argc: usize) -> Result<(), RuntimeError> {
        let params = self.pop_n(argc)?;
        let target = self.pop()?;
        let value = dispatch::invoke(self.engine, InvokeMode::Get, &target, name, params)?;
        self.push(value);
        Ok(())
    }

    /// Stack: target, `argc` parameters, value. Pushes the assigned value.
    pub(super) fn execute_set(&mut self, name: Option<&str>, argc: usize) -> Result<(), RuntimeError> {
        let value = self.pop()?.into_resolved();
        let mut args = self.pop_n(argc)?;
        let target = self.pop()?;
        args.push(value.clone());
        dispatch::invoke(self.engine, InvokeMode::Set, &target, name, args)?;
        self.push(value);
        Ok(())
    }

    pub(super) fn execute_call_method(&mut self, name: &str, argc: usize) -> Result<(), RuntimeError> {
        let args = self.pop_n(argc)?;
        let target = self.pop()?;
        let value = dispatch::invoke(self.engine, InvokeMode::Call, &target, Some(name), args)?;
        self.push(value);
        Ok(())
    }
}
