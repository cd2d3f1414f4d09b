pub mod bytecode;
pub mod runtime;

pub use runtime::{
    config::RuntimeConfig,
    engine::Engine,
    error::{ErrorSink, Exception, RuntimeError},
    value::Value,
};
