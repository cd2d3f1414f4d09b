//! Runtime core: values, variables, the object model and the evaluator.
//!
//! # Ownership
//! Objects are reference counted. The last release of an object runs its
//! `__Delete` finalizer on the engine current for the thread (see
//! [`context`]), or on the engine that created the object when the release
//! happens in embedder code. The finalizer may resurrect the object by
//! storing a new reference. Objects still held when their engine is dropped
//! cannot be finalized; call [`engine::Engine::shutdown`] first.
//!
//! The object graph is not traced. A reference cycle between objects (an
//! object stored in its own field, or two objects holding each other) keeps
//! every member alive until the cycle is broken by script code. Built-in
//! prototypes hold their member functions, which derive from the function
//! prototype; the engine breaks those links when it is dropped.

pub mod array;
pub mod buffer;
pub mod builtins;
pub mod collation;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod frame;
pub mod func;
pub mod leak_detector;
pub mod map;
pub mod number;
pub mod object;
pub mod value;
pub mod var;
pub mod vm;
