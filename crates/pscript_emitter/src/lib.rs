//! pscript_emitter: the two backends for resolved trees.
//!
//! Each backend is its own trait, `EmitNative` and `EmitScript`. A construct
//! that exists only for one backend makes the other return an
//! `InternalError`, which aborts the unit: resolution for a given target
//! never produces such a tree, so reaching one is a compiler bug.

pub mod native;
pub mod script;

pub use native::{emit_native_unit, EmitNative, Instruction, NativeEmitter};
pub use script::{emit_script_unit, EmitScript, ScriptBuffer, ScriptWriter};
