//! Python code generation and execution.
//!
//! `OnlyPython` asks the model for three sections (pip installs, imports and
//! a completion), splices the caller's existing code between the imports and
//! the completion, and runs the result through the sandbox executor.

pub mod assembly;
pub mod python;
pub mod request;
pub mod sections;

pub use assembly::{divider, AssembledSource};
pub use python::OnlyPython;
pub use request::{GenerationOutput, GenerationRequest, OutputShape};
pub use sections::CodeSections;
