//! Lowering of a finalized shader graph into a linear SVM instruction
//! stream: the register-stack allocator (`stack`), the instruction/program
//! model (`instruction`), and the codegen driver (`compiler`).

pub mod compiler;
pub mod flags;
pub mod instruction;
pub mod stack;

pub use compiler::Compiler;
pub use flags::CompiledFlags;
pub use instruction::{Instruction, Program, ShaderType, ShaderTypeKey};
pub use stack::{StackAllocator, StackOffset, SVM_STACK_SIZE};
