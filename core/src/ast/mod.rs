//! Typed AST produced by [`crate::parser`].
//!
//! Every node owns its children outright; the tree is acyclic with a single
//! [`ProgramNode`] root, so plain `Vec` and enum ownership is all we need.

mod nodes;

pub use nodes::{
    ArgNode, ArrowNode, BinaryNode, BinaryOperator, FunctionNode, IdNode, ImmediateNode,
    InstructionNode, LValueNode, MemoryNode, NoArgNode, ParamNode, PrintNode, ProgramNode,
    RValueNode, StatementNode, TypeDefinitionNode,
};
