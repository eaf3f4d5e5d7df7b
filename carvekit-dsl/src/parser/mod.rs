//! Parser module for carved-context dumps

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::*;
