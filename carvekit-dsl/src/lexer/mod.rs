//! Line scanner for carved-context dumps

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
