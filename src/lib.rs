#![deny(unused_must_use)]

pub mod analyzer;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod util;
