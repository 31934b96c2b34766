pub mod ast;
pub mod lexer;
pub mod line_index;
pub mod parser;
pub mod source;
pub mod span;

pub use parser::{ParseError, Parser};
pub use source::SourceFile;
pub use span::Span;
