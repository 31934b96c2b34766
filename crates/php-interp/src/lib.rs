pub mod builtins;
pub mod environment;
pub mod error;
pub mod ini;
pub mod interp;
pub mod ops;
pub mod output_buffer;
pub mod request;
pub mod value;

pub use error::{ErrorKind, PhpError};
pub use ini::Ini;
pub use interp::Interpreter;
pub use request::Request;
pub use value::{ArrayData, ArrayKey, Val};
