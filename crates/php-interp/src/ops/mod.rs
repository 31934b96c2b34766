pub mod arith;
pub mod cast;
pub mod compare;
