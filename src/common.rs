pub mod code;
pub mod error;
