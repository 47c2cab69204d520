#![forbid(unsafe_code)]

pub mod expr;
pub mod loc;
pub mod pretty;
pub mod program;
pub mod types;

pub use expr::*;
pub use loc::*;
pub use pretty::{format_expr, format_type};
pub use program::*;
pub use types::*;
