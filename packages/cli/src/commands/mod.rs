pub mod replay;
pub mod validate;

pub use replay::{replay, ReplayArgs};
pub use validate::{validate, ValidateArgs};
