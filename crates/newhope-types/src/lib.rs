#![forbid(unsafe_code)]
#![doc = "Common types and error codes for the NewHope key-agreement workspace."]

pub mod error;

pub use error::*;
