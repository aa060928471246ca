//! Zip codec: intake of uploaded archives and assembly of export archives

pub mod assemble;
pub mod extract;

pub use assemble::*;
pub use extract::*;
