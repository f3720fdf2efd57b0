pub mod trace;
pub mod security;

pub use trace::*;
pub use security::*;
