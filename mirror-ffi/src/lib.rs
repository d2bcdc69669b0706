// mirror-ffi: #[repr(C)] types, handle types, stable enum tags.
// Zero external dependencies. This crate defines the complete Rust <-> host contract.

pub mod handles;
pub mod error;
pub mod kinds;
pub mod callbacks;

pub use handles::*;
pub use error::*;
pub use kinds::*;
pub use callbacks::*;
