//! Pure domain types and rules shared across the Quillbox services.
//!
//! No I/O, no framework types — only validation and normalization logic
//! that both the HTTP layer and the usecases depend on.

pub mod email;
pub mod pagination;
pub mod tag;
pub mod user;
