//! sea-orm entities for the Quillbox API service.

pub mod notes;
pub mod otps;
pub mod users;
