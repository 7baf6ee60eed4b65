pub mod auth;
pub mod note;
pub mod otp;
pub mod token;
