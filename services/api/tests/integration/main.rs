mod helpers;

mod auth_test;
mod otp_test;
