pub mod error;
pub mod pem;
