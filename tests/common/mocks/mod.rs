pub mod social_backend;

pub use social_backend::*;
