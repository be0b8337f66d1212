//! Outer surfaces

pub mod http;
