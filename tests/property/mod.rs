//! Property test modules

mod circuit_compiler;
mod link_identity;
