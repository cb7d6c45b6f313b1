//! Repository loading for the coderank CLI

pub mod loader;

pub use loader::load_repository;
