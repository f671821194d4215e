// src/fetch/mod.rs

pub mod document;

pub use document::download_document;
