// gdoc-common: remote-facing types and utilities shared by the gdoc crates

pub mod doc_id;
pub mod error;
pub mod types;
