//! Per-instance server configuration documents and the instance registry.
//!
//! Each instance keeps a desktop configuration document whose `mcpServers`
//! table says which helper servers exist, how to launch them and whether
//! they start automatically. Keys Vauban does not manage are preserved
//! verbatim whenever the document is rewritten.

pub mod adapters;
pub mod domain;
pub mod ports;
