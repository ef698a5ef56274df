//! Vauban: port allocation and helper-process supervision for sandboxed
//! desktop-application instances.
//!
//! Each sandboxed instance receives a private, non-overlapping range of TCP
//! ports and a set of configured helper servers (MCP servers) that run inside
//! that range. This crate keeps the durable port registry, launches and stops
//! the helper processes, captures their output, and keeps the per-instance
//! server configuration document in step with the allocated ports.
//!
//! # Architecture
//!
//! Vauban follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (files, sockets,
//!   processes, in-memory doubles)
//! - **Services**: Orchestration over ports
//!
//! # Modules
//!
//! - [`port_allocation`]: Durable base-port registry and per-tool ports
//! - [`process_supervision`]: Helper-process lifecycle and captured output
//! - [`server_config`]: Server configuration documents and instance registry
//! - [`templates`]: Server configuration blueprints
//! - [`config`], [`logging`], [`storage`]: Ambient infrastructure

pub mod config;
pub mod instance;
pub mod logging;
pub mod port_allocation;
pub mod process_supervision;
pub mod server_config;
pub mod storage;
pub mod templates;
