//! Parley: conversation threading and message routing for AI agent workflows.
//!
//! This crate provides the core of an agent control plane: tenant-isolated
//! conversation threads, scope-partitioned message history, delivery of
//! replies and proactive messages, agent-to-agent calls, webhook responses,
//! and human-in-the-loop tasks that suspend a workflow until a person acts.
//!
//! # Architecture
//!
//! Parley follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`tenancy`]: Tenants, agents and the workflow registry
//! - [`thread`]: Thread registry keyed by tenant, workflow and participant
//! - [`message`]: Append-only message ledger, scope index and hint overlay
//! - [`delivery`]: Delivery router, handler dispatch, webhooks and A2A
//! - [`task`]: Human-in-the-loop tasks and the durable wait coordinator
//! - [`config`]: Engine configuration
//! - [`telemetry`]: Structured logging setup

pub mod clock;
pub mod config;
pub mod delivery;
pub mod message;
pub mod task;
pub mod telemetry;
pub mod tenancy;
pub mod thread;
