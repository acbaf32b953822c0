//! Tenants, agents and the workflow registry.
//!
//! Every resource in Parley belongs to a tenant. Agents are registered by a
//! tenant (or published as cross-tenant templates) and own a set of
//! workflows, each addressed by the composite type `AgentName:WorkflowName`.
//! The registry is an explicit table populated at startup and passed to
//! services by handle. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
