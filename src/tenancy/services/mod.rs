//! Application services for agent registration and workflow resolution.

mod registry;

pub use registry::{
    AgentRegistryService, AgentRegistryServiceError, AgentRegistryServiceResult,
    RegisterAgentRequest,
};
