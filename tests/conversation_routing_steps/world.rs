//! Shared world state for conversation routing BDD scenarios.

use parley::message::domain::Message;
use parley::task::{
    domain::{TaskHandle, TaskResult},
    services::TaskCoordinatorError,
};
use rstest::fixture;
use tokio::task::JoinHandle;

use crate::test_helpers::Engine;

/// Pending wait on a task result.
pub type TaskWaiter = JoinHandle<Result<TaskResult, TaskCoordinatorError>>;

/// Scenario world for conversation routing behaviour tests.
#[derive(Default)]
pub struct RoutingWorld {
    pub engine: Option<Engine>,
    pub last_message: Option<Message>,
    pub task: Option<TaskHandle>,
    pub waiter: Option<TaskWaiter>,
}

impl RoutingWorld {
    /// Returns the engine set up by the background step.
    ///
    /// # Errors
    ///
    /// Returns an error when no engine has been built yet.
    pub fn engine(&self) -> Result<&Engine, eyre::Report> {
        self.engine
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing engine in scenario world"))
    }

    /// Returns the most recently sent message.
    ///
    /// # Errors
    ///
    /// Returns an error when no message has been sent yet.
    pub fn last_message(&self) -> Result<&Message, eyre::Report> {
        self.last_message
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing message in scenario world"))
    }

    /// Returns the handle of the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been started yet.
    pub fn task(&self) -> Result<TaskHandle, eyre::Report> {
        self.task
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RoutingWorld {
    RoutingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
