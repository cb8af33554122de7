//! Batchable requests understood by the world
//!
//! A batch is a list of independent commands evaluated in order; the
//! synchronous form returns one response per command.

use super::blueprint::Blueprint;
use super::error::WorldError;
use super::types::{ActorId, Transform};

/// Outcome of a single command within a synchronous batch
pub type CommandResponse = Result<ActorId, WorldError>;

/// Follow-up applied to the actor a spawn command just created
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FutureCommand {
    SetAutopilot { enabled: bool, tm_port: u16 },
}

/// Request to create one actor, optionally attached to a parent
#[derive(Debug, Clone)]
pub struct SpawnActor {
    pub blueprint: Blueprint,
    pub transform: Transform,
    pub parent: Option<ActorId>,
    pub then: Vec<FutureCommand>,
}

impl SpawnActor {
    pub fn new(blueprint: Blueprint, transform: Transform) -> Self {
        Self {
            blueprint,
            transform,
            parent: None,
            then: Vec::new(),
        }
    }

    pub fn attached_to(mut self, parent: ActorId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Chain a command that runs against the newly created actor
    pub fn then(mut self, command: FutureCommand) -> Self {
        self.then.push(command);
        self
    }
}

#[derive(Debug, Clone)]
pub enum Command {
    Spawn(SpawnActor),
    Destroy(ActorId),
}

impl From<SpawnActor> for Command {
    fn from(spawn: SpawnActor) -> Self {
        Command::Spawn(spawn)
    }
}

/// Destroy commands for every id, in order
pub fn destroy_all<'a>(ids: impl IntoIterator<Item = &'a ActorId>) -> Vec<Command> {
    ids.into_iter().map(|id| Command::Destroy(*id)).collect()
}
