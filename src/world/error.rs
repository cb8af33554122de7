use thiserror::Error;

use super::types::ActorId;

/// Errors reported by a world backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("failed to connect to {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),
    #[error("spawn failed because of a collision at ({x:.2}, {y:.2})")]
    Collision { x: f32, y: f32 },
    #[error("blueprint '{0}' not found")]
    UnknownBlueprint(String),
    #[error("blueprint '{blueprint}' has no attribute '{attribute}'")]
    UnknownAttribute {
        blueprint: String,
        attribute: String,
    },
    #[error("attribute '{attribute}' of '{blueprint}' is read-only")]
    ReadOnlyAttribute {
        blueprint: String,
        attribute: String,
    },
    #[error("actor {0} is not a valid parent for a controller")]
    InvalidParent(ActorId),
    #[error("actor {0} does not support this operation")]
    WrongActorType(ActorId),
    #[error("actor {0} is not yet visible in the world snapshot")]
    NotYetVisible(ActorId),
    #[error("tick() requires the world to be in synchronous mode")]
    NotSynchronous,
    #[error("timed out waiting for a tick from a synchronous world")]
    TickTimeout,
    #[error("{0} is not supported by this traffic manager")]
    Unsupported(&'static str),
    #[error("vehicle {0} is not registered with the traffic manager")]
    NotRegistered(ActorId),
    #[error("backend rejected the request: {0}")]
    Backend(String),
}
