//! Error types for the lighting system

use thiserror::Error;

use crate::id::{GroupId, LightId};
use crate::light::LightType;

/// Lighting system errors
///
/// Only structural misuse surfaces here. Out-of-range values are clamped by
/// setters and capacity overflow is reported through stats instead.
#[derive(Debug, Error)]
pub enum LightError {
    /// Light is not registered
    #[error("Light not found: {0}")]
    LightNotFound(LightId),

    /// Group is not registered
    #[error("Light group not found: {0}")]
    GroupNotFound(GroupId),

    /// Operation on a light after `dispose`
    #[error("Light {0} has been disposed")]
    LightDisposed(LightId),

    /// Operation on a group after `dispose`
    #[error("Light group {0} has been disposed")]
    GroupDisposed(GroupId),

    /// Attaching a group below itself
    #[error("Cannot attach group {child} under {parent}: would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: GroupId,
        /// Group being attached
        child: GroupId,
    },

    /// The root group cannot be detached or disposed on its own
    #[error("The root light group cannot be detached")]
    RootGroup,

    /// Setter does not apply to this light type
    #[error("Operation '{operation}' is not supported by {light_type:?} lights")]
    UnsupportedOperation {
        /// Name of the rejected operation
        operation: &'static str,
        /// Type of the light it was called on
        light_type: LightType,
    },

    /// Light type never casts shadows
    #[error("{0:?} lights cannot cast shadows")]
    ShadowsUnsupported(LightType),

    /// Invalid configuration
    #[error("Invalid lighting configuration: {0}")]
    InvalidConfig(String),

    /// Config or record (de)serialization failed
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for lighting operations
pub type Result<T> = std::result::Result<T, LightError>;
