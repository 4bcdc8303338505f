// src/error.rs

use crate::platform_lib::ElementId;

/// Failures reported by a [`Host`](crate::platform_lib::Host).
///
/// Element creation failures are returned from scene construction and the
/// node factories. Every other host failure is logged and absorbed.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    #[error("element {child:?} is not a child of {parent:?}")]
    NotAChild { parent: ElementId, child: ElementId },

    #[error("no browser window or document available")]
    NoDocument,

    #[error("platform call failed: {0}")]
    Platform(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}
