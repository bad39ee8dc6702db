//! Units, images and applications.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a unit.
///
/// `Creating -> Installing -> Started`, with `Down` and `Error` reachable
/// from any state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Creating,
    Installing,
    Started,
    Down,
    Error,
}

impl UnitStatus {
    /// A started unit never goes back to `Creating` without failing first.
    pub fn can_transition_to(self, next: UnitStatus) -> bool {
        !(self == Self::Started && next == Self::Creating)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Self::Down | Self::Error)
    }
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creating => write!(f, "creating"),
            Self::Installing => write!(f, "installing"),
            Self::Started => write!(f, "started"),
            Self::Down => write!(f, "down"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A runtime instance backing one application replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Backing process id (container id).
    pub name: String,
    pub app_name: String,
    /// Platform tag, e.g. `python`.
    #[serde(rename = "type")]
    pub unit_type: String,
    /// Slot index, stable for the lifetime of the unit.
    #[serde(default)]
    pub machine: u32,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub status: UnitStatus,
}

/// Marks that a deployable image exists for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
}

/// The application descriptor handed to a provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub name: String,
    /// Runtime type; selects the base image.
    pub platform: String,
}

impl App {
    pub fn new(name: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: platform.into(),
        }
    }
}
