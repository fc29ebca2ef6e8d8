//! Plugin lifecycle states and the transitions between them.

use crate::error::PluginError;
use serde::Serialize;
use std::fmt;

/// Where a plugin is in its manager-driven lifecycle.
///
/// ```text
/// Constructed -> Initialized -> Loaded -> Enabled -> Disabled
///       \             \            \          \
///        `-------------`------------`----------`--> Failed
/// ```
///
/// `Disabled` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PluginState {
    /// Instance exists, identity not yet assigned
    Constructed,
    /// Identifier and loader assigned
    Initialized,
    /// `on_load` completed
    Loaded,
    /// `on_enable` completed
    Enabled,
    /// `on_disable` completed
    Disabled,
    /// A hook returned an error or panicked
    Failed,
}

impl PluginState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PluginState::Disabled | PluginState::Failed)
    }

    /// Whether the state machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: PluginState) -> bool {
        use PluginState::*;
        match (self, next) {
            (Constructed, Initialized)
            | (Initialized, Loaded)
            | (Loaded, Enabled)
            | (Enabled, Disabled) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Returns `next` if the edge exists, otherwise an `InvalidTransition` for `plugin`.
    pub fn transition(self, next: PluginState, plugin: &str) -> Result<PluginState, PluginError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(PluginError::InvalidTransition {
                plugin: plugin.to_string(),
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PluginState::Constructed => "constructed",
            PluginState::Initialized => "initialized",
            PluginState::Loaded => "loaded",
            PluginState::Enabled => "enabled",
            PluginState::Disabled => "disabled",
            PluginState::Failed => "failed",
        };
        f.write_str(name)
    }
}
