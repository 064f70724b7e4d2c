//! Hot exit policy (`files.hotExit`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether unsaved editor state survives process termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotExitConfiguration {
    /// Never preserve unsaved state.
    Off,
    /// Preserve unsaved state when the application exits.
    #[default]
    OnExit,
    /// Preserve unsaved state on exit and when a window closes.
    OnExitAndWindowClose,
}

impl HotExitConfiguration {
    /// Normalizes a raw setting value. Only `off` and
    /// `onExitAndWindowClose` are accepted; anything else, including an
    /// unset value, is `OnExit`.
    #[must_use]
    pub fn from_setting(value: Option<&str>) -> Self {
        match value {
            Some("off") => Self::Off,
            Some("onExitAndWindowClose") => Self::OnExitAndWindowClose,
            _ => Self::OnExit,
        }
    }

    /// The setting value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::OnExit => "onExit",
            Self::OnExitAndWindowClose => "onExitAndWindowClose",
        }
    }
}

impl fmt::Display for HotExitConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_values() {
        assert_eq!(HotExitConfiguration::from_setting(Some("off")), HotExitConfiguration::Off);
        assert_eq!(
            HotExitConfiguration::from_setting(Some("onExitAndWindowClose")),
            HotExitConfiguration::OnExitAndWindowClose
        );
        assert_eq!(HotExitConfiguration::from_setting(Some("onExit")), HotExitConfiguration::OnExit);
    }

    #[test]
    fn anything_else_is_on_exit() {
        for raw in [None, Some("bogus"), Some(""), Some("OFF")] {
            assert_eq!(HotExitConfiguration::from_setting(raw), HotExitConfiguration::OnExit);
        }
        assert_eq!(HotExitConfiguration::default(), HotExitConfiguration::OnExit);
    }
}
