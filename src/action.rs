use std::fmt;

/// Prefix of the only recognized verb
pub const GO_PREFIX: &str = "go:";

/// A parsed hit-region action string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `go:<screenId>`
    Go(String),
}

/// Why an action string was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Blank action
    Empty,
    /// `go:` with nothing after it
    MissingTarget,
    /// Anything that is not `go:<id>`
    UnknownVerb(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Empty => write!(f, "empty action"),
            ActionError::MissingTarget => write!(f, "navigation action without a target screen"),
            ActionError::UnknownVerb(action) => write!(f, "unknown action: {}", action),
        }
    }
}

impl std::error::Error for ActionError {}

impl Action {
    /// Parse an action string, trimming whitespace around the verb and the target
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let action = raw.trim();
        if action.is_empty() {
            return Err(ActionError::Empty);
        }

        match action.strip_prefix(GO_PREFIX) {
            Some(target) => {
                let target = target.trim();
                if target.is_empty() {
                    Err(ActionError::MissingTarget)
                } else {
                    Ok(Action::Go(target.to_string()))
                }
            }
            None => Err(ActionError::UnknownVerb(action.to_string())),
        }
    }

    /// Screen this action navigates to
    pub fn target(&self) -> &str {
        match self {
            Action::Go(target) => target,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Go(target) => write!(f, "{}{}", GO_PREFIX, target),
        }
    }
}
