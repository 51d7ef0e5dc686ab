use crate::state::State;
use crate::hooks::HookError;

/// Errors raised by controllers and the container.
///
/// Misuse of a controller (for example activating a disposed one) is
/// reported synchronously from [`Controller::activate`](crate::Controller::activate)
/// and [`Controller::deactivate`](crate::Controller::deactivate); hook
/// failures surface through the returned future.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {action} '{name}': the controller has been disposed")]
    Disposed { name: String, action: &'static str },

    #[error("'{name}' is already activated with a different scope")]
    ScopeMismatch { name: String },

    #[error("synthetic view '{name}' cannot be activated without a scope")]
    MissingScope { name: String },

    #[error("cannot {action} '{name}' while it is {state}")]
    InvalidTransition {
        name: String,
        action: &'static str,
        state: State,
    },

    #[error("cannot re-activate '{name}': its parent is not active")]
    ParentInactive { name: String },

    #[error("{hook} of '{component}' failed: {source}")]
    Hook {
        component: String,
        hook: &'static str,
        #[source]
        source: HookError,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl LifecycleError {
    /// The hook error wrapped by [`LifecycleError::Hook`], if any.
    pub fn hook_error(&self) -> Option<&HookError> {
        match self {
            LifecycleError::Hook { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised while resolving registrations from a [`Container`](crate::Container).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    #[error("no registration found for {type_name}")]
    Missing { type_name: &'static str },

    #[error("no component named '{0}' is registered")]
    UnknownComponent(String),
}
