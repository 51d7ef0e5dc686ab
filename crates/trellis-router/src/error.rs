use trellis_core::LifecycleError;

/// Errors returned by [`Router::load`](crate::Router::load) and the
/// routing configuration.
///
/// The type is `Clone` so that a commit-phase failure can be both returned
/// to the caller and replayed once by [`Router::stop`](crate::Router::stop).
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    #[error(
        "Neither the route '{path}' matched any configured route at '{context}' nor a fallback is configured for the viewport '{viewport}'"
    )]
    UnknownRoute {
        path: String,
        context: String,
        viewport: String,
    },

    #[error("navigation to '{instruction}' was rejected by {hook} of '{component}'")]
    GuardRejected {
        instruction: String,
        component: String,
        hook: &'static str,
    },

    #[error("a navigation is past its point of no return and cannot be superseded")]
    NavigationInProgress,

    #[error("no viewport named '{viewport}' at '{context}'")]
    UnknownViewport { viewport: String, context: String },

    #[error("no free viewport for '{instruction}' at '{context}'")]
    NoFreeViewport { instruction: String, context: String },

    #[error("more than {limit} redirects while navigating to '{instruction}'")]
    TooManyRedirects { instruction: String, limit: usize },

    #[error("fallback component '{0}' is not registered")]
    UnknownComponent(String),

    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Recognizer(#[from] RecognizerError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// A route instruction that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unexpected '{found}' at {position} in '{expression}'")]
    Unexpected {
        expression: String,
        position: usize,
        found: char,
    },

    #[error("unexpected end of '{expression}'")]
    UnexpectedEnd { expression: String },

    #[error("missing component name at {position} in '{expression}'")]
    MissingComponent { expression: String, position: usize },
}

/// A route pattern that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    #[error("route '{pattern}' is ambiguous with the already registered '{existing}'")]
    Ambiguous { pattern: String, existing: String },

    #[error("catch-all segment must be the last segment of '{pattern}'")]
    StarNotLast { pattern: String },

    #[error("parameter without a name in '{pattern}'")]
    EmptyParameter { pattern: String },
}
