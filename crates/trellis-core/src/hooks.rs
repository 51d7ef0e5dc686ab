//! The optional lifecycle hooks of a view-model and the values they return.
//!
//! Which hooks a component implements is recorded once per
//! [`ComponentDefinition`](crate::ComponentDefinition) as a [`Hooks`] set.
//! The [`Controller`](crate::Controller) consults that set before every
//! invocation and never calls a hook that is absent from it.

use crate::controller::Controller;
use crate::state::LifecycleFlags;
use bitflags::bitflags;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::future::Future;

bitflags! {
    /// Capability set of optional hooks implemented by a view-model.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Hooks: u16 {
        const CREATED = 1 << 0;
        const BINDING = 1 << 1;
        const BOUND = 1 << 2;
        const ATTACHING = 1 << 3;
        const ATTACHED = 1 << 4;
        const DETACHING = 1 << 5;
        const UNBINDING = 1 << 6;
        const CAN_LOAD = 1 << 7;
        const LOADING = 1 << 8;
        const CAN_UNLOAD = 1 << 9;
        const UNLOADING = 1 << 10;
        const DISPOSE = 1 << 11;
    }
}

const HOOK_NAMES: [(Hooks, &str); 12] = [
    (Hooks::CREATED, "created"),
    (Hooks::BINDING, "binding"),
    (Hooks::BOUND, "bound"),
    (Hooks::ATTACHING, "attaching"),
    (Hooks::ATTACHED, "attached"),
    (Hooks::DETACHING, "detaching"),
    (Hooks::UNBINDING, "unbinding"),
    (Hooks::CAN_LOAD, "can_load"),
    (Hooks::LOADING, "loading"),
    (Hooks::CAN_UNLOAD, "can_unload"),
    (Hooks::UNLOADING, "unloading"),
    (Hooks::DISPOSE, "dispose"),
];

impl Hooks {
    /// The six hooks driven by activation and deactivation.
    pub const LIFECYCLE: Hooks = Hooks::BINDING
        .union(Hooks::BOUND)
        .union(Hooks::ATTACHING)
        .union(Hooks::ATTACHED)
        .union(Hooks::DETACHING)
        .union(Hooks::UNBINDING);

    /// The four hooks driven by a router transition.
    pub const ROUTING: Hooks = Hooks::CAN_LOAD
        .union(Hooks::LOADING)
        .union(Hooks::CAN_UNLOAD)
        .union(Hooks::UNLOADING);

    /// Name of a single hook as it appears in logs and errors.
    ///
    /// Returns `"unknown"` for the empty set or a combination of flags.
    pub fn name(self) -> &'static str {
        HOOK_NAMES
            .iter()
            .find(|(hook, _)| *hook == self)
            .map_or("unknown", |(_, name)| *name)
    }
}

/// Error raised by a hook implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<crate::error::LifecycleError> for HookError {
    fn from(err: crate::error::LifecycleError) -> Self {
        HookError::new(err.to_string())
    }
}

/// Future returned by a hook that settles asynchronously.
pub type HookFuture = LocalBoxFuture<'static, Result<(), HookError>>;

/// Result of a lifecycle hook: settled now, or pending on a future.
///
/// # Example
///
/// ```rust,ignore
/// fn attaching(&mut self, _ctx: &HookContext) -> HookResult {
///     HookResult::pending(async move {
///         fade_in().await;
///         Ok(())
///     })
/// }
/// ```
pub enum HookResult {
    Done,
    Failed(HookError),
    Pending(HookFuture),
}

impl HookResult {
    pub fn done() -> Self {
        HookResult::Done
    }

    pub fn fail(message: impl Into<String>) -> Self {
        HookResult::Failed(HookError::new(message))
    }

    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<(), HookError>> + 'static,
    {
        HookResult::Pending(fut.boxed_local())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, HookResult::Pending(_))
    }

    pub fn into_future(self) -> HookFuture {
        match self {
            HookResult::Done => future::ready(Ok(())).boxed_local(),
            HookResult::Failed(err) => future::ready(Err(err)).boxed_local(),
            HookResult::Pending(fut) => fut,
        }
    }
}

impl From<Result<(), HookError>> for HookResult {
    fn from(result: Result<(), HookError>) -> Self {
        match result {
            Ok(()) => HookResult::Done,
            Err(err) => HookResult::Failed(err),
        }
    }
}

/// Verdict of a `can_load` / `can_unload` guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Allow,
    Deny,
    /// Cancel the navigation and navigate to the given instruction instead.
    Redirect(String),
}

pub type GuardFuture = LocalBoxFuture<'static, Result<Guard, HookError>>;

/// Result of a guard hook: a verdict now, or pending on a future.
pub enum GuardResult {
    Ready(Result<Guard, HookError>),
    Pending(GuardFuture),
}

impl GuardResult {
    pub fn allow() -> Self {
        GuardResult::Ready(Ok(Guard::Allow))
    }

    pub fn deny() -> Self {
        GuardResult::Ready(Ok(Guard::Deny))
    }

    pub fn redirect(instruction: impl Into<String>) -> Self {
        GuardResult::Ready(Ok(Guard::Redirect(instruction.into())))
    }

    pub fn fail(message: impl Into<String>) -> Self {
        GuardResult::Ready(Err(HookError::new(message)))
    }

    pub fn pending<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Guard, HookError>> + 'static,
    {
        GuardResult::Pending(fut.boxed_local())
    }

    pub fn into_future(self) -> GuardFuture {
        match self {
            GuardResult::Ready(result) => future::ready(result).boxed_local(),
            GuardResult::Pending(fut) => fut,
        }
    }
}

impl From<bool> for GuardResult {
    fn from(allow: bool) -> Self {
        if allow {
            GuardResult::allow()
        } else {
            GuardResult::deny()
        }
    }
}

impl From<Guard> for GuardResult {
    fn from(guard: Guard) -> Self {
        GuardResult::Ready(Ok(guard))
    }
}

/// Arguments passed to the lifecycle hooks.
///
/// A hook must not reach back into its own controller's view-model through
/// `controller`: the view-model is mutably borrowed for the duration of
/// the call.
#[derive(Clone)]
pub struct HookContext {
    /// The controller whose view-model is being called.
    pub controller: Controller,
    /// The controller that started the enclosing batch.
    pub initiator: Controller,
    pub parent: Option<Controller>,
    pub flags: LifecycleFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_names_are_snake_case() {
        assert_eq!(Hooks::CAN_UNLOAD.name(), "can_unload");
        assert_eq!(Hooks::ATTACHED.name(), "attached");
        assert_eq!((Hooks::BOUND | Hooks::BINDING).name(), "unknown");
    }

    #[test]
    fn lifecycle_and_routing_sets_are_disjoint() {
        assert!(!Hooks::LIFECYCLE.intersects(Hooks::ROUTING));
        assert_eq!(Hooks::LIFECYCLE.iter().count(), 6);
        assert_eq!(Hooks::ROUTING.iter().count(), 4);
    }

    #[tokio::test]
    async fn guard_result_from_bool() {
        let allowed = GuardResult::from(true).into_future().await;
        assert_eq!(allowed, Ok(Guard::Allow));
        let denied = GuardResult::from(false).into_future().await;
        assert_eq!(denied, Ok(Guard::Deny));
    }

    #[tokio::test]
    async fn failed_hook_result_resolves_to_error() {
        let result = HookResult::fail("boom").into_future().await;
        assert_eq!(result, Err(HookError::new("boom")));
    }
}
