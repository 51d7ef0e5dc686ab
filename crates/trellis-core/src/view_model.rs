use crate::hooks::{GuardResult, HookContext, HookResult, Hooks};
use crate::navigation::{Navigation, Params};

/// Behaviour backing a custom element or custom attribute.
///
/// Every hook has a default implementation, but the controller only calls
/// the hooks named by the definition's [`Hooks`] set.  Implementors
/// declare that set through [`ViewModel::hooks`]:
///
/// ```rust,ignore
/// struct Clock;
///
/// impl ViewModel for Clock {
///     fn hooks() -> Hooks {
///         Hooks::ATTACHED | Hooks::DETACHING
///     }
///
///     fn attached(&mut self, _ctx: &HookContext) -> HookResult {
///         start_ticking();
///         HookResult::done()
///     }
///
///     fn detaching(&mut self, _ctx: &HookContext) -> HookResult {
///         stop_ticking();
///         HookResult::done()
///     }
/// }
/// ```
///
/// Hooks run in this order during activation: `binding`, `bound`,
/// `attaching`, then the children activate, then `attached`.  Deactivation
/// runs `detaching` for the whole batch before any `unbinding`.
pub trait ViewModel: 'static {
    /// The hooks this type implements.
    fn hooks() -> Hooks
    where
        Self: Sized,
    {
        Hooks::empty()
    }

    /// Called once after the component and its template are hydrated.
    fn created(&mut self, _ctx: &HookContext) {}

    fn binding(&mut self, _ctx: &HookContext) -> HookResult {
        HookResult::done()
    }

    fn bound(&mut self, _ctx: &HookContext) -> HookResult {
        HookResult::done()
    }

    fn attaching(&mut self, _ctx: &HookContext) -> HookResult {
        HookResult::done()
    }

    fn attached(&mut self, _ctx: &HookContext) -> HookResult {
        HookResult::done()
    }

    fn detaching(&mut self, _ctx: &HookContext) -> HookResult {
        HookResult::done()
    }

    fn unbinding(&mut self, _ctx: &HookContext) -> HookResult {
        HookResult::done()
    }

    /// Routing guard invoked before the component is loaded into a viewport.
    fn can_load(&mut self, _params: &Params, _navigation: &Navigation) -> GuardResult {
        GuardResult::allow()
    }

    fn loading(&mut self, _params: &Params, _navigation: &Navigation) -> HookResult {
        HookResult::done()
    }

    /// Routing guard invoked before the component leaves its viewport.
    fn can_unload(&mut self, _navigation: &Navigation) -> GuardResult {
        GuardResult::allow()
    }

    fn unloading(&mut self, _navigation: &Navigation) -> HookResult {
        HookResult::done()
    }

    /// Called once when the controller is disposed.
    fn dispose(&mut self) {}
}

/// View-model used by definitions that declare none of their own.
#[derive(Debug, Default)]
pub struct EmptyViewModel;

impl ViewModel for EmptyViewModel {}
