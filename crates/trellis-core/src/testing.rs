//! Test helpers for recording hook invocations.
//!
//! A [`HookSpec`] names a component and says, per hook, whether the hook
//! is absent, synchronous, delayed by a number of scheduler ticks, failing
//! or (for guards) vetoing.  [`spec_element`] turns a spec into a
//! component definition whose view-model appends to a shared [`HookLog`]
//! on every call.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_core::testing::{spec_element, HookBehavior, HookLog, HookSpec};
//!
//! let log = HookLog::new();
//! let page = spec_element(
//!     HookSpec::sync("page").with(Hooks::ATTACHING, HookBehavior::Async(2)),
//!     &log,
//! )
//! .build();
//! // ... activate ...
//! assert_eq!(log.calls()[0], "page.binding");
//! ```

use crate::definition::{ComponentDefinition, DefinitionBuilder};
use crate::hooks::{Guard, GuardResult, HookContext, HookError, HookResult, Hooks};
use crate::navigation::{Navigation, Params};
use crate::view_model::ViewModel;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Enter,
    Leave,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub component: String,
    pub hook: String,
    pub phase: HookPhase,
}

/// Shared, append-only record of hook invocations.
#[derive(Clone, Default)]
pub struct HookLog(Rc<RefCell<Vec<HookEvent>>>);

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, component: &str, hook: &str, phase: HookPhase) {
        self.0.borrow_mut().push(HookEvent {
            component: component.to_owned(),
            hook: hook.to_owned(),
            phase,
        });
    }

    /// Record an arbitrary entry, e.g. from a binding callback.
    pub fn note(&self, component: &str, label: &str) {
        self.record(component, label, HookPhase::Enter);
    }

    /// Invocations in order, formatted as `component.hook`.
    pub fn calls(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|event| event.phase == HookPhase::Enter)
            .map(|event| format!("{}.{}", event.component, event.hook))
            .collect()
    }

    /// Invocations and completions, formatted as `component.hook.enter`
    /// and `component.hook.leave`.
    pub fn timeline(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .map(|event| {
                let phase = match event.phase {
                    HookPhase::Enter => "enter",
                    HookPhase::Leave => "leave",
                };
                format!("{}.{}.{}", event.component, event.hook, phase)
            })
            .collect()
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Return the recorded calls and clear the log.
    pub fn take_calls(&self) -> Vec<String> {
        let calls = self.calls();
        self.clear();
        calls
    }
}

/// How a hook behaves when invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookBehavior {
    /// Settle immediately.
    Sync,
    /// Settle after yielding to the scheduler the given number of times.
    Async(usize),
    /// Fail immediately.
    Fail,
    /// Fail after yielding the given number of times.
    FailAsync(usize),
    /// Guards only: veto the navigation.
    Deny,
    /// Guards only: redirect the navigation.
    Redirect(String),
}

/// Per-hook behaviour of a test component.
#[derive(Debug, Clone)]
pub struct HookSpec {
    name: String,
    behaviors: HashMap<Hooks, HookBehavior>,
}

/// Hooks [`HookSpec::sync`] and [`HookSpec::delayed`] implement.
const RECORDED: Hooks = Hooks::LIFECYCLE.union(Hooks::ROUTING).union(Hooks::DISPOSE);

impl HookSpec {
    /// A component implementing no hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviors: HashMap::new(),
        }
    }

    /// A component implementing every hook except `created`, all synchronous.
    pub fn sync(name: impl Into<String>) -> Self {
        Self::new(name).with(RECORDED, HookBehavior::Sync)
    }

    /// Like [`sync`](Self::sync) with every hook delayed by `ticks`.
    pub fn delayed(name: impl Into<String>, ticks: usize) -> Self {
        Self::new(name)
            .with(RECORDED - Hooks::DISPOSE, HookBehavior::Async(ticks))
            .with(Hooks::DISPOSE, HookBehavior::Sync)
    }

    /// Set the behaviour of every hook in `hooks`.
    pub fn with(mut self, hooks: Hooks, behavior: HookBehavior) -> Self {
        for hook in hooks.iter() {
            self.behaviors.insert(hook, behavior.clone());
        }
        self
    }

    pub fn without(mut self, hooks: Hooks) -> Self {
        for hook in hooks.iter() {
            self.behaviors.remove(&hook);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hooks(&self) -> Hooks {
        self.behaviors.keys().fold(Hooks::empty(), |all, hook| all | *hook)
    }

    fn behavior(&self, hook: Hooks) -> HookBehavior {
        self.behaviors.get(&hook).cloned().unwrap_or(HookBehavior::Sync)
    }
}

/// A view-model that records every hook call into a [`HookLog`].
pub struct SpecViewModel {
    spec: Rc<HookSpec>,
    log: HookLog,
}

async fn ticks(count: usize) {
    for _ in 0..count {
        tokio::task::yield_now().await;
    }
}

impl SpecViewModel {
    pub fn new(spec: Rc<HookSpec>, log: HookLog) -> Self {
        Self { spec, log }
    }

    fn failure(&self, hook: Hooks) -> HookError {
        HookError::new(format!("{}.{} failed", self.spec.name, hook.name()))
    }

    fn run(&self, hook: Hooks) -> HookResult {
        let name = self.spec.name.clone();
        let log = self.log.clone();
        log.record(&name, hook.name(), HookPhase::Enter);
        match self.spec.behavior(hook) {
            HookBehavior::Sync | HookBehavior::Deny | HookBehavior::Redirect(_) => {
                log.record(&name, hook.name(), HookPhase::Leave);
                HookResult::done()
            }
            HookBehavior::Async(count) => HookResult::pending(async move {
                ticks(count).await;
                log.record(&name, hook.name(), HookPhase::Leave);
                Ok(())
            }),
            HookBehavior::Fail => HookResult::Failed(self.failure(hook)),
            HookBehavior::FailAsync(count) => {
                let err = self.failure(hook);
                HookResult::pending(async move {
                    ticks(count).await;
                    Err(err)
                })
            }
        }
    }

    fn guard(&self, hook: Hooks) -> GuardResult {
        let name = self.spec.name.clone();
        let log = self.log.clone();
        log.record(&name, hook.name(), HookPhase::Enter);
        match self.spec.behavior(hook) {
            HookBehavior::Sync => {
                log.record(&name, hook.name(), HookPhase::Leave);
                GuardResult::allow()
            }
            HookBehavior::Async(count) => GuardResult::pending(async move {
                ticks(count).await;
                log.record(&name, hook.name(), HookPhase::Leave);
                Ok(Guard::Allow)
            }),
            HookBehavior::Fail => GuardResult::Ready(Err(self.failure(hook))),
            HookBehavior::FailAsync(count) => {
                let err = self.failure(hook);
                GuardResult::pending(async move {
                    ticks(count).await;
                    Err(err)
                })
            }
            HookBehavior::Deny => GuardResult::deny(),
            HookBehavior::Redirect(target) => GuardResult::redirect(target),
        }
    }
}

impl ViewModel for SpecViewModel {
    fn created(&mut self, _ctx: &HookContext) {
        self.log.record(&self.spec.name, "created", HookPhase::Enter);
    }

    fn binding(&mut self, _ctx: &HookContext) -> HookResult {
        self.run(Hooks::BINDING)
    }

    fn bound(&mut self, _ctx: &HookContext) -> HookResult {
        self.run(Hooks::BOUND)
    }

    fn attaching(&mut self, _ctx: &HookContext) -> HookResult {
        self.run(Hooks::ATTACHING)
    }

    fn attached(&mut self, _ctx: &HookContext) -> HookResult {
        self.run(Hooks::ATTACHED)
    }

    fn detaching(&mut self, _ctx: &HookContext) -> HookResult {
        self.run(Hooks::DETACHING)
    }

    fn unbinding(&mut self, _ctx: &HookContext) -> HookResult {
        self.run(Hooks::UNBINDING)
    }

    fn can_load(&mut self, _params: &Params, _navigation: &Navigation) -> GuardResult {
        self.guard(Hooks::CAN_LOAD)
    }

    fn loading(&mut self, _params: &Params, _navigation: &Navigation) -> HookResult {
        self.run(Hooks::LOADING)
    }

    fn can_unload(&mut self, _navigation: &Navigation) -> GuardResult {
        self.guard(Hooks::CAN_UNLOAD)
    }

    fn unloading(&mut self, _navigation: &Navigation) -> HookResult {
        self.run(Hooks::UNLOADING)
    }

    fn dispose(&mut self) {
        self.log.record(&self.spec.name, "dispose", HookPhase::Enter);
    }
}

/// A custom element definition backed by a [`SpecViewModel`].
pub fn spec_element(spec: HookSpec, log: &HookLog) -> DefinitionBuilder {
    with_spec(ComponentDefinition::element(spec.name().to_owned()), spec, log)
}

/// A custom attribute definition backed by a [`SpecViewModel`].
pub fn spec_attribute(spec: HookSpec, log: &HookLog) -> DefinitionBuilder {
    with_spec(ComponentDefinition::attribute(spec.name().to_owned()), spec, log)
}

fn with_spec(builder: DefinitionBuilder, spec: HookSpec, log: &HookLog) -> DefinitionBuilder {
    let hooks = spec.hooks();
    let spec = Rc::new(spec);
    let log = log.clone();
    builder.boxed_view_model(hooks, move |_| {
        Box::new(SpecViewModel::new(spec.clone(), log.clone()))
    })
}
