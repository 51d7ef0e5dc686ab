//! The lifecycle state machine driving one component instance.
//!
//! A [`Controller`] owns its view-model, rendered nodes, bindings and
//! child controllers.  [`activate`](Controller::activate) walks the
//! subtree top-down (`binding`, `bound`, mount, `attaching`, children,
//! `attached`); [`deactivate`](Controller::deactivate) collects the
//! subtree children-first into a batch owned by the initiator so that
//! every member runs `detaching` before any member runs `unbinding`.

use crate::batch::DeactivationBatch;
use crate::binding::Binding;
use crate::container::Container;
use crate::definition::{ComponentContext, ComponentDefinition};
use crate::error::LifecycleError;
use crate::hooks::{Guard, GuardResult, HookContext, HookResult, Hooks};
use crate::navigation::{Navigation, Params};
use crate::node::HostNode;
use crate::renderer;
use crate::scope::Scope;
use crate::state::{LifecycleFlags, State, VmKind};
use crate::template::{DefaultTemplateCompiler, TemplateCompiler};
use crate::view_factory::ViewFactory;
use crate::view_model::ViewModel;
use futures::future::{self, FutureExt, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Future settling a lifecycle operation.
pub type LifecycleFuture = LocalBoxFuture<'static, Result<(), LifecycleError>>;

/// Future settling a routing guard.
pub type GuardVerdict = LocalBoxFuture<'static, Result<Guard, LifecycleError>>;

thread_local! {
    static NEXT_CONTROLLER_ID: Cell<u64> = const { Cell::new(1) };
}

pub(crate) struct ControllerData {
    id: u64,
    kind: VmKind,
    name: String,
    definition: Option<Rc<ComponentDefinition>>,
    hooks: Hooks,
    state: Cell<State>,
    view_model: RefCell<Option<Box<dyn ViewModel>>>,
    container: Container,
    host: RefCell<Option<HostNode>>,
    nodes: RefCell<Vec<HostNode>>,
    bindings: RefCell<Vec<Box<dyn Binding>>>,
    children: RefCell<Vec<Controller>>,
    parent: RefCell<Weak<ControllerData>>,
    own_scope: Scope,
    scope: RefCell<Option<Scope>>,
    batch: RefCell<Option<Rc<DeactivationBatch>>>,
    factory: RefCell<Weak<ViewFactory>>,
}

/// Shared handle to a controller.  Clones refer to the same instance.
#[derive(Clone)]
pub struct Controller(Rc<ControllerData>);

pub(crate) fn settled() -> LifecycleFuture {
    future::ready(Ok(())).boxed_local()
}

pub(crate) fn first_error(results: Vec<Result<(), LifecycleError>>) -> Result<(), LifecycleError> {
    results.into_iter().collect::<Result<Vec<()>, _>>().map(|_| ())
}

fn next_id() -> u64 {
    NEXT_CONTROLLER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

fn compiler_for(container: &Container) -> Rc<dyn TemplateCompiler> {
    match container.get::<Rc<dyn TemplateCompiler>>() {
        Some(compiler) => Rc::clone(&compiler),
        None => Rc::new(DefaultTemplateCompiler::new()),
    }
}

impl Controller {
    /// Hydrate a custom element: create its view-model, render its template
    /// into child controllers, then invoke `created`.
    ///
    /// `container` becomes the element's own container; callers normally
    /// pass a fresh child of the owner's container.
    pub fn for_element(
        definition: Rc<ComponentDefinition>,
        container: Container,
        host: HostNode,
    ) -> Controller {
        Self::hydrate(definition, container, host, VmKind::CustomElement)
    }

    /// Hydrate a custom attribute on `host`.
    pub fn for_attribute(
        definition: Rc<ComponentDefinition>,
        container: Container,
        host: HostNode,
    ) -> Controller {
        Self::hydrate(definition, container, host, VmKind::CustomAttribute)
    }

    fn hydrate(
        definition: Rc<ComponentDefinition>,
        container: Container,
        host: HostNode,
        kind: VmKind,
    ) -> Controller {
        for dependency in definition.dependencies() {
            container.register_component(dependency.clone());
        }
        let context = ComponentContext {
            container: container.clone(),
            host: host.clone(),
            definition: definition.clone(),
        };
        let view_model = definition.create_view_model(&context);
        let controller = Controller::new(
            kind,
            definition.name().to_owned(),
            Some(definition.clone()),
            definition.hooks(),
            Some(view_model),
            container.clone(),
            Some(host),
        );
        if kind == VmKind::CustomElement {
            let compiled = compiler_for(&container).compile(&definition, &container);
            let nodes = renderer::render(&controller, &compiled, &container);
            *controller.0.nodes.borrow_mut() = nodes;
        }
        tracing::trace!(
            controller = %controller.name(),
            id = controller.id(),
            children = controller.0.children.borrow().len(),
            "hydrated"
        );
        controller.invoke_created();
        controller
    }

    pub(crate) fn for_view(factory: &Rc<ViewFactory>) -> Controller {
        let container = factory.container().create_child();
        let controller = Controller::new(
            VmKind::Synthetic,
            factory.name().to_owned(),
            None,
            Hooks::empty(),
            None,
            container.clone(),
            None,
        );
        *controller.0.factory.borrow_mut() = Rc::downgrade(factory);
        let nodes = renderer::render(&controller, factory.compiled(), &container);
        *controller.0.nodes.borrow_mut() = nodes;
        controller
    }

    fn new(
        kind: VmKind,
        name: String,
        definition: Option<Rc<ComponentDefinition>>,
        hooks: Hooks,
        view_model: Option<Box<dyn ViewModel>>,
        container: Container,
        host: Option<HostNode>,
    ) -> Controller {
        Controller(Rc::new(ControllerData {
            id: next_id(),
            kind,
            name,
            definition,
            hooks,
            state: Cell::new(State::empty()),
            view_model: RefCell::new(view_model),
            container,
            host: RefCell::new(host),
            nodes: RefCell::new(Vec::new()),
            bindings: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            own_scope: Scope::new(),
            scope: RefCell::new(None),
            batch: RefCell::new(None),
            factory: RefCell::new(Weak::new()),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> VmKind {
        self.0.kind
    }

    pub fn state(&self) -> State {
        self.0.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn definition(&self) -> Option<&Rc<ComponentDefinition>> {
        self.0.definition.as_ref()
    }

    pub fn hooks(&self) -> Hooks {
        self.0.hooks
    }

    pub fn container(&self) -> &Container {
        &self.0.container
    }

    pub fn host(&self) -> Option<HostNode> {
        self.0.host.borrow().clone()
    }

    /// Set the node a synthetic view mounts its nodes into.
    pub fn set_host(&self, host: HostNode) {
        *self.0.host.borrow_mut() = Some(host);
    }

    /// Top-level nodes rendered from the template.
    pub fn nodes(&self) -> Vec<HostNode> {
        self.0.nodes.borrow().clone()
    }

    pub fn children(&self) -> Vec<Controller> {
        self.0.children.borrow().clone()
    }

    pub fn add_child(&self, child: Controller) {
        *child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
        self.0.children.borrow_mut().push(child);
    }

    pub fn parent(&self) -> Option<Controller> {
        self.0.parent.borrow().upgrade().map(Controller)
    }

    pub fn add_binding(&self, binding: impl Binding + 'static) {
        self.0.bindings.borrow_mut().push(Box::new(binding));
    }

    /// The scope bindings of this controller bind against.
    pub fn scope(&self) -> Scope {
        match self.0.kind {
            VmKind::CustomElement => self.0.own_scope.clone(),
            VmKind::CustomAttribute | VmKind::Synthetic => self
                .0
                .scope
                .borrow()
                .clone()
                .unwrap_or_else(|| self.0.own_scope.clone()),
        }
    }

    pub fn ptr_eq(&self, other: &Controller) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Visit this controller and its descendants in pre-order.  Returning
    /// `false` from `visitor` skips the subtree below the visited node.
    pub fn visit(&self, visitor: &mut dyn FnMut(&Controller) -> bool) {
        if visitor(self) {
            for child in self.children() {
                child.visit(visitor);
            }
        }
    }

    /// Mark the controller as eligible for return to its view cache.  A
    /// released controller is cached or disposed once it deactivates.
    pub fn release(&self) {
        let state = self.state();
        if !state.is_disposed() {
            self.0.state.set(state | State::RELEASED);
        }
    }

    pub(crate) fn reclaim(&self) {
        let state = self.state();
        self.0.state.set(state - State::RELEASED);
    }

    /// Move to `next`, keeping the `RELEASED` bit.
    fn transition_to(&self, next: State) {
        let released = self.state() & State::RELEASED;
        self.0.state.set(next | released);
    }

    fn hook_context(&self, initiator: &Controller, parent: Option<&Controller>, flags: LifecycleFlags) -> HookContext {
        HookContext {
            controller: self.clone(),
            initiator: initiator.clone(),
            parent: parent.cloned().or_else(|| self.parent()),
            flags,
        }
    }

    fn invoke(
        &self,
        hook: Hooks,
        ctx: &HookContext,
        call: impl FnOnce(&mut dyn ViewModel, &HookContext) -> HookResult,
    ) -> LifecycleFuture {
        if !self.0.hooks.contains(hook) {
            return settled();
        }
        tracing::trace!(controller = %self.name(), id = self.id(), hook = hook.name(), "invoking hook");
        let result = {
            let mut view_model = self.0.view_model.borrow_mut();
            match view_model.as_mut() {
                Some(view_model) => call(view_model.as_mut(), ctx),
                None => HookResult::Done,
            }
        };
        let component = self.name().to_owned();
        result
            .into_future()
            .map(move |result| {
                result.map_err(|source| LifecycleError::Hook {
                    component,
                    hook: hook.name(),
                    source,
                })
            })
            .boxed_local()
    }

    fn invoke_guard(
        &self,
        hook: Hooks,
        call: impl FnOnce(&mut dyn ViewModel) -> GuardResult,
    ) -> GuardVerdict {
        if !self.0.hooks.contains(hook) {
            return future::ready(Ok(Guard::Allow)).boxed_local();
        }
        tracing::trace!(controller = %self.name(), id = self.id(), hook = hook.name(), "invoking guard");
        let result = {
            let mut view_model = self.0.view_model.borrow_mut();
            match view_model.as_mut() {
                Some(view_model) => call(view_model.as_mut()),
                None => GuardResult::allow(),
            }
        };
        let component = self.name().to_owned();
        result
            .into_future()
            .map(move |result| {
                result.map_err(|source| LifecycleError::Hook {
                    component,
                    hook: hook.name(),
                    source,
                })
            })
            .boxed_local()
    }

    fn invoke_created(&self) {
        if !self.0.hooks.contains(Hooks::CREATED) {
            return;
        }
        let ctx = self.hook_context(self, None, LifecycleFlags::empty());
        if let Some(view_model) = self.0.view_model.borrow_mut().as_mut() {
            view_model.created(&ctx);
        }
    }

    pub fn has_hook(&self, hook: Hooks) -> bool {
        self.0.hooks.contains(hook)
    }

    /// Invoke the `can_load` guard.  Absent guards allow.
    pub fn can_load(&self, params: &Params, navigation: &Navigation) -> GuardVerdict {
        self.invoke_guard(Hooks::CAN_LOAD, |vm| vm.can_load(params, navigation))
    }

    pub fn loading(&self, params: &Params, navigation: &Navigation) -> LifecycleFuture {
        let ctx = self.hook_context(self, None, LifecycleFlags::FROM_ROUTER);
        self.invoke(Hooks::LOADING, &ctx, |vm, _| vm.loading(params, navigation))
    }

    /// Invoke the `can_unload` guard.  Absent guards allow.
    pub fn can_unload(&self, navigation: &Navigation) -> GuardVerdict {
        self.invoke_guard(Hooks::CAN_UNLOAD, |vm| vm.can_unload(navigation))
    }

    pub fn unloading(&self, navigation: &Navigation) -> LifecycleFuture {
        let ctx = self.hook_context(self, None, LifecycleFlags::FROM_ROUTER);
        self.invoke(Hooks::UNLOADING, &ctx, |vm, _| vm.unloading(navigation))
    }

    /// Activate this controller and its subtree.
    ///
    /// Misuse is reported synchronously: activating a disposed controller,
    /// activating while a lifecycle operation is in flight, re-activating
    /// under an inactive parent, re-activating with a different scope, or
    /// activating a synthetic view without a scope.  Activating an
    /// activated controller with the same scope (or none) is a no-op.
    ///
    /// The returned future settles once the whole subtree has run
    /// `attached`, or with the first hook error.  Descendants are left in
    /// whatever state they reached when an error occurs.
    pub fn activate(
        &self,
        initiator: &Controller,
        parent: Option<&Controller>,
        flags: LifecycleFlags,
        scope: Option<Scope>,
    ) -> Result<LifecycleFuture, LifecycleError> {
        let state = self.state();
        if state.is_disposed() {
            return Err(LifecycleError::Disposed {
                name: self.name().to_owned(),
                action: "activate",
            });
        }
        if state.contains(State::ACTIVATED) {
            if let Some(scope) = &scope {
                let same = self
                    .0
                    .scope
                    .borrow()
                    .as_ref()
                    .is_some_and(|current| current.ptr_eq(scope));
                if !same {
                    return Err(LifecycleError::ScopeMismatch {
                        name: self.name().to_owned(),
                    });
                }
            }
            return Ok(settled());
        }
        if state.intersects(State::TRANSIENT) {
            return Err(LifecycleError::InvalidTransition {
                name: self.name().to_owned(),
                action: "activate",
                state,
            });
        }
        if state.contains(State::DEACTIVATED) {
            let parent_active = parent
                .cloned()
                .or_else(|| self.parent())
                .is_none_or(|parent| parent.is_active());
            if !parent_active {
                return Err(LifecycleError::ParentInactive {
                    name: self.name().to_owned(),
                });
            }
        }
        if self.0.kind == VmKind::Synthetic && scope.is_none() && self.0.scope.borrow().is_none() {
            return Err(LifecycleError::MissingScope {
                name: self.name().to_owned(),
            });
        }
        if let Some(scope) = scope {
            *self.0.scope.borrow_mut() = Some(scope);
        }
        if let Some(parent) = parent {
            *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
        }
        self.0.state.set(State::ACTIVATING);
        tracing::trace!(controller = %self.name(), id = self.id(), "activating");

        let this = self.clone();
        let initiator = initiator.clone();
        let parent = parent.cloned();
        Ok(async move { this.run_activation(initiator, parent, flags).await }.boxed_local())
    }

    async fn run_activation(
        self,
        initiator: Controller,
        parent: Option<Controller>,
        flags: LifecycleFlags,
    ) -> Result<(), LifecycleError> {
        let ctx = self.hook_context(&initiator, parent.as_ref(), flags);
        self.invoke(Hooks::BINDING, &ctx, |vm, ctx| vm.binding(ctx)).await?;
        self.bind_bindings(flags);
        self.invoke(Hooks::BOUND, &ctx, |vm, ctx| vm.bound(ctx)).await?;
        self.mount();

        let attaching = self.invoke(Hooks::ATTACHING, &ctx, |vm, ctx| vm.attaching(ctx));
        let scope = self.scope();
        let children: Vec<LifecycleFuture> = self
            .children()
            .iter()
            .map(|child| {
                let child_scope = (child.kind() != VmKind::CustomElement).then(|| scope.clone());
                child
                    .activate(&initiator, Some(&self), flags, child_scope)
                    .unwrap_or_else(|err| future::ready(Err(err)).boxed_local())
            })
            .collect();
        let (attaching, children) = future::join(attaching, future::join_all(children)).await;
        attaching?;
        first_error(children)?;

        self.invoke(Hooks::ATTACHED, &ctx, |vm, ctx| vm.attached(ctx)).await?;
        self.transition_to(State::ACTIVATED);
        tracing::trace!(controller = %self.name(), id = self.id(), "activated");
        Ok(())
    }

    fn bind_bindings(&self, flags: LifecycleFlags) {
        let scope = self.scope();
        for binding in self.0.bindings.borrow_mut().iter_mut() {
            binding.bind(flags, &scope);
        }
    }

    fn mount(&self) {
        if let Some(host) = self.host() {
            for node in self.0.nodes.borrow().iter() {
                host.append_child(node);
            }
        }
    }

    pub(crate) fn unmount(&self) {
        for node in self.0.nodes.borrow().iter() {
            node.remove();
        }
    }

    /// Deactivate this controller and its subtree.
    ///
    /// When `initiator` is another controller with an open batch, this
    /// controller joins that batch and the returned future settles
    /// immediately; the initiator's future settles the whole batch.
    /// Otherwise this controller opens a batch of its own.
    ///
    /// Deactivating a controller that was never activated, or is already
    /// deactivated, is a no-op.  Deactivating a disposed controller, or
    /// one that is still activating, is an error.
    pub fn deactivate(
        &self,
        initiator: &Controller,
        parent: Option<&Controller>,
        flags: LifecycleFlags,
    ) -> Result<LifecycleFuture, LifecycleError> {
        let state = self.state();
        if state.is_disposed() {
            return Err(LifecycleError::Disposed {
                name: self.name().to_owned(),
                action: "deactivate",
            });
        }
        if !state.contains(State::ACTIVATED) {
            if state.intersects(State::TRANSIENT) {
                return Err(LifecycleError::InvalidTransition {
                    name: self.name().to_owned(),
                    action: "deactivate",
                    state,
                });
            }
            return Ok(settled());
        }

        if !initiator.ptr_eq(self) {
            if let Some(batch) = initiator.open_batch() {
                self.enlist(&batch, initiator, parent, flags);
                return Ok(settled());
            }
        }

        let batch = Rc::new(DeactivationBatch::default());
        *self.0.batch.borrow_mut() = Some(batch.clone());
        self.enlist(&batch, self, parent, flags);

        let this = self.clone();
        Ok(async move {
            let result = batch.settle(&this, flags).await;
            this.0.batch.borrow_mut().take();
            result
        }
        .boxed_local())
    }

    fn open_batch(&self) -> Option<Rc<DeactivationBatch>> {
        self.0.batch.borrow().clone()
    }

    fn enlist(
        &self,
        batch: &Rc<DeactivationBatch>,
        initiator: &Controller,
        parent: Option<&Controller>,
        flags: LifecycleFlags,
    ) {
        self.transition_to(State::DEACTIVATING);
        tracing::trace!(controller = %self.name(), id = self.id(), initiator = initiator.id(), "deactivating");
        for child in self.children() {
            if child.state().contains(State::ACTIVATED) {
                child.enlist(batch, initiator, Some(self), flags);
            }
        }
        let ctx = self.hook_context(initiator, parent, flags);
        let detaching = self.invoke(Hooks::DETACHING, &ctx, |vm, ctx| vm.detaching(ctx));
        batch.enlist(self.clone(), detaching);
    }

    pub(crate) fn unbinding(&self, initiator: &Controller, flags: LifecycleFlags) -> LifecycleFuture {
        let ctx = self.hook_context(initiator, None, flags);
        self.invoke(Hooks::UNBINDING, &ctx, |vm, ctx| vm.unbinding(ctx))
    }

    pub(crate) fn finish_deactivation(&self, flags: LifecycleFlags) {
        if self.state().is_disposed() {
            return;
        }
        for binding in self.0.bindings.borrow_mut().iter_mut() {
            binding.unbind(flags);
        }
        if self.0.kind == VmKind::Synthetic {
            self.0.scope.borrow_mut().take();
        }
        self.transition_to(State::DEACTIVATED);
        tracing::trace!(controller = %self.name(), id = self.id(), "deactivated");

        if self.state().contains(State::RELEASED) {
            let factory = self.0.factory.borrow().upgrade();
            let cached = factory.is_some_and(|factory| factory.try_return_to_cache(self));
            if !cached {
                self.dispose();
            }
        }
    }

    /// Tear the controller down.  Idempotent.
    ///
    /// Disposes the children, invokes the `dispose` hook, then drops the
    /// view-model, nodes, bindings and scope.
    pub fn dispose(&self) {
        if self.state().is_disposed() {
            return;
        }
        self.0.state.set(State::DISPOSED);
        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in children {
            child.dispose();
        }
        let view_model = self.0.view_model.borrow_mut().take();
        if let Some(mut view_model) = view_model {
            if self.0.hooks.contains(Hooks::DISPOSE) {
                view_model.dispose();
            }
        }
        let nodes = std::mem::take(&mut *self.0.nodes.borrow_mut());
        for node in nodes {
            node.remove();
        }
        self.0.bindings.borrow_mut().clear();
        self.0.scope.borrow_mut().take();
        self.0.host.borrow_mut().take();
        self.0.batch.borrow_mut().take();
        tracing::trace!(controller = %self.name(), id = self.id(), "disposed");
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::CallbackBinding;
    use crate::definition::ComponentDefinition;
    use crate::template::{Template, TemplateNode};
    use crate::testing::{spec_element, HookBehavior, HookLog, HookSpec};
    use pretty_assertions::assert_eq;

    fn root_with_child(log: &HookLog, parent: HookSpec, child: HookSpec) -> Controller {
        let container = Container::new();
        container.register_component(spec_element(child, log).build());
        let child_tag = TemplateNode::element("child");
        let parent_def = spec_element(parent, log)
            .template(Template::new([child_tag]))
            .build();
        Controller::for_element(parent_def, container.create_child(), HostNode::element("parent"))
    }

    async fn activate(controller: &Controller) -> Result<(), LifecycleError> {
        controller
            .activate(controller, None, LifecycleFlags::empty(), None)?
            .await
    }

    async fn deactivate(controller: &Controller) -> Result<(), LifecycleError> {
        controller.deactivate(controller, None, LifecycleFlags::empty())?.await
    }

    #[tokio::test]
    async fn parent_attaching_precedes_child_activation() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));

        activate(&root).await.unwrap();

        assert_eq!(
            log.calls(),
            vec![
                "parent.binding",
                "parent.bound",
                "parent.attaching",
                "child.binding",
                "child.bound",
                "child.attaching",
                "child.attached",
                "parent.attached",
            ]
        );
        assert_eq!(root.state(), State::ACTIVATED);
        assert!(root.children().iter().all(Controller::is_active));
    }

    #[tokio::test]
    async fn async_attaching_is_invoked_before_children_start() {
        let log = HookLog::new();
        let parent = HookSpec::sync("parent").with(Hooks::ATTACHING, HookBehavior::Async(3));
        let child = HookSpec::sync("child").with(Hooks::BINDING, HookBehavior::Async(1));
        let root = root_with_child(&log, parent, child);

        activate(&root).await.unwrap();

        let timeline = log.timeline();
        let attaching = timeline.iter().position(|e| e == "parent.attaching.enter");
        let child_binding = timeline.iter().position(|e| e == "child.binding.enter");
        let attached = timeline.iter().position(|e| e == "parent.attached.enter");
        let attaching_left = timeline.iter().position(|e| e == "parent.attaching.leave");
        assert!(attaching < child_binding);
        assert!(attaching_left < attached);
        let child_attached = timeline.iter().position(|e| e == "child.attached.enter");
        assert!(child_attached < attached);
    }

    #[tokio::test]
    async fn children_detach_before_parent_and_unbind_after_all_detach() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));
        activate(&root).await.unwrap();
        log.clear();

        deactivate(&root).await.unwrap();

        assert_eq!(
            log.calls(),
            vec![
                "child.detaching",
                "parent.detaching",
                "child.unbinding",
                "parent.unbinding",
            ]
        );
        assert_eq!(root.state(), State::DEACTIVATED);
    }

    #[tokio::test]
    async fn unbinding_waits_for_every_async_detaching() {
        let log = HookLog::new();
        let child = HookSpec::sync("child").with(Hooks::DETACHING, HookBehavior::Async(4));
        let root = root_with_child(&log, HookSpec::sync("parent"), child);
        activate(&root).await.unwrap();
        log.clear();

        deactivate(&root).await.unwrap();

        let timeline = log.timeline();
        let detach_done = timeline.iter().position(|e| e == "child.detaching.leave");
        let first_unbinding = timeline.iter().position(|e| e.ends_with("unbinding.enter"));
        assert!(detach_done < first_unbinding);
    }

    #[tokio::test]
    async fn view_model_without_hooks_records_nothing() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::new("parent"), HookSpec::new("child"));

        activate(&root).await.unwrap();
        deactivate(&root).await.unwrap();
        root.dispose();

        assert!(log.calls().is_empty());
        assert!(root.state().is_disposed());
    }

    #[tokio::test]
    async fn activation_is_idempotent_for_the_same_scope() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));
        let scope = Scope::new();
        root.activate(&root, None, LifecycleFlags::empty(), Some(scope.clone()))
            .unwrap()
            .await
            .unwrap();
        let before = log.calls().len();

        root.activate(&root, None, LifecycleFlags::empty(), Some(scope))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(log.calls().len(), before);

        let err = root
            .activate(&root, None, LifecycleFlags::empty(), Some(Scope::new()))
            .err();
        assert!(matches!(err, Some(LifecycleError::ScopeMismatch { .. })));
    }

    #[tokio::test]
    async fn misuse_is_reported_synchronously() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));

        let pending = root.activate(&root, None, LifecycleFlags::empty(), None).unwrap();
        let err = root.activate(&root, None, LifecycleFlags::empty(), None).err();
        assert!(matches!(err, Some(LifecycleError::InvalidTransition { .. })));
        pending.await.unwrap();

        root.dispose();
        let err = root.deactivate(&root, None, LifecycleFlags::empty()).err();
        assert!(matches!(err, Some(LifecycleError::Disposed { .. })));
        let err = root.activate(&root, None, LifecycleFlags::empty(), None).err();
        assert!(matches!(err, Some(LifecycleError::Disposed { .. })));
    }

    #[tokio::test]
    async fn deactivating_an_inactive_controller_is_a_no_op() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));
        deactivate(&root).await.unwrap();
        assert!(log.calls().is_empty());
        assert_eq!(root.state(), State::empty());
    }

    #[tokio::test]
    async fn reactivation_requires_an_active_parent() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));
        activate(&root).await.unwrap();
        deactivate(&root).await.unwrap();

        let child = root.children()[0].clone();
        let err = child.activate(&child, Some(&root), LifecycleFlags::empty(), None).err();
        assert!(matches!(err, Some(LifecycleError::ParentInactive { .. })));

        log.clear();
        activate(&root).await.unwrap();
        assert_eq!(log.calls().first().map(String::as_str), Some("parent.binding"));
        assert!(child.is_active());
    }

    #[tokio::test]
    async fn hook_failure_rejects_the_batch() {
        let log = HookLog::new();
        let child = HookSpec::sync("child").with(Hooks::BOUND, HookBehavior::Fail);
        let root = root_with_child(&log, HookSpec::sync("parent"), child);

        let err = activate(&root).await.unwrap_err();

        assert!(matches!(&err, LifecycleError::Hook { component, hook: "bound", .. } if component == "child"));
        assert!(!log.calls().contains(&"parent.attached".to_owned()));
    }

    #[tokio::test]
    async fn released_controller_is_disposed_after_unbinding() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));
        activate(&root).await.unwrap();
        log.clear();

        root.release();
        deactivate(&root).await.unwrap();

        assert_eq!(
            log.calls(),
            vec![
                "child.detaching",
                "parent.detaching",
                "child.unbinding",
                "parent.unbinding",
                "child.dispose",
                "parent.dispose",
            ]
        );
        assert!(root.state().is_disposed());
        assert!(root.children().is_empty());
    }

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::sync("child"));
        root.dispose();
        root.dispose();
        assert_eq!(log.calls(), vec!["child.dispose", "parent.dispose"]);
    }

    #[tokio::test]
    async fn bindings_follow_bound_and_unbinding_boundaries() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::sync("parent"), HookSpec::new("child"));
        let bind_log = log.clone();
        let unbind_log = log.clone();
        root.add_binding(CallbackBinding::new(
            move |_| bind_log.note("parent", "bind"),
            move || unbind_log.note("parent", "unbind"),
        ));

        activate(&root).await.unwrap();
        deactivate(&root).await.unwrap();

        let calls = log.calls();
        let position = |entry: &str| calls.iter().position(|c| c == entry);
        assert!(position("parent.binding") < position("parent.bind"));
        assert!(position("parent.bind") < position("parent.bound"));
        assert!(position("parent.unbinding") < position("parent.unbind"));
    }

    #[tokio::test]
    async fn nodes_are_mounted_into_the_host_while_active() {
        let container = Container::new();
        let definition = ComponentDefinition::element("greeting")
            .template(Template::new([TemplateNode::element("p").child(TemplateNode::text("hi"))]))
            .build();
        let host = HostNode::element("greeting");
        let controller = Controller::for_element(definition, container, host.clone());

        activate(&controller).await.unwrap();
        assert_eq!(host.to_markup(), "<greeting><p>hi</p></greeting>");

        deactivate(&controller).await.unwrap();
        assert_eq!(host.to_markup(), "<greeting></greeting>");
    }

    #[tokio::test]
    async fn visit_walks_preorder() {
        let log = HookLog::new();
        let root = root_with_child(&log, HookSpec::new("parent"), HookSpec::new("child"));
        let mut names = Vec::new();
        root.visit(&mut |controller| {
            names.push(controller.name().to_owned());
            true
        });
        assert_eq!(names, vec!["parent", "child"]);
    }
}
