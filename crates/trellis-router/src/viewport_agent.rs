//! The per-viewport half of a transition.
//!
//! Every `<viewport>` element registers a [`ViewportAgent`] with the
//! routing context it sits in.  During a transition the agent decides what
//! its viewport will do (a `Plan`), hydrates the incoming component and
//! runs the routing hooks for its own subtree.  The transition only
//! coordinates the agents of the root level and puts a barrier between
//! phases; the agents recurse into their children themselves.

use crate::config::TransitionPlan;
use crate::context::{Resolution, RouteContext};
use crate::error::RouterError;
use crate::instruction::{InstructionTree, ViewportInstruction};
use crate::route_tree::RouteNode;
use crate::transition::{settle, RouterFuture, Transition};
use futures::future::{self, FutureExt};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use trellis_core::{
    ComponentDefinition, Controller, Hooks, HostNode, LifecycleFlags, LifecycleFuture, Navigation, State,
};

/// A routed component shown in a viewport.
#[derive(Clone)]
pub(crate) struct Mounted {
    pub(crate) controller: Controller,
    /// The component's own routing context.
    pub(crate) context: RouteContext,
    /// Element hosting the component inside the viewport.
    pub(crate) host: HostNode,
    pub(crate) component: Rc<ComponentDefinition>,
    pub(crate) node: RouteNode,
}

/// What a viewport does during one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Plan {
    /// Empty before and after.
    Idle,
    /// Same component, no hooks.
    Keep,
    /// Same instance, routing hooks run again.
    ReInvoke,
    /// The current component leaves and a new one is loaded.
    Replace,
    /// The current component leaves, nothing replaces it.
    Remove,
    /// Something is loaded into an empty viewport.
    Add,
}

struct Update {
    context: RouteContext,
    instruction: Option<ViewportInstruction>,
    plan: Option<Plan>,
    resolution: Option<Resolution>,
    next: Option<Mounted>,
    /// Agents below the current component that leave with it.
    removed: Vec<ViewportAgent>,
    /// Agents below the component that stays or arrives.
    children: Vec<ViewportAgent>,
    activated: bool,
}

thread_local! {
    static NEXT_AGENT_ID: Cell<u64> = const { Cell::new(1) };
}

struct AgentData {
    id: u64,
    name: String,
    default: Option<String>,
    fallback: Option<String>,
    viewport: RefCell<Option<Controller>>,
    current: RefCell<Option<Mounted>>,
    update: RefCell<Option<Update>>,
}

/// Router-side state of one viewport.
#[derive(Clone)]
pub struct ViewportAgent(Rc<AgentData>);

fn settled() -> LifecycleFuture {
    future::ready(Ok(())).boxed_local()
}

impl ViewportAgent {
    pub(crate) fn new(
        name: impl Into<String>,
        default: Option<String>,
        fallback: Option<String>,
        viewport: Controller,
    ) -> Self {
        let id = NEXT_AGENT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self(Rc::new(AgentData {
            id,
            name: name.into(),
            default,
            fallback,
            viewport: RefCell::new(Some(viewport)),
            current: RefCell::new(None),
            update: RefCell::new(None),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The instruction loaded when a navigation leaves the viewport empty.
    pub fn default_path(&self) -> Option<&str> {
        self.0.default.as_deref()
    }

    /// Component substituted for paths this viewport cannot resolve.
    pub fn fallback(&self) -> Option<&str> {
        self.0.fallback.as_deref()
    }

    /// Name of the component currently shown.
    pub fn current_component(&self) -> Option<String> {
        self.0.current.borrow().as_ref().map(|mounted| mounted.component.name().to_owned())
    }

    pub fn ptr_eq(&self, other: &ViewportAgent) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn current(&self) -> Option<Mounted> {
        self.0.current.borrow().clone()
    }

    fn viewport(&self) -> Option<Controller> {
        self.0.viewport.borrow().clone()
    }

    pub(crate) fn default_instruction(&self) -> Result<Option<ViewportInstruction>, RouterError> {
        let Some(default) = &self.0.default else {
            return Ok(None);
        };
        Ok(InstructionTree::parse(default)?.children.into_iter().next())
    }

    /// The shown subtree, with the nodes of nested viewports as children.
    pub(crate) fn route_node(&self) -> Option<RouteNode> {
        let mounted = self.current()?;
        let mut node = mounted.node.clone();
        node.children = mounted
            .context
            .agents()
            .iter()
            .filter_map(ViewportAgent::route_node)
            .collect();
        Some(node)
    }

    fn schedule(&self, context: &RouteContext, instruction: Option<ViewportInstruction>) {
        *self.0.update.borrow_mut() = Some(Update {
            context: context.clone(),
            instruction,
            plan: None,
            resolution: None,
            next: None,
            removed: Vec::new(),
            children: Vec::new(),
            activated: false,
        });
    }

    /// Allocate `instructions` to the agents of `context` and prepare each
    /// agent for the transition.
    pub(crate) fn schedule_level(
        context: &RouteContext,
        instructions: &[ViewportInstruction],
    ) -> Result<Vec<ViewportAgent>, RouterError> {
        let allocation = context.allocate(instructions)?;
        Ok(allocation
            .into_iter()
            .map(|(agent, instruction)| {
                agent.schedule(context, instruction);
                agent
            })
            .collect())
    }

    fn schedule_removals(context: &RouteContext) -> Vec<ViewportAgent> {
        context
            .agents()
            .into_iter()
            .filter(|agent| agent.0.current.borrow().is_some())
            .inspect(|agent| agent.schedule(context, None))
            .collect()
    }

    fn plan(&self) -> Plan {
        self.0
            .update
            .borrow()
            .as_ref()
            .and_then(|update| update.plan)
            .unwrap_or(Plan::Idle)
    }

    fn children(&self) -> Vec<ViewportAgent> {
        self.with_update(|update| update.children.clone()).unwrap_or_default()
    }

    fn removed(&self) -> Vec<ViewportAgent> {
        self.with_update(|update| update.removed.clone()).unwrap_or_default()
    }

    fn next(&self) -> Option<Mounted> {
        self.with_update(|update| update.next.clone()).flatten()
    }

    fn params(&self) -> trellis_core::Params {
        self.with_update(|update| update.resolution.as_ref().map(|r| r.params.clone()))
            .flatten()
            .unwrap_or_default()
    }

    fn with_update<R>(&self, read: impl FnOnce(&mut Update) -> R) -> Option<R> {
        self.0.update.borrow_mut().as_mut().map(read)
    }

    /// Decide the plan once per transition; later calls return the cached
    /// decision.
    fn determine(&self, tr: &Transition) -> Result<Plan, RouterError> {
        let (context, instruction) = {
            let update = self.0.update.borrow();
            let Some(update) = update.as_ref() else {
                return Ok(Plan::Idle);
            };
            if let Some(plan) = update.plan {
                return Ok(plan);
            }
            (update.context.clone(), update.instruction.clone())
        };
        let resolution = match &instruction {
            Some(instruction) => {
                context.resolve(instruction, self.0.fallback.as_deref(), &self.0.name, tr.max_redirects)?
            }
            None => None,
        };
        let plan = {
            let current = self.0.current.borrow();
            match (&resolution, current.as_ref()) {
                (None, None) => Plan::Idle,
                (None, Some(_)) => Plan::Remove,
                (Some(_), None) => Plan::Add,
                (Some(next), Some(current)) if Rc::ptr_eq(&next.component, &current.component) => {
                    match tr.plan.or(next.plan) {
                        Some(TransitionPlan::Replace) => Plan::Replace,
                        Some(TransitionPlan::InvokeLifecycles) => Plan::ReInvoke,
                        Some(TransitionPlan::None) => Plan::Keep,
                        None if next.params == current.node.params => Plan::Keep,
                        None => Plan::Replace,
                    }
                }
                (Some(_), Some(_)) => Plan::Replace,
            }
        };
        tracing::trace!(
            transition = tr.id,
            context = %context.path(),
            viewport = %self.0.name,
            ?plan,
            "planned viewport"
        );
        self.with_update(|update| {
            update.plan = Some(plan);
            update.resolution = resolution;
        });
        Ok(plan)
    }

    /// Prepare the agents below a component that stays.
    fn schedule_kept(&self) -> Result<Vec<ViewportAgent>, RouterError> {
        let Some(current) = self.current() else {
            return Ok(Vec::new());
        };
        let instructions = self
            .with_update(|update| update.resolution.as_ref().map(|r| r.children.clone()))
            .flatten()
            .unwrap_or_default();
        let children = Self::schedule_level(&current.context, &instructions)?;
        self.with_update(|update| update.children = children.clone());
        Ok(children)
    }

    /// Prepare the agents below a component that leaves.
    fn schedule_leaving(&self) -> Vec<ViewportAgent> {
        let Some(current) = self.current() else {
            return Vec::new();
        };
        let removed = Self::schedule_removals(&current.context);
        self.with_update(|update| update.removed = removed.clone());
        removed
    }

    pub(crate) fn navigation(&self, tr: &Transition) -> Navigation {
        let query = &tr.tree.query;
        let fragment = tr.tree.fragment.as_deref();
        let next = self
            .with_update(|update| {
                update
                    .resolution
                    .as_ref()
                    .map(|resolution| resolution.node(&self.0.name).snapshot(query, fragment))
            })
            .flatten();
        let current = self
            .0
            .current
            .borrow()
            .as_ref()
            .map(|mounted| mounted.node.snapshot(query, fragment));
        Navigation {
            id: tr.id,
            instruction: tr.tree.to_string(),
            next,
            current,
        }
    }

    /// Run `can_unload` for this subtree, deepest components first.
    ///
    /// A resolution failure still lets the components below the current
    /// one answer before the error is raised.
    pub(crate) fn can_unload(&self, tr: &Rc<Transition>) -> RouterFuture {
        let agent = self.clone();
        let tr = tr.clone();
        async move {
            let planned = agent.determine(&tr);
            let (children, scheduling) = match &planned {
                Ok(Plan::Keep | Plan::ReInvoke) => match agent.schedule_kept() {
                    Ok(children) => (children, Ok(())),
                    Err(err) => (Vec::new(), Err(err)),
                },
                Ok(Plan::Idle | Plan::Add) => (Vec::new(), Ok(())),
                Ok(Plan::Replace | Plan::Remove) | Err(_) => (agent.schedule_leaving(), Ok(())),
            };
            settle(children.iter().map(|child| child.can_unload(&tr)).collect()).await?;
            let plan = planned?;
            scheduling?;

            if matches!(plan, Plan::ReInvoke | Plan::Replace | Plan::Remove) && tr.guards_open() {
                if let Some(current) = agent.current() {
                    let navigation = agent.navigation(&tr);
                    let verdict = current.controller.can_unload(&navigation).await?;
                    tr.judge(&current.controller, Hooks::CAN_UNLOAD, verdict);
                }
            }
            Ok(())
        }
        .boxed_local()
    }

    /// Run `can_load` for this subtree, outermost components first.
    /// Incoming components are hydrated here so that their own viewports
    /// exist when the children are allocated.
    pub(crate) fn can_load(&self, tr: &Rc<Transition>) -> RouterFuture {
        let agent = self.clone();
        let tr = tr.clone();
        async move {
            let plan = agent.determine(&tr)?;
            if !tr.guards_open() {
                return Ok(());
            }
            match plan {
                Plan::ReInvoke => {
                    if let Some(current) = agent.current() {
                        let verdict = current
                            .controller
                            .can_load(&agent.params(), &agent.navigation(&tr))
                            .await?;
                        tr.judge(&current.controller, Hooks::CAN_LOAD, verdict);
                    }
                }
                Plan::Add | Plan::Replace => {
                    let next = agent.hydrate()?;
                    let verdict = next
                        .controller
                        .can_load(&agent.params(), &agent.navigation(&tr))
                        .await?;
                    tr.judge(&next.controller, Hooks::CAN_LOAD, verdict);
                    if tr.guards_open() {
                        let instructions = agent
                            .with_update(|update| update.resolution.as_ref().map(|r| r.children.clone()))
                            .flatten()
                            .unwrap_or_default();
                        let children = Self::schedule_level(&next.context, &instructions)?;
                        agent.with_update(|update| update.children = children);
                    }
                }
                Plan::Idle | Plan::Keep | Plan::Remove => {}
            }
            if !tr.guards_open() {
                return Ok(());
            }
            let children = agent.children();
            settle(children.iter().map(|child| child.can_load(&tr)).collect()).await
        }
        .boxed_local()
    }

    fn hydrate(&self) -> Result<Mounted, RouterError> {
        let (context, resolution) = self
            .with_update(|update| (update.context.clone(), update.resolution.clone()))
            .ok_or_else(|| RouterError::UnknownViewport {
                viewport: self.0.name.clone(),
                context: String::new(),
            })?;
        let viewport = self.viewport().ok_or_else(|| RouterError::UnknownViewport {
            viewport: self.0.name.clone(),
            context: context.path(),
        })?;
        let Some(resolution) = resolution else {
            return Err(RouterError::UnknownViewport {
                viewport: self.0.name.clone(),
                context: context.path(),
            });
        };

        let container = viewport.container().create_child();
        let child_context = RouteContext::new(resolution.component.clone(), &container, Some(&context))?;
        container.register(child_context.clone());
        let host = HostNode::element(resolution.component.name());
        let controller = Controller::for_element(resolution.component.clone(), container, host.clone());
        tracing::debug!(
            context = %context.path(),
            viewport = %self.0.name,
            component = resolution.component.name(),
            "hydrated routed component"
        );
        let mounted = Mounted {
            controller,
            context: child_context,
            host,
            component: resolution.component.clone(),
            node: resolution.node(&self.0.name),
        };
        self.with_update(|update| update.next = Some(mounted.clone()));
        Ok(mounted)
    }

    /// Run `unloading` for this subtree, deepest components first.
    pub(crate) fn unloading(&self, tr: &Rc<Transition>) -> RouterFuture {
        let agent = self.clone();
        let tr = tr.clone();
        async move {
            let plan = agent.plan();
            let leaving = match plan {
                Plan::Keep | Plan::ReInvoke => agent.children(),
                Plan::Replace | Plan::Remove => agent.removed(),
                Plan::Idle | Plan::Add => Vec::new(),
            };
            settle(leaving.iter().map(|child| child.unloading(&tr)).collect()).await?;
            if matches!(plan, Plan::ReInvoke | Plan::Replace | Plan::Remove) {
                if let Some(current) = agent.current() {
                    current.controller.unloading(&agent.navigation(&tr)).await?;
                }
            }
            Ok(())
        }
        .boxed_local()
    }

    /// Run `loading` for this subtree, outermost components first.
    pub(crate) fn loading(&self, tr: &Rc<Transition>) -> RouterFuture {
        let agent = self.clone();
        let tr = tr.clone();
        async move {
            let target = match agent.plan() {
                Plan::ReInvoke => agent.current(),
                Plan::Add | Plan::Replace => agent.next(),
                Plan::Idle | Plan::Keep | Plan::Remove => None,
            };
            if let Some(target) = target {
                target
                    .controller
                    .loading(&agent.params(), &agent.navigation(&tr))
                    .await?;
            }
            let children = agent.children();
            settle(children.iter().map(|child| child.loading(&tr)).collect()).await
        }
        .boxed_local()
    }

    /// Deactivate what leaves and activate what arrives.
    pub(crate) fn swap(&self, tr: &Rc<Transition>) -> RouterFuture {
        let agent = self.clone();
        let tr = tr.clone();
        async move {
            let plan = agent.plan();
            match plan {
                Plan::Idle => return Ok(()),
                Plan::Remove => {
                    return agent
                        .deactivate(None, LifecycleFlags::FROM_ROUTER)
                        .await
                        .map_err(RouterError::from)
                }
                Plan::Replace => {
                    let flags = agent.replace_flags(&tr);
                    agent.deactivate(None, flags).await?;
                    agent.activate(None, flags).await?;
                }
                Plan::Add => agent.activate(None, LifecycleFlags::FROM_ROUTER).await?,
                Plan::Keep | Plan::ReInvoke => {}
            }
            let children = agent.children();
            settle(children.iter().map(|child| child.swap(&tr)).collect()).await
        }
        .boxed_local()
    }

    /// `RELOAD` is added when a forced `Replace` swaps a component for a
    /// fresh instance of itself.
    fn replace_flags(&self, tr: &Transition) -> LifecycleFlags {
        let same = match (self.current(), self.next()) {
            (Some(current), Some(next)) => Rc::ptr_eq(&current.component, &next.component),
            _ => false,
        };
        if same && tr.plan == Some(TransitionPlan::Replace) {
            LifecycleFlags::FROM_ROUTER | LifecycleFlags::RELOAD
        } else {
            LifecycleFlags::FROM_ROUTER
        }
    }

    /// Move the hydrated component into the viewport and activate it.
    ///
    /// When the viewport itself is not active yet, the component is only
    /// attached; the viewport activates it from its `attaching` hook.
    fn activate(&self, initiator: Option<&Controller>, flags: LifecycleFlags) -> LifecycleFuture {
        let Some(viewport) = self.viewport() else {
            return settled();
        };
        let next = self
            .with_update(|update| {
                if update.activated {
                    return None;
                }
                update.activated = true;
                update.next.clone()
            })
            .flatten();
        let Some(next) = next else {
            return settled();
        };
        if let Some(host) = viewport.host() {
            host.append_child(&next.host);
        }
        *self.0.current.borrow_mut() = Some(next.clone());
        if !viewport.is_active() {
            tracing::trace!(viewport = %self.0.name, "viewport inactive, deferring activation");
            return settled();
        }
        self.activate_mounted(&next, initiator, &viewport, flags)
    }

    fn activate_mounted(
        &self,
        mounted: &Mounted,
        initiator: Option<&Controller>,
        viewport: &Controller,
        flags: LifecycleFlags,
    ) -> LifecycleFuture {
        let initiator = initiator.cloned().unwrap_or_else(|| mounted.controller.clone());
        match mounted.controller.activate(&initiator, Some(viewport), flags, None) {
            Ok(activation) => {
                let agent = self.clone();
                async move {
                    let result = activation.await;
                    if result.is_err() {
                        agent.discard_current();
                    }
                    result
                }
                .boxed_local()
            }
            Err(err) => {
                self.discard_current();
                future::ready(Err(err)).boxed_local()
            }
        }
    }

    fn discard_current(&self) {
        let mounted = self.0.current.borrow_mut().take();
        if let Some(mounted) = mounted {
            tracing::debug!(viewport = %self.0.name, component = mounted.component.name(), "discarding component");
            mounted.host.remove();
            mounted.controller.dispose();
        }
    }

    /// Take the current component out of the viewport.
    ///
    /// The controller is released, so it is disposed as soon as its
    /// deactivation completes, including when it joins an enclosing batch.
    fn deactivate(&self, initiator: Option<&Controller>, flags: LifecycleFlags) -> LifecycleFuture {
        let mounted = self.0.current.borrow_mut().take();
        let Some(mounted) = mounted else {
            return settled();
        };
        mounted.host.remove();
        let controller = mounted.controller;
        if !controller.state().contains(State::ACTIVATED) {
            controller.dispose();
            return settled();
        }
        controller.release();
        let viewport = self.viewport();
        let initiator = initiator.cloned().unwrap_or_else(|| controller.clone());
        match controller.deactivate(&initiator, viewport.as_ref(), flags) {
            Ok(deactivation) => deactivation,
            Err(err) => {
                controller.dispose();
                future::ready(Err(err)).boxed_local()
            }
        }
    }

    /// Called from the viewport's `attaching` hook.
    pub(crate) fn activate_from_viewport(&self, initiator: &Controller, flags: LifecycleFlags) -> LifecycleFuture {
        let pending = self
            .0
            .update
            .borrow()
            .as_ref()
            .is_some_and(|update| !update.activated && update.next.is_some());
        if pending {
            return self.activate(Some(initiator), flags);
        }
        let (Some(current), Some(viewport)) = (self.current(), self.viewport()) else {
            return settled();
        };
        if current.controller.is_active() {
            return settled();
        }
        self.activate_mounted(&current, Some(initiator), &viewport, flags)
    }

    /// Called from the viewport's `detaching` hook; joins the batch of
    /// `initiator`.
    pub(crate) fn deactivate_from_viewport(&self, initiator: &Controller, flags: LifecycleFlags) -> LifecycleFuture {
        self.deactivate(Some(initiator), flags)
    }

    /// Called when the viewport is disposed.
    pub(crate) fn detach_viewport(&self) {
        self.0.viewport.borrow_mut().take();
        self.discard_current();
    }

    /// Drop the transition state of this subtree.  On cancellation the
    /// components hydrated for it are disposed unseen.
    pub(crate) fn end_transition(&self, completed: bool) {
        let update = self.0.update.borrow_mut().take();
        let Some(update) = update else {
            return;
        };
        for agent in update.children.iter().chain(&update.removed) {
            agent.end_transition(completed);
        }
        if let Some(next) = update.next {
            if !update.activated {
                tracing::debug!(viewport = %self.0.name, component = next.component.name(), "dropping hydrated component");
                next.controller.dispose();
            }
        }
        if completed && matches!(update.plan, Some(Plan::Keep | Plan::ReInvoke)) {
            if let (Some(resolution), Some(current)) = (update.resolution, self.0.current.borrow_mut().as_mut()) {
                current.node = resolution.node(&self.0.name);
            }
        }
    }
}

impl fmt::Debug for ViewportAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportAgent")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("current", &self.current_component())
            .finish()
    }
}
