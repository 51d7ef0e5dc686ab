//! Routing contexts: one per routing component.
//!
//! A [`RouteContext`] pairs a component definition with the recognizer
//! built from its route table and the viewport agents registered by the
//! `<viewport>` elements in its template.  The router owns the root
//! context; every routed component gets a child context registered in its
//! own container, which is how nested viewports find the routes they
//! resolve against.

use crate::config::{RouteConfig, RouteDefinition, TransitionPlan};
use crate::error::RouterError;
use crate::instruction::{InstructionTree, ViewportInstruction};
use crate::recognizer::RouteRecognizer;
use crate::route_tree::RouteNode;
use crate::viewport_agent::ViewportAgent;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use trellis_core::{ComponentDefinition, Container, Params, WeakContainer};

/// The outcome of recognizing one instruction at one level.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub(crate) component: Rc<ComponentDefinition>,
    pub(crate) pattern: String,
    pub(crate) path: String,
    pub(crate) params: Params,
    pub(crate) title: Option<String>,
    pub(crate) plan: Option<TransitionPlan>,
    pub(crate) explicit_viewport: bool,
    /// Instructions for the viewports of the resolved component.
    pub(crate) children: Vec<ViewportInstruction>,
    /// The instruction as requested, before redirects.
    pub(crate) source: ViewportInstruction,
}

impl Resolution {
    pub(crate) fn node(&self, viewport: &str) -> RouteNode {
        RouteNode {
            component: self.component.name().to_owned(),
            pattern: self.pattern.clone(),
            path: self.path.clone(),
            params: self.params.clone(),
            viewport: viewport.to_owned(),
            explicit_viewport: self.explicit_viewport,
            title: self.title.clone(),
            instruction: self.source.clone(),
            children: Vec::new(),
        }
    }
}

struct ContextData {
    definition: Rc<ComponentDefinition>,
    routes: Rc<RouteDefinition>,
    recognizer: RouteRecognizer<usize>,
    container: WeakContainer,
    parent: Weak<ContextData>,
    agents: RefCell<Vec<ViewportAgent>>,
}

/// Routing state of one routing component.
#[derive(Clone)]
pub struct RouteContext(Rc<ContextData>);

impl RouteContext {
    /// Build the context of `definition`, whose own container is
    /// `container`.  Route components are registered into `container`.
    pub fn new(
        definition: Rc<ComponentDefinition>,
        container: &Container,
        parent: Option<&RouteContext>,
    ) -> Result<RouteContext, RouterError> {
        let routes = RouteDefinition::of(&definition);
        let mut recognizer = RouteRecognizer::new();
        for (index, route) in routes.routes.iter().enumerate() {
            for pattern in route.patterns() {
                recognizer.add(&pattern, index, route.is_case_sensitive())?;
            }
            if let Some(component) = route.component() {
                container.register_component(component.clone());
            }
        }
        tracing::trace!(
            context = definition.name(),
            routes = routes.routes.len(),
            "created route context"
        );
        Ok(RouteContext(Rc::new(ContextData {
            definition,
            routes,
            recognizer,
            container: container.downgrade(),
            parent: parent.map(|parent| Rc::downgrade(&parent.0)).unwrap_or_default(),
            agents: RefCell::new(Vec::new()),
        })))
    }

    pub fn name(&self) -> &str {
        self.0.definition.name()
    }

    pub fn definition(&self) -> &Rc<ComponentDefinition> {
        &self.0.definition
    }

    pub fn routes(&self) -> &[RouteConfig] {
        &self.0.routes.routes
    }

    pub fn parent(&self) -> Option<RouteContext> {
        self.0.parent.upgrade().map(RouteContext)
    }

    pub fn container(&self) -> Option<Container> {
        self.0.container.upgrade()
    }

    /// Names from the root context down to this one, joined by `/`.
    pub fn path(&self) -> String {
        match self.parent() {
            Some(parent) => format!("{}/{}", parent.path(), self.name()),
            None => self.name().to_owned(),
        }
    }

    /// Viewport agents in registration (document) order.
    pub fn agents(&self) -> Vec<ViewportAgent> {
        self.0.agents.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &RouteContext) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn register_agent(&self, agent: ViewportAgent) {
        tracing::trace!(context = %self.path(), viewport = agent.name(), "registered viewport");
        self.0.agents.borrow_mut().push(agent);
    }

    pub(crate) fn unregister_agent(&self, agent: &ViewportAgent) {
        self.0.agents.borrow_mut().retain(|registered| !registered.ptr_eq(agent));
    }

    /// Assign each instruction of this level to a viewport agent.
    ///
    /// Instructions naming a viewport go there first; the rest go to the
    /// viewport their route prefers, else to the first free one.  Agents
    /// left without an instruction load their `default`.  A level that
    /// received no instruction at all sends the empty path to its first
    /// viewport.
    pub(crate) fn allocate(
        &self,
        instructions: &[ViewportInstruction],
    ) -> Result<Vec<(ViewportAgent, Option<ViewportInstruction>)>, RouterError> {
        let agents = self.agents();
        let mut slots: Vec<Option<ViewportInstruction>> = vec![None; agents.len()];
        let mut unnamed = Vec::new();

        for instruction in instructions {
            let Some(name) = &instruction.viewport else {
                unnamed.push(instruction);
                continue;
            };
            let index = agents
                .iter()
                .position(|agent| agent.name() == name)
                .ok_or_else(|| RouterError::UnknownViewport {
                    viewport: name.clone(),
                    context: self.path(),
                })?;
            if slots[index].is_some() {
                return Err(self.no_free_viewport(instruction));
            }
            slots[index] = Some(instruction.clone());
        }

        for instruction in unnamed {
            let preferred = self
                .preferred_viewport(instruction)
                .and_then(|name| free_slot(&agents, &slots, Some(&name)));
            let index = preferred
                .or_else(|| free_slot(&agents, &slots, None))
                .ok_or_else(|| self.no_free_viewport(instruction))?;
            slots[index] = Some(instruction.clone());
        }

        let mut defaulted = false;
        for (slot, agent) in slots.iter_mut().zip(&agents) {
            if slot.is_none() {
                if let Some(default) = agent.default_instruction()? {
                    *slot = Some(default);
                    defaulted = true;
                }
            }
        }
        if instructions.is_empty() && !defaulted {
            if let Some(first) = slots.first_mut() {
                *first = Some(ViewportInstruction::default());
            }
        }
        Ok(agents.into_iter().zip(slots).collect())
    }

    fn no_free_viewport(&self, instruction: &ViewportInstruction) -> RouterError {
        RouterError::NoFreeViewport {
            instruction: instruction.to_string(),
            context: self.path(),
        }
    }

    fn preferred_viewport(&self, instruction: &ViewportInstruction) -> Option<String> {
        let matched = self.0.recognizer.recognize(&chain_path(instruction))?;
        self.0.routes.routes[*matched.handler]
            .preferred_viewport()
            .map(str::to_owned)
    }

    /// Recognize `instruction` against this level's routes.
    ///
    /// Pure: nothing is hydrated, so the router calls this speculatively
    /// while deciding what a viewport will do.  `Ok(None)` means the
    /// viewport should be empty: the empty path matched no route.
    pub(crate) fn resolve(
        &self,
        instruction: &ViewportInstruction,
        fallback: Option<&str>,
        viewport: &str,
        max_redirects: usize,
    ) -> Result<Option<Resolution>, RouterError> {
        let source = instruction;
        let mut instruction = instruction.clone();
        let mut redirects = 0;
        loop {
            let path = chain_path(&instruction);
            let explicit: Params = instruction
                .chain()
                .iter()
                .flat_map(|link| link.params.clone())
                .collect();

            let Some(matched) = self.0.recognizer.recognize(&path) else {
                if path.is_empty() {
                    return Ok(None);
                }
                return self
                    .resolve_fallback(&instruction, path, explicit, fallback, viewport)
                    .map(|resolution| {
                        resolution.map(|resolution| Resolution {
                            source: source.clone(),
                            ..resolution
                        })
                    });
            };
            let route = &self.0.routes.routes[*matched.handler];

            if let Some(target) = route.redirect_to() {
                redirects += 1;
                if redirects > max_redirects {
                    return Err(RouterError::TooManyRedirects {
                        instruction: path,
                        limit: max_redirects,
                    });
                }
                let rewritten = match &matched.residue {
                    Some(residue) if target.is_empty() => residue.clone(),
                    Some(residue) => format!("{target}/{residue}"),
                    None => target.to_owned(),
                };
                tracing::debug!(context = %self.path(), from = %path, to = %rewritten, "redirecting");
                let leftover = instruction.descend(instruction.chain().len());
                let mut next = InstructionTree::parse(&rewritten)?
                    .children
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                graft(&mut next, leftover);
                next.viewport = instruction.viewport.clone();
                next.params.extend(explicit);
                instruction = next;
                continue;
            }

            let Some(component) = route.component() else {
                return Ok(None);
            };
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let mut params = matched.params.clone();
            params.extend(explicit);
            return Ok(Some(Resolution {
                component: component.clone(),
                pattern: matched.pattern.to_owned(),
                path: segments[..matched.consumed].join("/"),
                params,
                title: route.route_title().map(str::to_owned),
                plan: route.plan(),
                explicit_viewport: instruction.viewport.is_some(),
                children: instruction.descend(matched.consumed),
                source: source.clone(),
            }));
        }
    }

    fn resolve_fallback(
        &self,
        instruction: &ViewportInstruction,
        path: String,
        params: Params,
        fallback: Option<&str>,
        viewport: &str,
    ) -> Result<Option<Resolution>, RouterError> {
        let Some(name) = fallback.or(self.0.routes.fallback.as_deref()) else {
            return Err(RouterError::UnknownRoute {
                path,
                context: self.path(),
                viewport: viewport.to_owned(),
            });
        };
        let component = self
            .find_component(name)
            .ok_or_else(|| RouterError::UnknownComponent(name.to_owned()))?;
        tracing::debug!(context = %self.path(), %path, fallback = name, "using fallback");
        Ok(Some(Resolution {
            component,
            pattern: String::new(),
            path,
            params,
            title: None,
            plan: None,
            explicit_viewport: instruction.viewport.is_some(),
            children: instruction.descend(instruction.chain().len()),
            source: instruction.clone(),
        }))
    }

    /// A component by route path, then by name among the definition's
    /// dependencies and the container's registrations.
    fn find_component(&self, name: &str) -> Option<Rc<ComponentDefinition>> {
        let routed = self
            .0
            .recognizer
            .recognize(name)
            .filter(|matched| matched.residue.is_none())
            .and_then(|matched| self.0.routes.routes[*matched.handler].component().cloned());
        routed
            .or_else(|| {
                self.0
                    .definition
                    .dependencies()
                    .iter()
                    .find(|dependency| dependency.name().eq_ignore_ascii_case(name))
                    .cloned()
            })
            .or_else(|| self.container().and_then(|container| container.find_component(name)))
    }

    /// Whether every instruction is shown by one of this level's agents.
    pub(crate) fn shows(&self, instructions: &[ViewportInstruction], max_redirects: usize) -> bool {
        instructions.iter().all(|instruction| {
            let Ok(Some(resolution)) = self.resolve(instruction, None, "", max_redirects) else {
                return false;
            };
            self.agents().iter().any(|agent| {
                agent.current().is_some_and(|mounted| {
                    Rc::ptr_eq(&mounted.component, &resolution.component)
                        && mounted.node.params == resolution.params
                        && mounted.context.shows(&resolution.children, max_redirects)
                })
            })
        })
    }
}

impl fmt::Debug for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteContext")
            .field("path", &self.path())
            .field("routes", &self.0.routes.routes.len())
            .field("agents", &self.0.agents.borrow().len())
            .finish()
    }
}

fn chain_path(instruction: &ViewportInstruction) -> String {
    instruction
        .chain()
        .iter()
        .map(|link| link.component.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn free_slot(agents: &[ViewportAgent], slots: &[Option<ViewportInstruction>], name: Option<&str>) -> Option<usize> {
    agents
        .iter()
        .zip(slots)
        .position(|(agent, slot)| slot.is_none() && name.is_none_or(|name| agent.name() == name))
}

/// Attach `children` below the end of `target`'s chain when that end has
/// no children of its own.
fn graft(target: &mut ViewportInstruction, children: Vec<ViewportInstruction>) {
    if children.is_empty() {
        return;
    }
    let mut node = target;
    loop {
        if node.children.len() == 1 && node.children[0].viewport.is_none() {
            node = &mut node.children[0];
        } else {
            break;
        }
    }
    if node.children.is_empty() {
        node.children = children;
    }
}
