//! The `<viewport>` custom element.
//!
//! Attributes:
//!
//! | Attribute | Meaning |
//! |-----------|---------|
//! | `name` | viewport name used by `@name` instructions, `default` when absent |
//! | `default` | instruction loaded when a navigation leaves the viewport empty |
//! | `fallback` | component substituted for unresolvable paths |

use crate::context::RouteContext;
use crate::viewport_agent::ViewportAgent;
use std::rc::Rc;
use trellis_core::{ComponentContext, ComponentDefinition, HookContext, HookError, HookResult, Hooks, ViewModel};

pub const VIEWPORT_ELEMENT: &str = "viewport";

/// Definition of the `<viewport>` element.  [`Router::new`](crate::Router::new)
/// registers it in the application container.
pub fn definition() -> Rc<ComponentDefinition> {
    ComponentDefinition::element(VIEWPORT_ELEMENT)
        .view_model(Viewport::from_context)
        .build()
}

struct Viewport {
    name: String,
    default: Option<String>,
    fallback: Option<String>,
    context: Option<RouteContext>,
    agent: Option<ViewportAgent>,
}

impl Viewport {
    fn from_context(ctx: &ComponentContext) -> Self {
        Self {
            name: ctx.host.attribute("name").unwrap_or_else(|| "default".to_owned()),
            default: ctx.host.attribute("default"),
            fallback: ctx.host.attribute("fallback"),
            context: ctx.container.get::<RouteContext>().map(|context| (*context).clone()),
            agent: None,
        }
    }
}

impl ViewModel for Viewport {
    fn hooks() -> Hooks {
        Hooks::CREATED | Hooks::ATTACHING | Hooks::DETACHING | Hooks::DISPOSE
    }

    fn created(&mut self, ctx: &HookContext) {
        let Some(context) = &self.context else {
            tracing::warn!(viewport = %self.name, "viewport outside of a routing context is ignored");
            return;
        };
        let agent = ViewportAgent::new(
            self.name.clone(),
            self.default.clone(),
            self.fallback.clone(),
            ctx.controller.clone(),
        );
        context.register_agent(agent.clone());
        self.agent = Some(agent);
    }

    fn attaching(&mut self, ctx: &HookContext) -> HookResult {
        let Some(agent) = &self.agent else {
            return HookResult::done();
        };
        let activation = agent.activate_from_viewport(&ctx.initiator, ctx.flags);
        HookResult::pending(async move { activation.await.map_err(HookError::from) })
    }

    fn detaching(&mut self, ctx: &HookContext) -> HookResult {
        let Some(agent) = &self.agent else {
            return HookResult::done();
        };
        let deactivation = agent.deactivate_from_viewport(&ctx.initiator, ctx.flags);
        HookResult::pending(async move { deactivation.await.map_err(HookError::from) })
    }

    fn dispose(&mut self) {
        if let (Some(context), Some(agent)) = (&self.context, self.agent.take()) {
            context.unregister_agent(&agent);
            agent.detach_viewport();
        }
    }
}
