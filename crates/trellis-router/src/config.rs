//! Route tables attached to routing components.
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis_router::{RouteConfig, Routable};
//!
//! let shell = ComponentDefinition::element("shell")
//!     .template(Template::new([TemplateNode::element("viewport")]))
//!     .routes([
//!         RouteConfig::new(home.clone()).paths(["", "home"]).title("Home"),
//!         RouteConfig::new(user.clone()).path("users/:id"),
//!         RouteConfig::redirect("start", "home"),
//!     ])
//!     .fallback("not-found")
//!     .build();
//! ```

use std::rc::Rc;
use trellis_core::{ComponentDefinition, DefinitionBuilder};

/// How a viewport treats a navigation that resolves to the component it
/// already shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// Dispose the current instance and load a fresh one.
    Replace,
    /// Keep the instance and run the routing hooks on it again.
    InvokeLifecycles,
    /// Keep the instance untouched.
    None,
}

/// One entry of a route table.
#[derive(Debug, Clone)]
pub struct RouteConfig {
    id: Option<String>,
    paths: Vec<String>,
    component: Option<Rc<ComponentDefinition>>,
    redirect_to: Option<String>,
    title: Option<String>,
    viewport: Option<String>,
    case_sensitive: bool,
    transition_plan: Option<TransitionPlan>,
}

impl RouteConfig {
    /// A route to `component`, reachable under the component's name until
    /// [`path`](Self::path) or [`paths`](Self::paths) is called.
    pub fn new(component: Rc<ComponentDefinition>) -> Self {
        Self {
            id: None,
            paths: Vec::new(),
            component: Some(component),
            redirect_to: None,
            title: None,
            viewport: None,
            case_sensitive: false,
            transition_plan: None,
        }
    }

    /// A route that rewrites `path` to `target` before recognition
    /// continues.
    pub fn redirect(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            paths: vec![path.into()],
            component: None,
            redirect_to: Some(target.into()),
            title: None,
            viewport: None,
            case_sensitive: false,
            transition_plan: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Prefer the viewport with this name when the instruction does not
    /// name one.
    pub fn viewport(mut self, viewport: impl Into<String>) -> Self {
        self.viewport = Some(viewport.into());
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn transition_plan(mut self, plan: TransitionPlan) -> Self {
        self.transition_plan = Some(plan);
        self
    }

    /// The explicit id, else the first path, else the component name.
    pub fn route_id(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.paths.first().cloned())
            .or_else(|| self.component.as_ref().map(|c| c.name().to_owned()))
            .unwrap_or_default()
    }

    /// The patterns this route is registered under.
    pub fn patterns(&self) -> Vec<String> {
        if self.paths.is_empty() {
            self.component
                .as_ref()
                .map(|c| vec![c.name().to_owned()])
                .unwrap_or_default()
        } else {
            self.paths.clone()
        }
    }

    pub fn component(&self) -> Option<&Rc<ComponentDefinition>> {
        self.component.as_ref()
    }

    pub fn redirect_to(&self) -> Option<&str> {
        self.redirect_to.as_deref()
    }

    pub fn route_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn preferred_viewport(&self) -> Option<&str> {
        self.viewport.as_deref()
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn plan(&self) -> Option<TransitionPlan> {
        self.transition_plan
    }
}

/// The routing metadata of a component: its child routes and the
/// component substituted for unmatched segments.
#[derive(Debug, Clone, Default)]
pub struct RouteDefinition {
    pub routes: Vec<RouteConfig>,
    pub fallback: Option<String>,
}

impl RouteDefinition {
    /// The routing metadata of `definition`, empty when none was attached.
    pub fn of(definition: &ComponentDefinition) -> Rc<RouteDefinition> {
        definition
            .metadata::<RouteDefinition>()
            .unwrap_or_default()
    }
}

/// Attach routes to a component definition.
pub trait Routable: Sized {
    fn routes(self, routes: impl IntoIterator<Item = RouteConfig>) -> Self;

    fn fallback(self, component: impl Into<String>) -> Self;
}

impl Routable for DefinitionBuilder {
    fn routes(self, routes: impl IntoIterator<Item = RouteConfig>) -> Self {
        self.with_metadata::<RouteDefinition, _>(|definition| definition.routes.extend(routes))
    }

    fn fallback(self, component: impl Into<String>) -> Self {
        let component = component.into();
        self.with_metadata::<RouteDefinition, _>(|definition| definition.fallback = Some(component))
    }
}
