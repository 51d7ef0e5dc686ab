//! Route data handed to the routing hooks of a view-model.

use std::collections::BTreeMap;

/// Route parameters, keyed by parameter name.
pub type Params = BTreeMap<String, String>;

/// A read-only view of one resolved route segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouteSnapshot {
    /// The route pattern that matched, e.g. `users/:id`.
    pub pattern: String,
    /// The path segments consumed by the match, e.g. `users/42`.
    pub path: String,
    /// Name of the routed component.
    pub component: String,
    pub params: Params,
    pub query: Params,
    pub fragment: Option<String>,
    /// Name of the viewport the component is hosted in.
    pub viewport: String,
    pub title: Option<String>,
}

/// The navigation a routing hook takes part in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Navigation {
    /// Id of the router transition.
    pub id: u64,
    /// The instruction that was requested, in canonical form.
    pub instruction: String,
    /// The segment being loaded into the viewport, if any.
    pub next: Option<RouteSnapshot>,
    /// The segment currently shown in the viewport, if any.
    pub current: Option<RouteSnapshot>,
}
