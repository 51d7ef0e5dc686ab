//! Viewport router for the **trellis** framework.
//!
//! Routing components declare route tables; their templates contain
//! `<viewport>` elements.  A navigation parses an instruction such as
//! `users/42+side@aside`, recognizes it level by level against the route
//! tables and loads the matched components into the viewports, running
//! the routing hooks of every affected component in a fixed order.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Router`] | Serializes navigations and owns the active [`RouteTree`] |
//! | [`RouteConfig`] | One route of a component's table, attached with [`Routable`] |
//! | [`RouteRecognizer`] | Segment trie matching paths to routes |
//! | [`InstructionTree`] | Parsed form of a navigation instruction |
//! | [`RouteContext`] | Routing state of one routing component |
//! | [`ViewportAgent`] | Router-side state of one `<viewport>` |
//! | [`NavigationEvent`] | Progress notifications from [`Router::events`] |
//!
//! # Transition phases
//!
//! 1. `can_unload`, deepest components first.  A `false` keeps the
//!    current tree.
//! 2. `can_load`, outermost first.  Incoming components are hydrated
//!    here.
//! 3. Point of no return.  Later navigations are rejected until this one
//!    settles.
//! 4. `unloading`, deepest first, then `loading`, outermost first.
//! 5. The outgoing components deactivate, then the incoming ones
//!    activate.
//!
//! Every phase completes for the whole tree before the next begins.  When
//! a phase fails, the previous tree is loaded again unless
//! [`RouterOptions::restore_previous_route_tree_on_error`] is off.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod instruction;
pub mod recognizer;
pub mod route_tree;
pub mod router;
mod transition;
pub mod viewport;
pub mod viewport_agent;

pub use config::{Routable, RouteConfig, RouteDefinition, TransitionPlan};
pub use context::RouteContext;
pub use error::{ExpressionError, RecognizerError, RouterError};
pub use events::NavigationEvent;
pub use instruction::{InstructionTree, ViewportInstruction};
pub use recognizer::{RecognizedRoute, RouteRecognizer};
pub use route_tree::{RouteNode, RouteTree};
pub use router::{HistoryEntry, HistoryStrategy, NavigationOptions, NavigationOutcome, Router, RouterOptions};
pub use viewport_agent::ViewportAgent;
