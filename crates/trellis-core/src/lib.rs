//! Component lifecycle core for the **trellis** framework.
//!
//! `trellis-core` hydrates components from their definitions and drives
//! them through a fixed lifecycle.  Each component instance is managed by
//! a [`Controller`] that owns the view-model, the rendered nodes, the
//! bindings and the child controllers found in the template.
//!
//! # Key types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ViewModel`] | Behaviour of a component, with optional lifecycle and routing hooks |
//! | [`Hooks`] | Capability set recording which hooks a view-model implements |
//! | [`ComponentDefinition`] | Static description of a custom element or attribute |
//! | [`Controller`] | Lifecycle state machine for one component instance |
//! | [`Container`] | Hierarchical registrations, one child container per component |
//! | [`TemplateCompiler`] | Turns a definition's [`Template`] into renderer instructions |
//! | [`ViewFactory`] | Creates and caches synthetic views |
//! | [`App`] | Hydrates and starts a root component |
//! | [`HookLog`](testing::HookLog) | Records hook invocations in tests |
//!
//! # Lifecycle
//!
//! 1. **hydrate** -- the view-model is created, the template is compiled
//!    and rendered, child controllers are created, `created` runs.
//! 2. **activate** -- `binding`, bindings bind, `bound`, nodes mount,
//!    `attaching`, children activate, then `attached` once the whole
//!    subtree settled.
//! 3. **deactivate** -- the subtree is enlisted children-first, every
//!    member runs `detaching`, nodes are removed, every member runs
//!    `unbinding`, bindings unbind.
//! 4. **dispose** -- terminal; released controllers that cannot be cached
//!    are disposed automatically after deactivation.
//!
//! Hooks may return a pending future.  Only that branch waits; siblings
//! continue, and a parent's `attached` waits for its whole subtree.

pub mod app;
mod batch;
pub mod binding;
pub mod container;
pub mod controller;
pub mod definition;
pub mod error;
pub mod hooks;
pub mod navigation;
pub mod node;
mod renderer;
pub mod scope;
pub mod state;
pub mod template;
pub mod testing;
pub mod view_factory;
pub mod view_model;

pub use app::App;
pub use binding::{Binding, CallbackBinding};
pub use container::{Container, WeakContainer};
pub use controller::{Controller, GuardVerdict, LifecycleFuture};
pub use definition::{ComponentContext, ComponentDefinition, DefinitionBuilder, DefinitionId, DefinitionKind};
pub use error::{ContainerError, LifecycleError};
pub use hooks::{Guard, GuardResult, HookContext, HookError, HookResult, Hooks};
pub use navigation::{Navigation, Params, RouteSnapshot};
pub use node::{HostNode, NodeKind};
pub use scope::Scope;
pub use state::{LifecycleFlags, State, VmKind};
pub use template::{
    compile_template, CompiledTemplate, DefaultTemplateCompiler, Instruction, Template, TemplateCompiler,
    TemplateNode,
};
pub use view_factory::ViewFactory;
pub use view_model::{EmptyViewModel, ViewModel};
