use crate::container::Container;
use crate::controller::Controller;
use crate::definition::ComponentDefinition;
use crate::error::LifecycleError;
use crate::node::HostNode;
use crate::state::LifecycleFlags;
use crate::template::{DefaultTemplateCompiler, TemplateCompiler};
use std::rc::Rc;

/// An application root: one root component hydrated into a host node.
///
/// Hydration happens in [`App::new`], so anything the root's template
/// needs from the container (a router, shared components) must be
/// registered before the app is created.
///
/// # Example
///
/// ```rust,ignore
/// let container = Container::new();
/// let app = App::new(container, HostNode::element("body"), shell);
/// app.start().await?;
/// // ...
/// app.stop().await?;
/// ```
pub struct App {
    container: Container,
    host: HostNode,
    root: Controller,
}

impl App {
    pub fn new(container: Container, host: HostNode, root: Rc<ComponentDefinition>) -> Self {
        if container.get::<Rc<dyn TemplateCompiler>>().is_none() {
            container.register::<Rc<dyn TemplateCompiler>>(Rc::new(DefaultTemplateCompiler::new()));
        }
        let root = Controller::for_element(root, container.create_child(), host.clone());
        Self {
            container,
            host,
            root,
        }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn host(&self) -> &HostNode {
        &self.host
    }

    pub fn root(&self) -> &Controller {
        &self.root
    }

    /// Activate the root component.
    pub async fn start(&self) -> Result<(), LifecycleError> {
        tracing::debug!(root = %self.root.name(), "starting app");
        self.root
            .activate(&self.root, None, LifecycleFlags::empty(), None)?
            .await
    }

    /// Deactivate and dispose the root component.
    pub async fn stop(&self) -> Result<(), LifecycleError> {
        tracing::debug!(root = %self.root.name(), "stopping app");
        let result = match self.root.deactivate(&self.root, None, LifecycleFlags::TEARDOWN) {
            Ok(deactivation) => deactivation.await,
            Err(err) => Err(err),
        };
        self.root.dispose();
        result
    }
}
