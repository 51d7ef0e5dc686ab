use crate::container::Container;
use crate::controller::Controller;
use crate::template::{compile_template, CompiledTemplate, Template};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Creates synthetic views from a template and keeps released ones for
/// reuse.
///
/// A view released before it deactivates is returned here once it has
/// unbound, as long as the cache has room; otherwise it is disposed.
pub struct ViewFactory {
    name: String,
    container: Container,
    compiled: CompiledTemplate,
    cache_size: Cell<usize>,
    cache: RefCell<Vec<Controller>>,
}

impl ViewFactory {
    pub fn new(name: impl Into<String>, template: &Template, container: Container) -> Rc<Self> {
        let compiled = compile_template(template, &container);
        Rc::new(Self {
            name: name.into(),
            container,
            compiled,
            cache_size: Cell::new(0),
            cache: RefCell::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn container(&self) -> &Container {
        &self.container
    }

    pub(crate) fn compiled(&self) -> &CompiledTemplate {
        &self.compiled
    }

    /// Limit the number of cached views, disposing any excess.
    pub fn set_cache_size(&self, size: usize) {
        self.cache_size.set(size);
        let excess: Vec<Controller> = {
            let mut cache = self.cache.borrow_mut();
            let keep = cache.len().min(size);
            cache.drain(keep..).collect()
        };
        for view in excess {
            view.dispose();
        }
    }

    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }

    /// A cached view if one is available, otherwise a freshly rendered one.
    pub fn create(self: &Rc<Self>) -> Controller {
        let cached = self.cache.borrow_mut().pop();
        match cached {
            Some(view) => {
                view.reclaim();
                tracing::trace!(view = %self.name, id = view.id(), "reusing cached view");
                view
            }
            None => Controller::for_view(self),
        }
    }

    pub(crate) fn try_return_to_cache(&self, view: &Controller) -> bool {
        let mut cache = self.cache.borrow_mut();
        if cache.len() < self.cache_size.get() {
            cache.push(view.clone());
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::HostNode;
    use crate::scope::Scope;
    use crate::state::{LifecycleFlags, State};
    use crate::template::TemplateNode;
    use crate::LifecycleError;

    fn row_factory() -> Rc<ViewFactory> {
        let template = Template::new([TemplateNode::element("li").child(TemplateNode::text("row"))]);
        ViewFactory::new("row", &template, Container::new())
    }

    #[tokio::test]
    async fn synthetic_view_requires_scope() {
        let factory = row_factory();
        let view = factory.create();
        let err = view.activate(&view, None, LifecycleFlags::empty(), None).err();
        assert!(matches!(err, Some(LifecycleError::MissingScope { .. })));
    }

    #[tokio::test]
    async fn view_mounts_into_its_location() {
        let factory = row_factory();
        let list = HostNode::element("ul");
        let view = factory.create();
        view.set_host(list.clone());

        view.activate(&view, None, LifecycleFlags::empty(), Some(Scope::new()))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(list.to_markup(), "<ul><li>row</li></ul>");

        view.deactivate(&view, None, LifecycleFlags::empty()).unwrap().await.unwrap();
        assert_eq!(list.to_markup(), "<ul></ul>");
    }

    #[tokio::test]
    async fn released_view_returns_to_cache_when_room() {
        let factory = row_factory();
        factory.set_cache_size(1);
        let view = factory.create();
        view.activate(&view, None, LifecycleFlags::empty(), Some(Scope::new()))
            .unwrap()
            .await
            .unwrap();

        view.release();
        view.deactivate(&view, None, LifecycleFlags::empty()).unwrap().await.unwrap();
        assert_eq!(factory.cached(), 1);
        assert_eq!(view.state(), State::DEACTIVATED | State::RELEASED);

        let reused = factory.create();
        assert!(reused.ptr_eq(&view));
        assert_eq!(reused.state(), State::DEACTIVATED);
        assert_eq!(factory.cached(), 0);
    }

    #[tokio::test]
    async fn released_view_is_disposed_when_cache_is_full() {
        let factory = row_factory();
        let view = factory.create();
        view.activate(&view, None, LifecycleFlags::empty(), Some(Scope::new()))
            .unwrap()
            .await
            .unwrap();

        view.release();
        view.deactivate(&view, None, LifecycleFlags::empty()).unwrap().await.unwrap();
        assert!(view.state().is_disposed());
        assert_eq!(factory.cached(), 0);
    }
}
