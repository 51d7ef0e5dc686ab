//! Hierarchical dependency container.
//!
//! Each hydrated component receives a child container, so registrations
//! made on behalf of one component are visible to its descendants but not
//! to its siblings.

use crate::definition::ComponentDefinition;
use crate::error::ContainerError;
use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    static NEXT_CONTAINER_ID: Cell<u64> = const { Cell::new(1) };
}

struct ContainerData {
    id: u64,
    parent: Option<Container>,
    instances: RefCell<HashMap<TypeId, Vec<Rc<dyn Any>>>>,
    components: RefCell<HashMap<String, Rc<ComponentDefinition>>>,
}

/// Shared handle to a container.
#[derive(Clone)]
pub struct Container(Rc<ContainerData>);

/// Non-owning handle to a [`Container`].
#[derive(Clone, Default)]
pub struct WeakContainer(Weak<ContainerData>);

impl Container {
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    fn with_parent(parent: Option<Container>) -> Self {
        let id = NEXT_CONTAINER_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Container(Rc::new(ContainerData {
            id,
            parent,
            instances: RefCell::new(HashMap::new()),
            components: RefCell::new(HashMap::new()),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// A container that resolves from `self` when it has no own registration.
    pub fn create_child(&self) -> Container {
        Self::with_parent(Some(self.clone()))
    }

    pub fn parent(&self) -> Option<&Container> {
        self.0.parent.as_ref()
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer(Rc::downgrade(&self.0))
    }

    /// Register an instance.  Later registrations of the same type shadow
    /// earlier ones for [`get`](Container::get).
    pub fn register<T: Any>(&self, value: T) -> Rc<T> {
        let value = Rc::new(value);
        self.register_rc(value.clone());
        value
    }

    pub fn register_rc<T: Any>(&self, value: Rc<T>) {
        self.0
            .instances
            .borrow_mut()
            .entry(TypeId::of::<T>())
            .or_default()
            .push(value);
    }

    /// The nearest registration of `T`, searching this container first.
    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        let own = self
            .0
            .instances
            .borrow()
            .get(&TypeId::of::<T>())
            .and_then(|values| values.last().cloned());
        match own {
            Some(value) => value.downcast::<T>().ok(),
            None => self.0.parent.as_ref().and_then(|parent| parent.get::<T>()),
        }
    }

    /// Like [`get`](Container::get) but fails with [`ContainerError::Missing`].
    pub fn require<T: Any>(&self) -> Result<Rc<T>, ContainerError> {
        self.get::<T>().ok_or(ContainerError::Missing {
            type_name: type_name::<T>(),
        })
    }

    /// Every registration of `T` in this container and its ancestors,
    /// nearest first.
    pub fn get_all<T: Any>(&self) -> Vec<Rc<T>> {
        let mut out: Vec<Rc<T>> = self
            .0
            .instances
            .borrow()
            .get(&TypeId::of::<T>())
            .map(|values| {
                values
                    .iter()
                    .rev()
                    .filter_map(|value| value.clone().downcast::<T>().ok())
                    .collect()
            })
            .unwrap_or_default();
        if let Some(parent) = &self.0.parent {
            out.extend(parent.get_all::<T>());
        }
        out
    }

    /// Whether `T` is registered in this container itself.
    pub fn has_own<T: Any>(&self) -> bool {
        self.0
            .instances
            .borrow()
            .get(&TypeId::of::<T>())
            .is_some_and(|values| !values.is_empty())
    }

    /// Make a component available to templates compiled in this container.
    pub fn register_component(&self, definition: Rc<ComponentDefinition>) {
        self.0
            .components
            .borrow_mut()
            .insert(definition.name().to_ascii_lowercase(), definition);
    }

    /// Look up a component by its (case-insensitive) name.
    pub fn find_component(&self, name: &str) -> Option<Rc<ComponentDefinition>> {
        let own = self
            .0
            .components
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned();
        own.or_else(|| {
            self.0
                .parent
                .as_ref()
                .and_then(|parent| parent.find_component(name))
        })
    }

    pub fn require_component(&self, name: &str) -> Result<Rc<ComponentDefinition>, ContainerError> {
        self.find_component(name)
            .ok_or_else(|| ContainerError::UnknownComponent(name.to_owned()))
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.0.id)
            .field("parent", &self.0.parent.as_ref().map(Container::id))
            .finish()
    }
}

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(Container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Greeting(&'static str);

    #[test]
    fn child_resolves_from_parent() {
        let root = Container::new();
        root.register(Greeting("hello"));
        let child = root.create_child();
        assert_eq!(child.get::<Greeting>().as_deref(), Some(&Greeting("hello")));
        assert!(!child.has_own::<Greeting>());
    }

    #[test]
    fn child_registrations_do_not_leak_to_siblings() {
        let root = Container::new();
        let left = root.create_child();
        let right = root.create_child();
        left.register(Greeting("left"));
        assert!(right.get::<Greeting>().is_none());
        assert!(root.get::<Greeting>().is_none());
    }

    #[test]
    fn get_all_lists_nearest_first() {
        let root = Container::new();
        root.register(Greeting("root"));
        let child = root.create_child();
        child.register(Greeting("one"));
        child.register(Greeting("two"));

        let all: Vec<_> = child.get_all::<Greeting>().iter().map(|g| g.0).collect();
        assert_eq!(all, vec!["two", "one", "root"]);
        assert_eq!(child.get::<Greeting>().map(|g| g.0), Some("two"));
    }

    #[test]
    fn require_reports_missing_type() {
        let container = Container::new();
        let err = container.require::<Greeting>().unwrap_err();
        assert!(err.to_string().contains("Greeting"));
    }

    #[test]
    fn components_are_found_case_insensitively() {
        let root = Container::new();
        root.register_component(ComponentDefinition::element("Nav-Bar").build());
        let child = root.create_child();
        assert!(child.find_component("nav-bar").is_some());
        assert!(child.require_component("footer").is_err());
    }
}
