use crate::container::Container;
use crate::hooks::Hooks;
use crate::node::HostNode;
use crate::template::Template;
use crate::view_model::{EmptyViewModel, ViewModel};
use std::any::{Any, TypeId};
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

thread_local! {
    static NEXT_DEFINITION_ID: Cell<u64> = const { Cell::new(1) };
}

/// Identity of a [`ComponentDefinition`], used as the template cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionKind {
    Element,
    Attribute,
}

/// What a view-model factory receives when a component is hydrated.
pub struct ComponentContext {
    /// The component's own child container.
    pub container: Container,
    /// The element hosting the component.
    pub host: HostNode,
    pub definition: Rc<ComponentDefinition>,
}

type Factory = Rc<dyn Fn(&ComponentContext) -> Box<dyn ViewModel>>;

/// Static description of a custom element or custom attribute.
///
/// Built once with [`ComponentDefinition::element`] or
/// [`ComponentDefinition::attribute`] and shared as `Rc<ComponentDefinition>`.
///
/// # Example
///
/// ```rust,ignore
/// let card = ComponentDefinition::element("user-card")
///     .view_model(|_ctx| UserCard::default())
///     .template(Template::new([TemplateNode::element("h2").child(TemplateNode::text("User"))]))
///     .build();
/// ```
pub struct ComponentDefinition {
    id: DefinitionId,
    name: String,
    kind: DefinitionKind,
    template: Option<Template>,
    hooks: Hooks,
    factory: Factory,
    dependencies: Vec<Rc<ComponentDefinition>>,
    metadata: HashMap<TypeId, Rc<dyn Any>>,
}

impl ComponentDefinition {
    pub fn element(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name.into(), DefinitionKind::Element)
    }

    pub fn attribute(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder::new(name.into(), DefinitionKind::Attribute)
    }

    pub fn id(&self) -> DefinitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// The hooks the controller may invoke on this component's view-model.
    pub fn hooks(&self) -> Hooks {
        self.hooks
    }

    /// Components registered into this component's container on hydration.
    pub fn dependencies(&self) -> &[Rc<ComponentDefinition>] {
        &self.dependencies
    }

    /// Metadata attached by extensions such as the router.
    pub fn metadata<T: Any>(&self) -> Option<Rc<T>> {
        self.metadata
            .get(&TypeId::of::<T>())
            .and_then(|value| value.clone().downcast::<T>().ok())
    }

    pub(crate) fn create_view_model(&self, context: &ComponentContext) -> Box<dyn ViewModel> {
        (self.factory)(context)
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`ComponentDefinition::element`] and
/// [`ComponentDefinition::attribute`].
pub struct DefinitionBuilder {
    name: String,
    kind: DefinitionKind,
    template: Option<Template>,
    hooks: Hooks,
    factory: Factory,
    dependencies: Vec<Rc<ComponentDefinition>>,
    metadata: HashMap<TypeId, Box<dyn Any>>,
}

impl DefinitionBuilder {
    fn new(name: String, kind: DefinitionKind) -> Self {
        Self {
            name,
            kind,
            template: None,
            hooks: Hooks::empty(),
            factory: Rc::new(|_| Box::new(EmptyViewModel)),
            dependencies: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Set the view-model factory.  Also adopts `V::hooks()` as the
    /// capability set; call [`hooks`](Self::hooks) afterwards to override it.
    pub fn view_model<V, F>(mut self, factory: F) -> Self
    where
        V: ViewModel,
        F: Fn(&ComponentContext) -> V + 'static,
    {
        self.hooks = V::hooks();
        self.factory = Rc::new(move |context| Box::new(factory(context)));
        self
    }

    /// Like [`view_model`](Self::view_model) for factories that already box
    /// their view-model.  The capability set must be given explicitly.
    pub fn boxed_view_model<F>(mut self, hooks: Hooks, factory: F) -> Self
    where
        F: Fn(&ComponentContext) -> Box<dyn ViewModel> + 'static,
    {
        self.hooks = hooks;
        self.factory = Rc::new(factory);
        self
    }

    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    pub fn dependency(mut self, definition: Rc<ComponentDefinition>) -> Self {
        self.dependencies.push(definition);
        self
    }

    /// Edit the metadata of type `T`, inserting `T::default()` first if needed.
    pub fn with_metadata<T, F>(mut self, edit: F) -> Self
    where
        T: Any + Default,
        F: FnOnce(&mut T),
    {
        let slot = self
            .metadata
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()));
        if let Some(value) = slot.downcast_mut::<T>() {
            edit(value);
        }
        self
    }

    pub fn build(self) -> Rc<ComponentDefinition> {
        let id = NEXT_DEFINITION_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            DefinitionId(id)
        });
        Rc::new(ComponentDefinition {
            id,
            name: self.name,
            kind: self.kind,
            template: self.template,
            hooks: self.hooks,
            factory: self.factory,
            dependencies: self.dependencies,
            metadata: self
                .metadata
                .into_iter()
                .map(|(key, value)| (key, Rc::from(value)))
                .collect(),
        })
    }
}
