use std::any::Any;
use std::fmt;
use std::rc::Rc;

struct ScopeData {
    parent: Option<Scope>,
    context: Option<Rc<dyn Any>>,
}

/// Binding context handed to bindings when a controller binds.
///
/// Scopes are compared by identity: activating an already active
/// controller with a different scope handle is an error even when both
/// scopes carry equal data.
#[derive(Clone)]
pub struct Scope(Rc<ScopeData>);

impl Scope {
    /// A root scope without binding context.
    pub fn new() -> Self {
        Scope(Rc::new(ScopeData {
            parent: None,
            context: None,
        }))
    }

    /// A root scope carrying `context`.
    pub fn with_context<T: Any>(context: T) -> Self {
        Scope(Rc::new(ScopeData {
            parent: None,
            context: Some(Rc::new(context)),
        }))
    }

    /// A child scope whose lookups fall back to `self`.
    pub fn child<T: Any>(&self, context: T) -> Self {
        Scope(Rc::new(ScopeData {
            parent: Some(self.clone()),
            context: Some(Rc::new(context)),
        }))
    }

    pub fn parent(&self) -> Option<&Scope> {
        self.0.parent.as_ref()
    }

    /// The nearest binding context of type `T`, searching outwards.
    pub fn get<T: Any>(&self) -> Option<Rc<T>> {
        let own = self
            .0
            .context
            .clone()
            .and_then(|context| context.downcast::<T>().ok());
        own.or_else(|| self.0.parent.as_ref().and_then(|parent| parent.get::<T>()))
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("ptr", &Rc::as_ptr(&self.0))
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_to_parent() {
        let root = Scope::with_context(7_u32);
        let child = root.child(String::from("item"));
        assert_eq!(child.get::<u32>().as_deref(), Some(&7));
        assert_eq!(child.get::<String>().as_deref().map(String::as_str), Some("item"));
        assert!(root.get::<String>().is_none());
    }

    #[test]
    fn scopes_compare_by_identity() {
        let a = Scope::new();
        let b = Scope::new();
        assert!(a.ptr_eq(&a.clone()));
        assert!(!a.ptr_eq(&b));
    }
}
