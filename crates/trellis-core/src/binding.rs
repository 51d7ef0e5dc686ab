use crate::scope::Scope;
use crate::state::LifecycleFlags;

/// A connection between a scope and the rendered view.
///
/// The controller binds its bindings synchronously between `binding` and
/// `bound`, and unbinds them after `unbinding`.
pub trait Binding {
    fn bind(&mut self, flags: LifecycleFlags, scope: &Scope);
    fn unbind(&mut self, flags: LifecycleFlags);
    fn is_bound(&self) -> bool;
}

type BindFn = Box<dyn FnMut(&Scope)>;
type UnbindFn = Box<dyn FnMut()>;

/// A [`Binding`] backed by two closures.
pub struct CallbackBinding {
    on_bind: BindFn,
    on_unbind: UnbindFn,
    bound: bool,
}

impl CallbackBinding {
    pub fn new(on_bind: impl FnMut(&Scope) + 'static, on_unbind: impl FnMut() + 'static) -> Self {
        Self {
            on_bind: Box::new(on_bind),
            on_unbind: Box::new(on_unbind),
            bound: false,
        }
    }
}

impl Binding for CallbackBinding {
    fn bind(&mut self, _flags: LifecycleFlags, scope: &Scope) {
        if !self.bound {
            (self.on_bind)(scope);
            self.bound = true;
        }
    }

    fn unbind(&mut self, _flags: LifecycleFlags) {
        if self.bound {
            (self.on_unbind)();
            self.bound = false;
        }
    }

    fn is_bound(&self) -> bool {
        self.bound
    }
}
