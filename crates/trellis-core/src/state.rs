use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Lifecycle state of a [`Controller`](crate::Controller).
    ///
    /// The flags are independent so that a controller can be both
    /// `DEACTIVATED` and `RELEASED`.  The empty set is the initial "none"
    /// state of a freshly hydrated controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct State: u8 {
        const ACTIVATING = 1 << 0;
        const ACTIVATED = 1 << 1;
        const DEACTIVATING = 1 << 2;
        const DEACTIVATED = 1 << 3;
        const RELEASED = 1 << 4;
        const DISPOSED = 1 << 5;
    }
}

impl State {
    /// Flags that mark a lifecycle operation as in flight.
    pub const TRANSIENT: State = State::ACTIVATING.union(State::DEACTIVATING);

    /// `true` while activating or activated.
    pub fn is_active(self) -> bool {
        self.intersects(State::ACTIVATING | State::ACTIVATED)
    }

    pub fn is_disposed(self) -> bool {
        self.contains(State::DISPOSED)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(&name.to_ascii_lowercase())?;
            first = false;
        }
        Ok(())
    }
}

bitflags! {
    /// Strategy bits propagated through an activation or deactivation batch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LifecycleFlags: u8 {
        /// The batch was started by a router transition.
        const FROM_ROUTER = 1 << 0;
        /// The batch belongs to a forced reload of an unchanged component.
        const RELOAD = 1 << 1;
        /// The batch is part of application teardown.
        const TEARDOWN = 1 << 2;
    }
}

/// The kind of view-model a controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmKind {
    CustomElement,
    CustomAttribute,
    /// A view created from a [`ViewFactory`](crate::ViewFactory) without a
    /// view-model of its own.
    Synthetic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_lowercase_flags() {
        assert_eq!(State::empty().to_string(), "none");
        assert_eq!(State::ACTIVATED.to_string(), "activated");
        assert_eq!(
            (State::DEACTIVATED | State::RELEASED).to_string(),
            "deactivated|released"
        );
    }

    #[test]
    fn transient_flags_are_active_or_leaving() {
        assert!(State::ACTIVATING.is_active());
        assert!(!State::DEACTIVATING.is_active());
        assert!(State::TRANSIENT.contains(State::DEACTIVATING));
    }
}
