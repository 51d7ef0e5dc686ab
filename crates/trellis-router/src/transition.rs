use crate::config::TransitionPlan;
use crate::instruction::InstructionTree;
use crate::viewport_agent::ViewportAgent;
use crate::RouterError;
use futures::future::{self, LocalBoxFuture};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use trellis_core::{Controller, Guard, Hooks};

pub(crate) type RouterFuture = LocalBoxFuture<'static, Result<(), RouterError>>;

/// Await every future, then report the first error.
pub(crate) async fn settle(futures: Vec<RouterFuture>) -> Result<(), RouterError> {
    future::join_all(futures).await.into_iter().collect()
}

/// How a transition ended without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Completed,
    Superseded,
    Vetoed { component: String, hook: &'static str },
    Redirected(String),
}

/// One attempt at applying an instruction tree.
///
/// Phases run over the root agents with a barrier between them:
/// `can_unload`, `can_load`, then the commit, `unloading`, `loading` and
/// the swap.  Guards and supersession are only honoured at the barriers
/// before the commit.
pub(crate) struct Transition {
    pub(crate) id: u64,
    pub(crate) tree: InstructionTree,
    /// Forced plan for components that are already shown.
    pub(crate) plan: Option<TransitionPlan>,
    pub(crate) max_redirects: usize,
    committed: Cell<bool>,
    superseded: Cell<bool>,
    interruption: RefCell<Option<Outcome>>,
}

impl Transition {
    pub(crate) fn new(id: u64, tree: InstructionTree, plan: Option<TransitionPlan>, max_redirects: usize) -> Self {
        Self {
            id,
            tree,
            plan,
            max_redirects,
            committed: Cell::new(false),
            superseded: Cell::new(false),
            interruption: RefCell::new(None),
        }
    }

    /// Whether guards still need to be asked.
    pub(crate) fn guards_open(&self) -> bool {
        !self.superseded.get() && self.interruption.borrow().is_none()
    }

    /// Record a guard verdict.  The first veto or redirect wins.
    pub(crate) fn judge(&self, controller: &Controller, hook: Hooks, guard: Guard) {
        let outcome = match guard {
            Guard::Allow => return,
            Guard::Deny => Outcome::Vetoed {
                component: controller.name().to_owned(),
                hook: hook.name(),
            },
            Guard::Redirect(target) => Outcome::Redirected(target),
        };
        let mut interruption = self.interruption.borrow_mut();
        if interruption.is_none() {
            tracing::info!(transition = self.id, component = %controller.name(), hook = hook.name(), ?outcome, "guard interrupted navigation");
            *interruption = Some(outcome);
        }
    }

    pub(crate) fn supersede(&self) {
        self.superseded.set(true);
    }

    pub(crate) fn is_committed(&self) -> bool {
        self.committed.get()
    }

    fn interrupted(&self) -> Option<Outcome> {
        if self.superseded.get() {
            return Some(Outcome::Superseded);
        }
        self.interruption.borrow().clone()
    }

    pub(crate) async fn run(self: &Rc<Self>, agents: &[ViewportAgent]) -> Result<Outcome, RouterError> {
        tracing::debug!(transition = self.id, instruction = %self.tree, "can_unload");
        settle(agents.iter().map(|agent| agent.can_unload(self)).collect()).await?;
        if let Some(outcome) = self.interrupted() {
            return Ok(outcome);
        }

        tracing::debug!(transition = self.id, "can_load");
        settle(agents.iter().map(|agent| agent.can_load(self)).collect()).await?;
        if let Some(outcome) = self.interrupted() {
            return Ok(outcome);
        }

        self.committed.set(true);
        tracing::debug!(transition = self.id, "unloading");
        settle(agents.iter().map(|agent| agent.unloading(self)).collect()).await?;
        tracing::debug!(transition = self.id, "loading");
        settle(agents.iter().map(|agent| agent.loading(self)).collect()).await?;
        tracing::debug!(transition = self.id, "swapping");
        settle(agents.iter().map(|agent| agent.swap(self)).collect()).await?;
        Ok(Outcome::Completed)
    }
}
