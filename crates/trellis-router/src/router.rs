use crate::config::TransitionPlan;
use crate::context::RouteContext;
use crate::error::RouterError;
use crate::events::NavigationEvent;
use crate::instruction::InstructionTree;
use crate::route_tree::RouteTree;
use crate::transition::{Outcome, Transition};
use crate::viewport;
use crate::viewport_agent::ViewportAgent;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;
use trellis_core::{ComponentDefinition, Container};

const EVENT_CAPACITY: usize = 64;

/// How a completed navigation is recorded in the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryStrategy {
    #[default]
    Push,
    Replace,
    None,
}

/// Router-wide settings.
#[derive(Clone)]
pub struct RouterOptions {
    /// Render URLs as `#/path` instead of `/path`.
    pub use_url_fragment_hash: bool,
    pub history_strategy: HistoryStrategy,
    /// After a failed navigation, navigate back to the last good tree.
    pub restore_previous_route_tree_on_error: bool,
    /// Builds the document title from the new tree.  The default joins
    /// the route titles, deepest first, with ` | `.
    pub build_title: Option<Rc<dyn Fn(&RouteTree) -> Option<String>>>,
    /// Bound on redirects, both configured and from guards, per navigation.
    pub max_redirects: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            use_url_fragment_hash: false,
            history_strategy: HistoryStrategy::Push,
            restore_previous_route_tree_on_error: true,
            build_title: None,
            max_redirects: 10,
        }
    }
}

impl fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterOptions")
            .field("use_url_fragment_hash", &self.use_url_fragment_hash)
            .field("history_strategy", &self.history_strategy)
            .field(
                "restore_previous_route_tree_on_error",
                &self.restore_previous_route_tree_on_error,
            )
            .field("build_title", &self.build_title.as_ref().map(|_| "<fn>"))
            .field("max_redirects", &self.max_redirects)
            .finish()
    }
}

/// Per-navigation settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationOptions {
    /// Applied to every component that is already shown.  Also disables
    /// the unchanged-instruction short-circuit.
    pub transition_plan: Option<TransitionPlan>,
    /// Overrides [`RouterOptions::history_strategy`].
    pub history_strategy: Option<HistoryStrategy>,
}

impl NavigationOptions {
    pub fn transition_plan(mut self, plan: TransitionPlan) -> Self {
        self.transition_plan = Some(plan);
        self
    }

    pub fn history_strategy(mut self, strategy: HistoryStrategy) -> Self {
        self.history_strategy = Some(strategy);
        self
    }
}

/// How a successful [`Router::load`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Navigated,
    /// The instruction was already active; nothing ran.
    Unchanged,
    /// A later navigation replaced this one before its point of no return.
    Superseded,
}

/// One recorded history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
    pub title: Option<String>,
}

struct RouterInner {
    root: RouteContext,
    options: RouterOptions,
    queue: Mutex<()>,
    next_id: Cell<u64>,
    latest: Cell<u64>,
    active: RefCell<Option<Rc<Transition>>>,
    tree: RefCell<Rc<RouteTree>>,
    instructions: RefCell<Option<InstructionTree>>,
    history: RefCell<Vec<HistoryEntry>>,
    title: RefCell<Option<String>>,
    remembered: RefCell<Option<RouterError>>,
    events: broadcast::Sender<NavigationEvent>,
}

/// Navigates the viewports of a component tree.
///
/// Navigations are serialized: a new [`load`](Router::load) supersedes a
/// running one that has not reached its point of no return, and is
/// rejected with [`RouterError::NavigationInProgress`] when it has.
///
/// # Example
///
/// ```rust,ignore
/// let container = Container::new();
/// let router = Router::new(&container, shell.clone(), RouterOptions::default())?;
/// let app = App::new(container, HostNode::element("body"), shell);
/// app.start().await?;
/// router.start().await?;
/// router.load("users/42").await?;
/// ```
#[derive(Clone)]
pub struct Router(Rc<RouterInner>);

impl Router {
    /// Create the router for the component tree rooted at `root`.
    ///
    /// Registers the router, the root routing context and the
    /// `<viewport>` element in `container`, so this must run before the
    /// root is hydrated.
    pub fn new(
        container: &Container,
        root: Rc<ComponentDefinition>,
        options: RouterOptions,
    ) -> Result<Router, RouterError> {
        let context = RouteContext::new(root, container, None)?;
        container.register(context.clone());
        container.register_component(viewport::definition());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let router = Router(Rc::new(RouterInner {
            root: context,
            options,
            queue: Mutex::new(()),
            next_id: Cell::new(1),
            latest: Cell::new(0),
            active: RefCell::new(None),
            tree: RefCell::new(Rc::new(RouteTree::default())),
            instructions: RefCell::new(None),
            history: RefCell::new(Vec::new()),
            title: RefCell::new(None),
            remembered: RefCell::new(None),
            events,
        }));
        container.register(router.clone());
        tracing::debug!(root = %router.0.root.name(), options = ?router.0.options, "created router");
        Ok(router)
    }

    pub fn options(&self) -> &RouterOptions {
        &self.0.options
    }

    pub fn root_context(&self) -> &RouteContext {
        &self.0.root
    }

    /// Load the empty instruction, which shows every viewport's default.
    pub async fn start(&self) -> Result<NavigationOutcome, RouterError> {
        tracing::debug!("starting router");
        let options = NavigationOptions::default().history_strategy(HistoryStrategy::Replace);
        self.load_tree(InstructionTree::default(), options).await
    }

    /// Supersede any navigation that is still cancellable and return the
    /// error of the last navigation that failed past its point of no
    /// return, once.
    pub fn stop(&self) -> Result<(), RouterError> {
        tracing::debug!("stopping router");
        let active = self.0.active.borrow().clone();
        if let Some(active) = active {
            if !active.is_committed() {
                active.supersede();
            }
        }
        match self.0.remembered.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn load(&self, instruction: &str) -> Result<NavigationOutcome, RouterError> {
        self.load_with(instruction, NavigationOptions::default()).await
    }

    pub async fn load_with(
        &self,
        instruction: &str,
        options: NavigationOptions,
    ) -> Result<NavigationOutcome, RouterError> {
        let tree = InstructionTree::parse(instruction)?;
        self.load_tree(tree, options).await
    }

    pub async fn load_tree(
        &self,
        tree: InstructionTree,
        options: NavigationOptions,
    ) -> Result<NavigationOutcome, RouterError> {
        let active = self.0.active.borrow().clone();
        if let Some(active) = active {
            if active.is_committed() {
                tracing::warn!(instruction = %tree, running = active.id, "navigation rejected, another one is committed");
                return Err(RouterError::NavigationInProgress);
            }
            tracing::debug!(instruction = %tree, superseded = active.id, "superseding navigation");
            active.supersede();
        }

        let id = self.0.next_id.get();
        self.0.next_id.set(id + 1);
        self.0.latest.set(id);
        let _queue = self.0.queue.lock().await;
        if self.0.latest.get() != id {
            tracing::debug!(transition = id, "navigation superseded while queued");
            return Ok(NavigationOutcome::Superseded);
        }
        self.navigate(tree, options, id).await
    }

    async fn navigate(
        &self,
        mut tree: InstructionTree,
        options: NavigationOptions,
        id: u64,
    ) -> Result<NavigationOutcome, RouterError> {
        let mut redirects = 0;
        loop {
            if options.transition_plan.is_none() && self.0.instructions.borrow().as_ref() == Some(&tree) {
                tracing::debug!(transition = id, instruction = %tree, "instruction unchanged");
                return Ok(NavigationOutcome::Unchanged);
            }
            let instruction = tree.to_string();
            tracing::info!(transition = id, %instruction, "navigating");
            self.emit(NavigationEvent::Start {
                id,
                instruction: instruction.clone(),
            });

            let (result, committed) = self.attempt(&tree, options.transition_plan, id).await;
            match result {
                Ok(Outcome::Completed) => {
                    let url = self.commit(tree, options.history_strategy);
                    self.emit(NavigationEvent::End { id, instruction, url });
                    return Ok(NavigationOutcome::Navigated);
                }
                Ok(Outcome::Superseded) => {
                    self.cancel(id, instruction, "superseded".to_owned());
                    return Ok(NavigationOutcome::Superseded);
                }
                Ok(Outcome::Vetoed { component, hook }) => {
                    self.cancel(id, instruction.clone(), format!("{hook} of '{component}' returned false"));
                    return Err(RouterError::GuardRejected {
                        instruction,
                        component,
                        hook,
                    });
                }
                Ok(Outcome::Redirected(target)) => {
                    self.cancel(id, instruction, format!("redirected to '{target}'"));
                    redirects += 1;
                    if redirects > self.0.options.max_redirects {
                        return Err(RouterError::TooManyRedirects {
                            instruction: target,
                            limit: self.0.options.max_redirects,
                        });
                    }
                    tree = InstructionTree::parse(&target)?;
                }
                Err(err) => {
                    tracing::warn!(transition = id, %instruction, error = %err, "navigation failed");
                    self.emit(NavigationEvent::Error {
                        id,
                        instruction,
                        error: err.to_string(),
                    });
                    if committed {
                        *self.0.remembered.borrow_mut() = Some(err.clone());
                    }
                    self.restore(id).await;
                    return Err(err);
                }
            }
        }
    }

    /// Run one transition over the root viewports.  Also reports whether
    /// it got past its point of no return.
    async fn attempt(
        &self,
        tree: &InstructionTree,
        plan: Option<TransitionPlan>,
        id: u64,
    ) -> (Result<Outcome, RouterError>, bool) {
        let transition = Rc::new(Transition::new(id, tree.clone(), plan, self.0.options.max_redirects));
        *self.0.active.borrow_mut() = Some(transition.clone());
        let result = match ViewportAgent::schedule_level(&self.0.root, &tree.children) {
            Ok(agents) => {
                let result = transition.run(&agents).await;
                let completed = matches!(result, Ok(Outcome::Completed));
                for agent in &agents {
                    agent.end_transition(completed);
                }
                result
            }
            Err(err) => Err(err),
        };
        self.0.active.borrow_mut().take();
        (result, transition.is_committed())
    }

    /// Navigate back to the last instruction that completed.
    async fn restore(&self, id: u64) {
        if !self.0.options.restore_previous_route_tree_on_error {
            return;
        }
        let previous = self.0.instructions.borrow().clone();
        let Some(previous) = previous else {
            return;
        };
        tracing::info!(transition = id, instruction = %previous, "restoring previous route tree");
        match self.attempt(&previous, None, id).await {
            (Ok(Outcome::Completed), _) => {
                self.commit(previous, Some(HistoryStrategy::None));
            }
            (Ok(outcome), _) => {
                tracing::warn!(transition = id, ?outcome, "restoring the previous route tree was interrupted");
            }
            (Err(err), _) => {
                tracing::error!(transition = id, error = %err, "restoring the previous route tree failed");
            }
        }
    }

    /// Publish the tree the agents now show.  Returns its URL.
    fn commit(&self, instructions: InstructionTree, history: Option<HistoryStrategy>) -> String {
        let tree = Rc::new(RouteTree {
            instructions: instructions.clone(),
            children: self
                .0
                .root
                .agents()
                .iter()
                .filter_map(ViewportAgent::route_node)
                .collect(),
        });
        let title = match &self.0.options.build_title {
            Some(build) => build(&tree),
            None => default_title(&tree),
        };
        let url = self.url_of(&tree);
        *self.0.tree.borrow_mut() = tree;
        *self.0.instructions.borrow_mut() = Some(instructions);
        *self.0.title.borrow_mut() = title.clone();

        let entry = HistoryEntry { url: url.clone(), title };
        let mut entries = self.0.history.borrow_mut();
        match history.unwrap_or(self.0.options.history_strategy) {
            HistoryStrategy::Push => entries.push(entry),
            HistoryStrategy::Replace => match entries.last_mut() {
                Some(last) => *last = entry,
                None => entries.push(entry),
            },
            HistoryStrategy::None => {}
        }
        url
    }

    fn cancel(&self, id: u64, instruction: String, reason: String) {
        tracing::info!(transition = id, %instruction, %reason, "navigation cancelled");
        self.emit(NavigationEvent::Cancel {
            id,
            instruction,
            reason,
        });
    }

    fn emit(&self, event: NavigationEvent) {
        // Sending only fails without subscribers.
        let _ = self.0.events.send(event);
    }

    fn url_of(&self, tree: &RouteTree) -> String {
        if self.0.options.use_url_fragment_hash {
            format!("#/{}", tree.path())
        } else {
            format!("/{}", tree.path())
        }
    }

    /// The tree of the last completed navigation.
    pub fn current_tree(&self) -> Rc<RouteTree> {
        self.0.tree.borrow().clone()
    }

    pub fn current_url(&self) -> String {
        self.url_of(&self.0.tree.borrow())
    }

    pub fn title(&self) -> Option<String> {
        self.0.title.borrow().clone()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.0.history.borrow().clone()
    }

    /// Whether every component `instruction` names is shown with the same
    /// parameters.  Unparseable instructions are never active.
    pub fn is_active(&self, instruction: &str) -> bool {
        match InstructionTree::parse(instruction) {
            Ok(tree) => self.0.root.shows(&tree.children, self.0.options.max_redirects),
            Err(_) => false,
        }
    }

    /// Subscribe to navigation events.
    pub fn events(&self) -> BroadcastStream<NavigationEvent> {
        BroadcastStream::new(self.0.events.subscribe())
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("root", &self.0.root)
            .field("url", &self.current_url())
            .finish()
    }
}

fn default_title(tree: &RouteTree) -> Option<String> {
    let titles = tree.titles();
    (!titles.is_empty()).then(|| titles.join(" | "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_push_and_restore() {
        let options = RouterOptions::default();
        assert_eq!(options.history_strategy, HistoryStrategy::Push);
        assert!(options.restore_previous_route_tree_on_error);
        assert!(format!("{options:?}").contains("max_redirects: 10"));
    }

    #[test]
    fn default_title_joins_deepest_first() {
        let tree = RouteTree {
            children: vec![crate::RouteNode {
                title: Some("Shell".to_owned()),
                children: vec![crate::RouteNode {
                    title: Some("Detail".to_owned()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..RouteTree::default()
        };
        assert_eq!(default_title(&tree).as_deref(), Some("Detail | Shell"));
        assert_eq!(default_title(&RouteTree::default()), None);
    }
}
