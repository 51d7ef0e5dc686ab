use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use tokio_stream::StreamExt;
use trellis_core::testing::{spec_element, HookBehavior, HookLog, HookSpec};
use trellis_core::{
    App, ComponentDefinition, Container, HookContext, HookResult, Hooks, HostNode, LifecycleError, LifecycleFlags,
    Template, TemplateNode, ViewModel,
};
use trellis_router::{
    HistoryStrategy, NavigationEvent, NavigationOptions, NavigationOutcome, Routable, RouteConfig, Router,
    RouterError, RouterOptions, TransitionPlan,
};

struct Harness {
    app: App,
    router: Router,
}

impl Harness {
    async fn new(root: Rc<ComponentDefinition>) -> Self {
        Self::with_options(root, RouterOptions::default()).await
    }

    async fn with_options(root: Rc<ComponentDefinition>, options: RouterOptions) -> Self {
        let container = Container::new();
        let router = Router::new(&container, root.clone(), options).unwrap();
        let app = App::new(container, HostNode::element("body"), root);
        app.start().await.unwrap();
        router.start().await.unwrap();
        Self { app, router }
    }
}

fn viewport() -> TemplateNode {
    TemplateNode::element("viewport")
}

fn named(name: &str) -> TemplateNode {
    TemplateNode::element("viewport").attr("name", name)
}

fn element(spec: HookSpec, log: &HookLog) -> Rc<ComponentDefinition> {
    spec_element(spec, log).build()
}

fn root(routes: Vec<RouteConfig>, viewports: Vec<TemplateNode>, log: &HookLog) -> Rc<ComponentDefinition> {
    spec_element(HookSpec::new("root"), log)
        .template(Template::new(viewports))
        .routes(routes)
        .build()
}

fn position(timeline: &[String], entry: &str) -> usize {
    timeline
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{entry} missing from {timeline:?}"))
}

#[tokio::test]
async fn replacing_a_component_runs_every_hook_in_order() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let b = element(HookSpec::sync("b"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;

    assert_eq!(harness.router.load("a").await.unwrap(), NavigationOutcome::Navigated);
    assert_eq!(
        log.take_calls(),
        vec!["a.can_load", "a.loading", "a.binding", "a.bound", "a.attaching", "a.attached"]
    );
    assert_eq!(harness.app.host().to_markup(), "<body><viewport><a></a></viewport></body>");

    harness.router.load("b").await.unwrap();
    assert_eq!(
        log.take_calls(),
        vec![
            "a.can_unload",
            "b.can_load",
            "a.unloading",
            "b.loading",
            "a.detaching",
            "a.unbinding",
            "a.dispose",
            "b.binding",
            "b.bound",
            "b.attaching",
            "b.attached",
        ]
    );
    assert_eq!(harness.app.host().to_markup(), "<body><viewport><b></b></viewport></body>");
    assert_eq!(harness.router.current_url(), "/b");
}

#[tokio::test]
async fn start_loads_the_empty_path_route() {
    let log = HookLog::new();
    let home = element(HookSpec::sync("home"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(home).path("").title("Home")],
        vec![viewport()],
        &log,
    ))
    .await;

    assert_eq!(
        log.calls(),
        vec!["home.can_load", "home.loading", "home.binding", "home.bound", "home.attaching", "home.attached"]
    );
    assert_eq!(harness.router.current_url(), "/");
    assert_eq!(harness.router.title().as_deref(), Some("Home"));
    assert!(harness.router.current_tree().find("home").is_some());
}

#[tokio::test]
async fn router_start_after_app_start_activates_the_default_route() {
    let log = HookLog::new();
    let a01 = element(HookSpec::sync("a01"), &log);
    let root2 = spec_element(HookSpec::sync("root2"), &log)
        .template(Template::new([viewport()]))
        .routes([RouteConfig::new(a01).path("")])
        .build();
    let container = Container::new();
    let router = Router::new(&container, root2.clone(), RouterOptions::default()).unwrap();
    let app = App::new(container, HostNode::element("body"), root2);

    app.start().await.unwrap();
    assert_eq!(
        log.take_calls(),
        vec!["root2.binding", "root2.bound", "root2.attaching", "root2.attached"]
    );

    router.start().await.unwrap();
    assert_eq!(
        log.take_calls(),
        vec!["a01.can_load", "a01.loading", "a01.binding", "a01.bound", "a01.attaching", "a01.attached"]
    );
}

#[tokio::test]
async fn nested_routes_activate_inside_their_parent() {
    let log = HookLog::new();
    let gc11 = element(HookSpec::sync("gc-11"), &log);
    let p1 = spec_element(HookSpec::sync("p1"), &log)
        .template(Template::new([viewport()]))
        .routes([RouteConfig::new(gc11)])
        .build();
    let harness = Harness::new(root(vec![RouteConfig::new(p1)], vec![viewport()], &log)).await;

    harness.router.load("p1/gc-11").await.unwrap();
    assert_eq!(
        log.take_calls(),
        vec![
            "p1.can_load",
            "gc-11.can_load",
            "p1.loading",
            "gc-11.loading",
            "p1.binding",
            "p1.bound",
            "p1.attaching",
            "gc-11.binding",
            "gc-11.bound",
            "gc-11.attaching",
            "gc-11.attached",
            "p1.attached",
        ]
    );
    assert_eq!(harness.router.current_url(), "/p1/gc-11");
    assert_eq!(
        harness.app.host().to_markup(),
        "<body><viewport><p1><viewport><gc-11></gc-11></viewport></p1></viewport></body>"
    );
}

#[tokio::test]
async fn unknown_route_fails_and_restores_without_hooks() {
    let log = HookLog::new();
    let gc11 = element(HookSpec::sync("gc-11"), &log);
    let p1 = spec_element(HookSpec::sync("p1"), &log)
        .template(Template::new([viewport()]))
        .routes([RouteConfig::new(gc11)])
        .build();
    let harness = Harness::new(root(vec![RouteConfig::new(p1)], vec![viewport()], &log)).await;
    harness.router.load("p1/gc-11").await.unwrap();
    log.clear();

    let err = harness.router.load("unconfigured").await.unwrap_err();
    assert!(matches!(err, RouterError::UnknownRoute { .. }));
    assert_eq!(
        err.to_string(),
        "Neither the route 'unconfigured' matched any configured route at 'root' nor a fallback is configured for the viewport 'default'"
    );
    assert_eq!(log.calls(), vec!["gc-11.can_unload"]);
    assert_eq!(harness.router.current_url(), "/p1/gc-11");
    // Nothing went past the point of no return.
    assert!(harness.router.stop().is_ok());
}

#[tokio::test]
async fn unknown_route_next_to_a_leaf_runs_no_hooks() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    let err = harness.router.load("unconfigured").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Neither the route 'unconfigured' matched any configured route at 'root' nor a fallback is configured for the viewport 'default'"
    );
    assert!(log.calls().is_empty(), "{:?}", log.calls());
    assert_eq!(harness.router.current_url(), "/a");
}

#[tokio::test]
async fn loading_the_active_instruction_is_a_no_op() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    assert_eq!(harness.router.load("a").await.unwrap(), NavigationOutcome::Unchanged);
    assert!(log.calls().is_empty());
    assert!(harness.router.is_active("a"));
}

#[tokio::test]
async fn unmatched_paths_load_the_fallback() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let b = element(HookSpec::sync("b"), &log);
    let c = element(HookSpec::sync("c"), &log);
    let shell = spec_element(HookSpec::new("root"), &log)
        .template(Template::new([viewport()]))
        .routes([RouteConfig::new(a), RouteConfig::new(b)])
        .fallback("c")
        .dependency(c)
        .build();
    let harness = Harness::new(shell).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    harness.router.load("unconfigured").await.unwrap();
    assert_eq!(
        log.calls(),
        vec![
            "a.can_unload",
            "c.can_load",
            "a.unloading",
            "c.loading",
            "a.detaching",
            "a.unbinding",
            "a.dispose",
            "c.binding",
            "c.bound",
            "c.attaching",
            "c.attached",
        ]
    );
    assert_eq!(harness.router.current_url(), "/unconfigured");
}

#[tokio::test]
async fn viewport_fallback_attribute_wins() {
    let log = HookLog::new();
    let missing = element(HookSpec::sync("missing"), &log);
    let shell = spec_element(HookSpec::new("root"), &log)
        .template(Template::new([viewport().attr("fallback", "missing")]))
        .routes([RouteConfig::new(element(HookSpec::new("a"), &log))])
        .dependency(missing)
        .build();
    let harness = Harness::new(shell).await;

    harness.router.load("nowhere").await.unwrap();
    assert!(harness.router.current_tree().find("missing").is_some());
}

#[tokio::test]
async fn can_unload_veto_keeps_the_current_component() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a").with(Hooks::CAN_UNLOAD, HookBehavior::Deny), &log);
    let b = element(HookSpec::sync("b"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    let err = harness.router.load("b").await.unwrap_err();
    match err {
        RouterError::GuardRejected { component, hook, .. } => {
            assert_eq!(component, "a");
            assert_eq!(hook, "can_unload");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(log.calls(), vec!["a.can_unload"]);
    assert_eq!(harness.router.current_url(), "/a");
}

#[tokio::test]
async fn sibling_viewports_share_phase_barriers() {
    let log = HookLog::new();
    let a = element(HookSpec::delayed("a", 1), &log);
    let b = element(HookSpec::delayed("b", 3), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(a), RouteConfig::new(b)],
        vec![named("$0"), named("$1")],
        &log,
    ))
    .await;

    harness.router.load("a@$0+b@$1").await.unwrap();
    let timeline = log.timeline();

    let can_load_done = position(&timeline, "a.can_load.leave").max(position(&timeline, "b.can_load.leave"));
    let loading_begins = position(&timeline, "a.loading.enter").min(position(&timeline, "b.loading.enter"));
    assert!(can_load_done < loading_begins, "{timeline:?}");

    let loading_done = position(&timeline, "a.loading.leave").max(position(&timeline, "b.loading.leave"));
    let binding_begins = position(&timeline, "a.binding.enter").min(position(&timeline, "b.binding.enter"));
    assert!(loading_done < binding_begins, "{timeline:?}");

    assert!(position(&timeline, "b.can_load.enter") < position(&timeline, "a.can_load.leave"));
    assert!(position(&timeline, "b.binding.enter") < position(&timeline, "a.bound.enter"));
    assert_eq!(harness.router.current_url(), "/a@$0+b@$1");
}

#[tokio::test]
async fn viewport_defaults_fill_unnamed_viewports() {
    let log = HookLog::new();
    let home = element(HookSpec::new("home"), &log);
    let nav = element(HookSpec::new("nav"), &log);
    let about = element(HookSpec::new("about"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(home), RouteConfig::new(nav), RouteConfig::new(about)],
        vec![
            named("main").attr("default", "home"),
            named("side").attr("default", "nav"),
        ],
        &log,
    ))
    .await;
    assert_eq!(harness.router.current_url(), "/home+nav");

    harness.router.load("about").await.unwrap();
    assert_eq!(harness.router.current_url(), "/about+nav");
}

#[tokio::test]
async fn parameters_reach_the_tree_and_replace_by_default() {
    let log = HookLog::new();
    let user = element(HookSpec::sync("user"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(user).path("users/:id")],
        vec![viewport()],
        &log,
    ))
    .await;

    harness.router.load("users/42").await.unwrap();
    let tree = harness.router.current_tree();
    let node = tree.find("user").unwrap();
    assert_eq!(node.params.get("id").map(String::as_str), Some("42"));
    assert!(harness.router.is_active("users/42"));
    assert!(!harness.router.is_active("users/7"));
    log.clear();

    harness.router.load("users/7").await.unwrap();
    assert!(log.calls().contains(&"user.dispose".to_owned()));
    assert_eq!(harness.router.current_url(), "/users/7");
}

#[tokio::test]
async fn invoke_lifecycles_keeps_the_instance() {
    let log = HookLog::new();
    let user = element(HookSpec::sync("user"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(user)
            .path("users/:id")
            .transition_plan(TransitionPlan::InvokeLifecycles)],
        vec![viewport()],
        &log,
    ))
    .await;
    harness.router.load("users/1").await.unwrap();
    log.clear();

    harness.router.load("users/2").await.unwrap();
    assert_eq!(
        log.calls(),
        vec!["user.can_unload", "user.can_load", "user.unloading", "user.loading"]
    );
    let tree = harness.router.current_tree();
    assert_eq!(tree.find("user").unwrap().params.get("id").map(String::as_str), Some("2"));

    log.clear();
    let forced = NavigationOptions::default().transition_plan(TransitionPlan::Replace);
    harness.router.load_with("users/2", forced).await.unwrap();
    assert!(log.calls().contains(&"user.binding".to_owned()));
}

#[tokio::test]
async fn a_newer_load_supersedes_a_pending_one() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a").with(Hooks::CAN_LOAD, HookBehavior::Async(5)), &log);
    let b = element(HookSpec::sync("b"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;

    let (first, second) = tokio::join!(harness.router.load("a"), harness.router.load("b"));
    assert_eq!(first.unwrap(), NavigationOutcome::Superseded);
    assert_eq!(second.unwrap(), NavigationOutcome::Navigated);

    let calls = log.calls();
    assert!(calls.contains(&"a.dispose".to_owned()));
    assert!(!calls.contains(&"a.binding".to_owned()));
    assert_eq!(harness.router.current_url(), "/b");
}

#[tokio::test]
async fn a_committed_navigation_rejects_new_loads() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a").with(Hooks::UNLOADING, HookBehavior::Async(5)), &log);
    let b = element(HookSpec::sync("b"), &log);
    let c = element(HookSpec::sync("c"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(a), RouteConfig::new(b), RouteConfig::new(c)],
        vec![viewport()],
        &log,
    ))
    .await;
    harness.router.load("a").await.unwrap();

    let (first, second) = tokio::join!(harness.router.load("b"), harness.router.load("c"));
    assert_eq!(first.unwrap(), NavigationOutcome::Navigated);
    assert!(matches!(second, Err(RouterError::NavigationInProgress)));
    assert_eq!(harness.router.current_url(), "/b");
}

#[tokio::test]
async fn guard_redirects_navigate_elsewhere() {
    let log = HookLog::new();
    let b = element(
        HookSpec::sync("b").with(Hooks::CAN_LOAD, HookBehavior::Redirect("c".to_owned())),
        &log,
    );
    let c = element(HookSpec::sync("c"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(b), RouteConfig::new(c)], vec![viewport()], &log)).await;

    assert_eq!(harness.router.load("b").await.unwrap(), NavigationOutcome::Navigated);
    let calls = log.calls();
    assert!(calls.contains(&"b.dispose".to_owned()));
    assert!(!calls.contains(&"b.binding".to_owned()));
    assert!(calls.contains(&"c.attached".to_owned()));
    assert_eq!(harness.router.current_url(), "/c");
}

#[tokio::test]
async fn configured_redirects_apply_on_start() {
    let log = HookLog::new();
    let home = element(HookSpec::new("home"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::redirect("", "home"), RouteConfig::new(home)],
        vec![viewport()],
        &log,
    ))
    .await;
    assert_eq!(harness.router.current_url(), "/home");
}

#[tokio::test]
async fn activation_failure_restores_the_previous_tree() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let b = element(HookSpec::sync("b").with(Hooks::BINDING, HookBehavior::Fail), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    let err = harness.router.load("b").await.unwrap_err();
    assert!(matches!(err, RouterError::Lifecycle(_)));
    assert_eq!(
        log.calls(),
        vec![
            "a.can_unload",
            "b.can_load",
            "a.unloading",
            "b.loading",
            "a.detaching",
            "a.unbinding",
            "a.dispose",
            "b.binding",
            "b.dispose",
            "a.can_load",
            "a.loading",
            "a.binding",
            "a.bound",
            "a.attaching",
            "a.attached",
        ]
    );
    assert_eq!(harness.router.current_url(), "/a");
    assert!(matches!(harness.router.stop(), Err(RouterError::Lifecycle(_))));
    assert!(harness.router.stop().is_ok());
}

#[tokio::test]
async fn a_failing_sibling_leaves_guards_already_run() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let b = element(HookSpec::sync("b"), &log);
    let harness = Harness::new(root(
        vec![RouteConfig::new(a), RouteConfig::new(b)],
        vec![named("$0"), named("$1")],
        &log,
    ))
    .await;
    harness.router.load("a@$0").await.unwrap();
    log.clear();

    let err = harness.router.load("b@$0+unconfigured@$1").await.unwrap_err();
    assert!(matches!(err, RouterError::UnknownRoute { .. }), "{err:?}");
    // The guard that already answered in the other viewport is not undone.
    assert_eq!(log.calls(), vec!["a.can_unload"]);
    assert_eq!(harness.router.current_url(), "/a@$0");
}

#[tokio::test]
async fn a_throwing_guard_fails_the_navigation() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a").with(Hooks::CAN_UNLOAD, HookBehavior::Fail), &log);
    let b = element(HookSpec::sync("b"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    let err = harness.router.load("b").await.unwrap_err();
    match &err {
        RouterError::Lifecycle(LifecycleError::Hook { component, hook, .. }) => {
            assert_eq!(component, "a");
            assert_eq!(*hook, "can_unload");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(log.calls(), vec!["a.can_unload"]);
    assert_eq!(harness.router.current_url(), "/a");
    // The guard phase is before the point of no return.
    assert!(harness.router.stop().is_ok());
}

#[tokio::test]
async fn detaching_failure_settles_the_batch_then_restores() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a").with(Hooks::DETACHING, HookBehavior::Fail), &log);
    let b = element(HookSpec::sync("b"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    let err = harness.router.load("b").await.unwrap_err();
    assert!(matches!(err, RouterError::Lifecycle(_)), "{err:?}");
    let calls = log.calls();
    let at = |entry: &str| position(&calls, entry);
    assert!(at("a.detaching") < at("a.unbinding"), "{calls:?}");
    assert!(at("a.unbinding") < at("a.dispose"), "{calls:?}");
    assert!(at("a.dispose") < at("b.dispose"), "{calls:?}");
    assert!(!calls.contains(&"b.binding".to_owned()), "{calls:?}");
    assert_eq!(calls.last().map(String::as_str), Some("a.attached"));
    assert_eq!(harness.router.current_url(), "/a");
    assert_eq!(harness.app.host().to_markup(), "<body><viewport><a></a></viewport></body>");
    assert!(matches!(harness.router.stop(), Err(RouterError::Lifecycle(_))));
}

/// Records whether `RELOAD` was set for each lifecycle hook it sees.
struct ReloadRecorder {
    seen: Rc<RefCell<Vec<(&'static str, bool)>>>,
}

impl ViewModel for ReloadRecorder {
    fn hooks() -> Hooks {
        Hooks::BINDING | Hooks::DETACHING
    }

    fn binding(&mut self, ctx: &HookContext) -> HookResult {
        self.seen
            .borrow_mut()
            .push(("binding", ctx.flags.contains(LifecycleFlags::RELOAD)));
        HookResult::done()
    }

    fn detaching(&mut self, ctx: &HookContext) -> HookResult {
        self.seen
            .borrow_mut()
            .push(("detaching", ctx.flags.contains(LifecycleFlags::RELOAD)));
        HookResult::done()
    }
}

#[tokio::test]
async fn forced_replace_of_the_same_component_is_a_reload() {
    let log = HookLog::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let user = {
        let seen = seen.clone();
        ComponentDefinition::element("user")
            .view_model(move |_| ReloadRecorder { seen: seen.clone() })
            .build()
    };
    let harness = Harness::new(root(
        vec![RouteConfig::new(user).path("users/:id")],
        vec![viewport()],
        &log,
    ))
    .await;
    harness.router.load("users/1").await.unwrap();
    seen.borrow_mut().clear();

    let forced = NavigationOptions::default().transition_plan(TransitionPlan::Replace);
    harness.router.load_with("users/1", forced).await.unwrap();
    assert_eq!(seen.take(), vec![("detaching", true), ("binding", true)]);

    harness.router.load("users/2").await.unwrap();
    assert_eq!(seen.take(), vec![("detaching", false), ("binding", false)]);
}

#[tokio::test]
async fn events_report_navigation_progress() {
    let log = HookLog::new();
    let a = element(HookSpec::new("a"), &log);
    let b = element(HookSpec::sync("b").with(Hooks::CAN_LOAD, HookBehavior::Deny), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log)).await;
    let mut events = harness.router.events();

    harness.router.load("a").await.unwrap();
    let start = events.next().await.unwrap().unwrap();
    assert!(matches!(start, NavigationEvent::Start { ref instruction, .. } if instruction == "a"));
    let end = events.next().await.unwrap().unwrap();
    assert!(matches!(end, NavigationEvent::End { ref url, .. } if url == "/a"));
    assert_eq!(start.id(), end.id());

    assert!(harness.router.load("b").await.is_err());
    events.next().await.unwrap().unwrap();
    let cancel = events.next().await.unwrap().unwrap();
    assert!(matches!(cancel, NavigationEvent::Cancel { .. }));
    assert_eq!(cancel.instruction(), "b");
}

#[tokio::test]
async fn history_follows_the_strategy() {
    let log = HookLog::new();
    let a = element(HookSpec::new("a"), &log);
    let b = element(HookSpec::new("b"), &log);
    let options = RouterOptions {
        use_url_fragment_hash: true,
        ..RouterOptions::default()
    };
    let harness = Harness::with_options(
        root(vec![RouteConfig::new(a), RouteConfig::new(b)], vec![viewport()], &log),
        options,
    )
    .await;

    harness.router.load("a").await.unwrap();
    let replace = NavigationOptions::default().history_strategy(HistoryStrategy::Replace);
    harness.router.load_with("b", replace).await.unwrap();
    let urls: Vec<String> = harness.router.history().into_iter().map(|entry| entry.url).collect();
    assert_eq!(urls, vec!["#/", "#/b"]);
}

#[tokio::test]
async fn stopping_the_app_tears_routed_components_down() {
    let log = HookLog::new();
    let a = element(HookSpec::sync("a"), &log);
    let harness = Harness::new(root(vec![RouteConfig::new(a)], vec![viewport()], &log)).await;
    harness.router.load("a").await.unwrap();
    log.clear();

    harness.app.stop().await.unwrap();
    assert_eq!(log.calls(), vec!["a.detaching", "a.unbinding", "a.dispose"]);
    assert!(harness.router.stop().is_ok());
}
