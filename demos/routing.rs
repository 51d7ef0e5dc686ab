//! # Routing Example
//!
//! A shell with a main viewport and a side viewport:
//! - Route tables with parameters, titles and a redirect
//! - A `can_unload` guard that blocks leaving an unsaved editor
//! - Reading route parameters in `loading`
//! - Watching navigation events
//!
//! Run with: `TRELLIS_LOG=trellis_router=debug cargo run --example routing`

use std::cell::Cell;
use std::rc::Rc;
use tokio_stream::StreamExt;
use trellis::logging::{self, LogOptions};
use trellis::router::{Routable, RouteConfig, Router, RouterOptions};
use trellis::{
    App, ComponentDefinition, Container, GuardResult, HookResult, Hooks, HostNode, Navigation, Params, Template,
    TemplateNode, ViewModel,
};

/// Shows one user; reads the `id` parameter when loaded.
#[derive(Default)]
struct UserPage {
    id: Option<String>,
}

impl ViewModel for UserPage {
    fn hooks() -> Hooks {
        Hooks::LOADING | Hooks::UNLOADING
    }

    fn loading(&mut self, params: &Params, _navigation: &Navigation) -> HookResult {
        self.id = params.get("id").cloned();
        println!("  loading user {}", self.id.as_deref().unwrap_or("?"));
        HookResult::done()
    }

    fn unloading(&mut self, _navigation: &Navigation) -> HookResult {
        println!("  leaving user {}", self.id.as_deref().unwrap_or("?"));
        HookResult::done()
    }
}

/// Refuses to be left while `dirty` is set.
struct Editor {
    dirty: Rc<Cell<bool>>,
}

impl ViewModel for Editor {
    fn hooks() -> Hooks {
        Hooks::CAN_UNLOAD
    }

    fn can_unload(&mut self, _navigation: &Navigation) -> GuardResult {
        GuardResult::from(!self.dirty.get())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(LogOptions::default());

    let dirty = Rc::new(Cell::new(true));
    let home = ComponentDefinition::element("home").build();
    let menu = ComponentDefinition::element("menu").build();
    let user = ComponentDefinition::element("user")
        .view_model(|_| UserPage::default())
        .build();
    let editor = {
        let dirty = dirty.clone();
        ComponentDefinition::element("editor")
            .view_model(move |_| Editor { dirty: dirty.clone() })
            .build()
    };

    let shell = ComponentDefinition::element("shell")
        .template(Template::new([
            TemplateNode::element("viewport").attr("name", "main"),
            TemplateNode::element("viewport").attr("name", "side").attr("default", "menu"),
        ]))
        .routes([
            RouteConfig::redirect("", "home"),
            RouteConfig::new(home).title("Home"),
            RouteConfig::new(menu),
            RouteConfig::new(user).path("users/:id").title("User"),
            RouteConfig::new(editor).title("Editor"),
        ])
        .build();

    let container = Container::new();
    let router = Router::new(&container, shell.clone(), RouterOptions::default())?;
    let app = App::new(container, HostNode::element("body"), shell);

    let mut events = router.events();
    let local = tokio::task::LocalSet::new();
    local.spawn_local(async move {
        while let Some(Ok(event)) = events.next().await {
            println!("  event: {event:?}");
        }
    });
    local
        .run_until(async {
            app.start().await?;
            router.start().await?;
            report(&router, &app);

            for instruction in ["users/42", "users/7", "editor"] {
                println!("> load {instruction}");
                router.load(instruction).await?;
                report(&router, &app);
            }

            println!("> load home (editor is dirty)");
            if let Err(err) = router.load("home").await {
                println!("  refused: {err}");
            }
            dirty.set(false);
            println!("> load home (saved)");
            router.load("home").await?;
            report(&router, &app);

            app.stop().await?;
            router.stop()?;
            Ok::<_, Box<dyn std::error::Error>>(())
        })
        .await
}

fn report(router: &Router, app: &App) {
    println!(
        "  url={} title={:?}\n  {}",
        router.current_url(),
        router.title(),
        app.host().to_markup()
    );
}
