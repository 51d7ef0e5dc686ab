//! **trellis** -- components with a transactional viewport router.
//!
//! This is the umbrella crate re-exporting everything needed to build a
//! trellis application from a single dependency:
//!
//! ```toml
//! [dependencies]
//! trellis = "0.1"
//! ```
//!
//! # Re-exports
//!
//! * All public items from [`trellis_core`] are available at the crate
//!   root ([`Controller`], [`ViewModel`], [`ComponentDefinition`], [`App`],
//!   etc.).
//! * The [`router`] module re-exports [`trellis_router`].
//! * [`logging`] installs a `tracing` subscriber configured from
//!   `TRELLIS_LOG` or `RUST_LOG`.
//! * [`tokio`] is re-exported for demos and downstream crates.
//!
//! # Quick start
//!
//! ```ignore
//! use trellis::router::{Routable, RouteConfig, Router, RouterOptions};
//! use trellis::{App, ComponentDefinition, Container, HostNode, Template, TemplateNode};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let home = ComponentDefinition::element("home").build();
//!     let shell = ComponentDefinition::element("shell")
//!         .template(Template::new([TemplateNode::element("viewport")]))
//!         .routes([RouteConfig::new(home).path("")])
//!         .build();
//!
//!     let container = Container::new();
//!     let router = Router::new(&container, shell.clone(), RouterOptions::default())?;
//!     let app = App::new(container, HostNode::element("body"), shell);
//!     app.start().await?;
//!     router.start().await?;
//!     Ok(())
//! }
//! ```

pub mod logging;

pub use trellis_core::*;
pub mod router {
    pub use trellis_router::*;
}

pub use tokio;
