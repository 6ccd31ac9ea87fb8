//! HTML views.
//!
//! Templates are embedded at compile time. Names end in `.html`, so minijinja
//! auto-escapes every interpolated value.

use anyhow::{Context, Result};
use minijinja::Environment;
use serde::Serialize;

use crate::auth::{FeedbackView, UserView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Dashboard,
    Failure,
}

impl View {
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Login => "login.html",
            Self::Register => "register.html",
            Self::Dashboard => "dashboard.html",
            Self::Failure => "failure.html",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ViewContext {
    pub user: Option<UserView>,
    pub feedback: FeedbackView,
    pub google_enabled: bool,
}

pub trait ViewRenderer: Send + Sync {
    /// # Errors
    /// Template lookup or rendering failures.
    fn render(&self, view: View, context: &ViewContext) -> Result<String>;
}

const TEMPLATES: [(&str, &str); 5] = [
    ("layout.html", include_str!("../../templates/layout.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("register.html", include_str!("../../templates/register.html")),
    ("dashboard.html", include_str!("../../templates/dashboard.html")),
    ("failure.html", include_str!("../../templates/failure.html")),
];

pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Load the embedded templates. A template that fails to parse is logged
    /// and surfaces as a render error for that view only.
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            if let Err(err) = env.add_template(name, source) {
                tracing::error!("failed to load template {name}: {err}");
            }
        }
        Self { env }
    }
}

impl ViewRenderer for TemplateRenderer {
    fn render(&self, view: View, context: &ViewContext) -> Result<String> {
        let name = view.template();
        self.env
            .get_template(name)
            .with_context(|| format!("missing template {name}"))?
            .render(context)
            .with_context(|| format!("failed to render {name}"))
    }
}
