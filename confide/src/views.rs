//! Server-rendered page templates.
//!
//! Templates are embedded at compile time and registered once; rendering is
//! a thin collaborator around the auth core, so failures surface as plain
//! internal errors.

use axum::response::Html;
use minijinja::Environment;
use once_cell::sync::Lazy;

use crate::errors::Error;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    // Template names carry no .html suffix, so escaping must be explicit
    env.set_auto_escape_callback(|_name| minijinja::AutoEscape::Html);
    for (name, source) in [
        ("base", include_str!("../templates/base.html")),
        ("home", include_str!("../templates/home.html")),
        ("login", include_str!("../templates/login.html")),
        ("register", include_str!("../templates/register.html")),
        ("secrets", include_str!("../templates/secrets.html")),
        ("submit", include_str!("../templates/submit.html")),
        ("error", include_str!("../templates/error.html")),
    ] {
        env.add_template(name, source)
            .unwrap_or_else(|e| panic!("invalid embedded template {name}: {e}"));
    }
    env
});

/// Render a named template with the given context.
pub fn render(template: &str, ctx: minijinja::Value) -> Result<Html<String>, Error> {
    let tmpl = TEMPLATES.get_template(template).map_err(|e| Error::Internal {
        operation: format!("load template {template}: {e}"),
    })?;
    let body = tmpl.render(ctx).map_err(|e| Error::Internal {
        operation: format!("render template {template}: {e}"),
    })?;
    Ok(Html(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_every_page_renders() {
        for name in ["home", "login", "register", "submit"] {
            let page = render(name, context! {}).unwrap();
            assert!(page.0.contains("<html"), "{name} should render a full page");
        }
    }

    #[test]
    fn test_secrets_page_lists_entries() {
        let secrets = vec![
            context! { author => "Alice", secret => "I like trains" },
            context! { author => "Anonymous", secret => "So do I" },
        ];
        let page = render("secrets", context! { secrets }).unwrap();
        assert!(page.0.contains("I like trains"));
        assert!(page.0.contains("So do I"));
    }

    #[test]
    fn test_unknown_template_is_internal_error() {
        assert!(render("no-such-template", context! {}).is_err());
    }
}
