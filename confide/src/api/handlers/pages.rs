//! Public page handlers.

use axum::response::Html;
use minijinja::context;

use crate::{errors::Error, views};

pub async fn home() -> Result<Html<String>, Error> {
    views::render("home", context! {})
}

pub async fn login_form() -> Result<Html<String>, Error> {
    views::render("login", context! {})
}

pub async fn register_form() -> Result<Html<String>, Error> {
    views::render("register", context! {})
}
