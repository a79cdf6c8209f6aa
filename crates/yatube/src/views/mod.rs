//! Request handlers.
use askama::Template;
use salvo::prelude::*;

use crate::AppResult;

pub mod about;
pub mod accounts;
pub mod errors;
pub mod follow;
pub mod posts;

/// Renders `template` as the HTML body of `res`.
pub(crate) fn render<T: Template>(res: &mut Response, template: &T) -> AppResult<()> {
    res.render(Text::Html(template.render()?));
    Ok(())
}

/// A `302 Found` to `uri`.
pub(crate) fn found(uri: impl AsRef<str>) -> AppResult<Redirect> {
    Ok(Redirect::with_status_code(StatusCode::FOUND, uri.as_ref())?)
}

/// A path parameter that the router guarantees to exist.
pub(crate) fn param<'a>(req: &'a Request, key: &str) -> AppResult<&'a str> {
    req.params()
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| yatube_core::Error::not_found(format!("path parameter {key}")).into())
}
