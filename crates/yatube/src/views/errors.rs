//! Site error pages.
use askama::Template;
use salvo::prelude::*;

use crate::auth::DepotViewerExt;
use crate::templates::{Layout, NotFoundTemplate, ServerErrorTemplate};

/// Catcher hoop replacing the default error body with the 404 and 500 pages.
///
/// Other client errors keep salvo's default page.
#[handler]
pub async fn error_page(req: &Request, depot: &Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
    let layout = Layout::new(depot.viewer());
    let page = match res.status_code {
        Some(StatusCode::NOT_FOUND) => NotFoundTemplate {
            layout,
            path: req.uri().path().to_owned(),
        }
        .render(),
        Some(code) if code.is_server_error() => ServerErrorTemplate { layout }.render(),
        _ => return,
    };
    match page {
        Ok(html) => {
            res.render(Text::Html(html));
            ctrl.skip_rest();
        }
        Err(e) => tracing::error!(error = %e, "cannot render error page"),
    }
}
