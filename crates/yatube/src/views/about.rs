//! Static pages.
use salvo::prelude::*;

use super::render;
use crate::AppResult;
use crate::auth::DepotViewerExt;
use crate::templates::{AboutAuthorTemplate, AboutTechTemplate, Layout};

/// `GET /about/author/`
#[handler]
pub async fn author(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    render(
        res,
        &AboutAuthorTemplate {
            layout: Layout::new(depot.viewer()),
        },
    )
}

/// `GET /about/tech/`
#[handler]
pub async fn tech(depot: &mut Depot, res: &mut Response) -> AppResult<()> {
    render(
        res,
        &AboutTechTemplate {
            layout: Layout::new(depot.viewer()),
        },
    )
}
