use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::domain::{NewProposal, Proposal};
use crate::web::error::ErrorResponse;
use crate::web::handlers;

pub const DOCS_PATH: &str = "/api-docs";
pub const OPENAPI_JSON_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "Proposals API", description = "Submit and browse proposals."),
    paths(handlers::create_proposal, handlers::list_proposals),
    components(schemas(Proposal, NewProposal, ErrorResponse)),
    tags((name = "proposals", description = "Proposal submission"))
)]
pub struct ApiDoc;

/// Interactive explorer at [`DOCS_PATH`] backed by the document at [`OPENAPI_JSON_PATH`].
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(DOCS_PATH).url(OPENAPI_JSON_PATH, ApiDoc::openapi())
}
