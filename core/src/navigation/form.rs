use tracing::debug;

use super::{ActionSource, NavigationRequest, RequestContext};

pub const ACTION_FIELD: &str = "action";
pub const PATH_FIELD: &str = "path";
pub const FILE_FIELD: &str = "file";

/// Reads the `action` field of a submitted form.
///
/// `action=changePath` takes its target from `path`, `action=downloadFile`
/// from `file`. Anything other than a `POST` classifies as
/// [`NavigationRequest::None`], as does an action missing its field.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormActionSource;

impl ActionSource for FormActionSource {
    fn classify(&self, request: &RequestContext) -> NavigationRequest {
        if !request.is_post() {
            return NavigationRequest::None;
        }
        let request_for = match request.field(ACTION_FIELD) {
            Some("changePath") => target(request, PATH_FIELD).map(NavigationRequest::ChangePath),
            Some("downloadFile") => {
                target(request, FILE_FIELD).map(NavigationRequest::DownloadFile)
            }
            _ => None,
        };
        request_for.unwrap_or(NavigationRequest::None)
    }
}

fn target(request: &RequestContext, field: &str) -> Option<String> {
    let value = request.field(field).map(str::to_string);
    if value.is_none() {
        debug!(field, "Form action without its target field");
    }
    value
}
