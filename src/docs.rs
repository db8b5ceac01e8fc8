use utoipa::OpenApi;
use crate::modules::video::dto::*;
use crate::modules::video::model::VideoStatus;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::upload_video,
        crate::modules::video::handler::list_videos,
        crate::modules::video::handler::get_video,
        crate::modules::video::handler::delete_video,
    ),
    components(
        schemas(UploadVideoForm, UploadAccepted, VideoResponse, VideoStatus)
    ),
    tags(
        (name = "Videos", description = "Video upload and transcoding status")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

use utoipa::Modify;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

/// The gateway in front of the service authenticates callers and forwards
/// their id in a header.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                    crate::middleware::owner::OWNER_HEADER,
                ))),
            );
        }
    }
}
