//! Typed backend endpoints.

use tracing::instrument;

use findmypix_core::Result;
use findmypix_core::models::{
    CountResponse, EventIn, EventOut, HealthResponse, ImageOut, ImageUpload, MatchResult, StatKind,
};

use crate::client::BackendClient;
use crate::request::OutboundRequest;

/// Multipart field name the backend reads uploads from.
pub const UPLOAD_FIELD: &str = "file";

pub(crate) const EVENTS: &str = "/events";
pub(crate) const MY_EVENTS: &str = "/events/my";
pub(crate) const HEALTH: &str = "/health";

fn event_path(event_id: i64) -> String {
    format!("/events/{}", event_id)
}

fn images_path(id: i64) -> String {
    format!("/images/{}", id)
}

fn match_path(event_id: i64) -> String {
    format!("/match/{}", event_id)
}

fn stats_path(kind: StatKind) -> String {
    format!("/stats/{}", kind.as_str())
}

fn upload_request(path: String, upload: &ImageUpload) -> OutboundRequest {
    OutboundRequest::post(path).multipart_file(
        UPLOAD_FIELD,
        &upload.file_name,
        &upload.content_type,
        &upload.bytes,
    )
}

impl BackendClient {
    /// List every event.
    pub async fn list_events(&self) -> Result<Vec<EventOut>> {
        self.send_json(OutboundRequest::get(EVENTS)).await
    }

    /// List events created by the signed-in user.
    pub async fn list_my_events(&self) -> Result<Vec<EventOut>> {
        self.send_json(OutboundRequest::get(MY_EVENTS)).await
    }

    pub async fn get_event(&self, event_id: i64) -> Result<EventOut> {
        self.send_json(OutboundRequest::get(event_path(event_id)))
            .await
    }

    #[instrument(skip(self, event), fields(title = %event.title))]
    pub async fn create_event(&self, event: &EventIn) -> Result<EventOut> {
        self.send_json(OutboundRequest::post(EVENTS).json(event)?)
            .await
    }

    #[instrument(skip(self, event))]
    pub async fn update_event(&self, event_id: i64, event: &EventIn) -> Result<EventOut> {
        self.send_json(OutboundRequest::put(event_path(event_id)).json(event)?)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        self.send_empty(OutboundRequest::delete(event_path(event_id)))
            .await
    }

    /// List the images of an event with their detected faces.
    pub async fn list_images(&self, event_id: i64) -> Result<Vec<ImageOut>> {
        self.send_json(OutboundRequest::get(images_path(event_id)))
            .await
    }

    /// Upload an image to an event. The backend detects faces before replying.
    #[instrument(skip(self, upload), fields(file = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(&self, event_id: i64, upload: &ImageUpload) -> Result<ImageOut> {
        self.send_json(upload_request(images_path(event_id), upload))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: i64) -> Result<()> {
        self.send_empty(OutboundRequest::delete(images_path(image_id)))
            .await
    }

    /// Find faces in an event matching the face in `photo`.
    #[instrument(skip(self, photo), fields(file = %photo.file_name))]
    pub async fn match_photo(&self, event_id: i64, photo: &ImageUpload) -> Result<Vec<MatchResult>> {
        self.send_json(upload_request(match_path(event_id), photo))
            .await
    }

    /// Find faces in an event matching an already stored face.
    #[instrument(skip(self))]
    pub async fn match_face(&self, event_id: i64, embedding_id: i64) -> Result<Vec<MatchResult>> {
        let path = format!("{}/{}", match_path(event_id), embedding_id);
        self.send_json(OutboundRequest::get(path)).await
    }

    /// Fetch one of the public counters.
    pub async fn count(&self, kind: StatKind) -> Result<u64> {
        let response: CountResponse = self.send_json(OutboundRequest::get(stats_path(kind))).await?;
        Ok(response.count)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        self.send_json(OutboundRequest::get(HEALTH)).await
    }

    /// URL of a stored image, as found in [`ImageOut::path`].
    pub fn file_url(&self, path: &str) -> String {
        self.api_url()
            .endpoint(&format!("files/{}", path.trim_start_matches('/')))
    }
}
