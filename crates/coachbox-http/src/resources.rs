//! Typed handles over backend resource collections.
//!
//! These only shape URLs and bodies. Credentials, refresh and invalidation
//! are the [`SessionManager`]'s business.

use std::fmt::Display;
use std::ops::Deref;

use serde_json::Value;
use tracing::instrument;

use coachbox_core::Result;

use crate::manager::SessionManager;
use crate::request::Request;

/// CRUD over one collection, e.g. `/athletes`.
#[derive(Debug, Clone)]
pub struct ResourceClient {
    session: SessionManager,
    collection: String,
}

impl ResourceClient {
    pub fn new(session: SessionManager, collection: impl Into<String>) -> Self {
        let collection = collection.into().trim_matches('/').to_string();
        Self {
            session,
            collection,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    fn collection_path(&self) -> String {
        format!("/{}", self.collection)
    }

    fn item_path(&self, id: impl Display) -> String {
        format!("/{}/{}", self.collection, id)
    }

    /// `GET /{collection}` with optional filters.
    #[instrument(skip(self, query), fields(collection = %self.collection))]
    pub async fn list(&self, query: &[(&str, &str)]) -> Result<Value> {
        let request = query
            .iter()
            .fold(Request::get(self.collection_path()), |request, (k, v)| {
                request.with_query(*k, *v)
            });
        self.session.send_json(request).await
    }

    #[instrument(skip(self, id), fields(collection = %self.collection, id = %id))]
    pub async fn get(&self, id: impl Display) -> Result<Value> {
        self.session.send_json(Request::get(self.item_path(id))).await
    }

    #[instrument(skip(self, body), fields(collection = %self.collection))]
    pub async fn create(&self, body: Value) -> Result<Value> {
        self.session
            .send_json(Request::post(self.collection_path()).with_json(body))
            .await
    }

    /// Full replacement (`PUT`).
    #[instrument(skip(self, id, body), fields(collection = %self.collection, id = %id))]
    pub async fn update(&self, id: impl Display, body: Value) -> Result<Value> {
        self.session
            .send_json(Request::put(self.item_path(id)).with_json(body))
            .await
    }

    #[instrument(skip(self, id, body), fields(collection = %self.collection, id = %id))]
    pub async fn patch(&self, id: impl Display, body: Value) -> Result<Value> {
        self.session
            .send_json(Request::patch(self.item_path(id)).with_json(body))
            .await
    }

    #[instrument(skip(self, id), fields(collection = %self.collection, id = %id))]
    pub async fn delete(&self, id: impl Display) -> Result<()> {
        self.session
            .send_no_content(Request::delete(self.item_path(id)))
            .await
    }
}

/// Path of the multipart upload endpoint.
pub const VIDEO_UPLOAD: &str = "/videos/upload";

/// `/videos`, plus multipart upload.
#[derive(Debug, Clone)]
pub struct VideosClient {
    resource: ResourceClient,
}

impl VideosClient {
    pub(crate) fn new(session: SessionManager) -> Self {
        Self {
            resource: ResourceClient::new(session, "videos"),
        }
    }

    /// Upload `bytes` as the `file` part, with `fields` as extra text parts.
    #[instrument(skip(self, bytes, fields), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        fields: &[(&str, &str)],
    ) -> Result<Value> {
        self.resource
            .session
            .send_json(Request::upload(VIDEO_UPLOAD, file_name, bytes, fields))
            .await
    }
}

impl Deref for VideosClient {
    type Target = ResourceClient;

    fn deref(&self) -> &ResourceClient {
        &self.resource
    }
}

/// `/users`.
#[derive(Debug, Clone)]
pub struct UsersClient {
    resource: ResourceClient,
}

impl UsersClient {
    pub(crate) fn new(session: SessionManager) -> Self {
        Self {
            resource: ResourceClient::new(session, "users"),
        }
    }

    /// The logged-in user.
    pub async fn me(&self) -> Result<Value> {
        self.resource.get("me").await
    }
}

impl Deref for UsersClient {
    type Target = ResourceClient;

    fn deref(&self) -> &ResourceClient {
        &self.resource
    }
}
