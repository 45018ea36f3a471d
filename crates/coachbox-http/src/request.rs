//! Per-call request description.

use reqwest::Method;
use reqwest::multipart::{Form, Part};

/// Request body.
#[derive(Debug, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// A JSON document, sent with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// A multipart form. The transport sets its own boundary content type.
    Multipart(Form),
}

/// One call to a backend resource endpoint.
///
/// Built by resource clients and consumed by
/// [`SessionManager::dispatch`](crate::SessionManager::dispatch); never reused.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
}

impl Request {
    /// Create a request with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// `POST path` uploading `bytes` as the `file` part of a multipart form,
    /// with `fields` as extra text parts.
    pub fn upload(
        path: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        fields: &[(&str, &str)],
    ) -> Self {
        let form = fields.iter().fold(Form::new(), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        });
        let form = form.part("file", Part::bytes(bytes).file_name(file_name.into()));
        Self::post(path).with_multipart(form)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_json(mut self, value: serde_json::Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    /// Attach a multipart body.
    #[must_use]
    pub fn with_multipart(mut self, form: Form) -> Self {
        self.body = Body::Multipart(form);
        self
    }

    /// Append a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Returns true for file uploads.
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart(_))
    }

    pub(crate) fn into_parts(self) -> (Method, String, Vec<(String, String)>, Body) {
        (self.method, self.path, self.query, self.body)
    }
}
