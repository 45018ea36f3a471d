//! HTTP client for the backend's auth and resource endpoints.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use coachbox_core::error::{
    AuthError, Error, InvalidInputError, ProtocolError, TransportError,
};
use coachbox_core::{ApiUrl, Credential, LoginCredentials, RefreshToken, Result};

use crate::config::ClientConfig;
use crate::request::{Body, Request};

/// Exchanges user credentials for a [`Credential`].
pub const LOGIN: &str = "/auth/login";

/// Exchanges a refresh token for a new [`Credential`].
pub const REFRESH: &str = "/auth/refresh";

/// Best-effort server-side session termination.
pub const LOGOUT: &str = "/auth/logout";

/// Map a reqwest failure onto the transport taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let err = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(err)
}

/// Error body shape used by the backend (`{"detail": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
}

/// Thin HTTP client. Knows URLs and wire shapes, not session policy.
#[derive(Debug, Clone)]
pub(crate) struct BackendClient {
    http: reqwest::Client,
    api: ApiUrl,
}

impl BackendClient {
    /// Build a client. The cookie store is always on: the backend may pair the
    /// bearer token with a cookie-based marker.
    pub(crate) fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .timeout(config.timeout())
            .cookie_store(true)
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            http,
            api: config.api().clone(),
        })
    }

    pub(crate) fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// `POST /auth/login` with a form-encoded username and password.
    #[instrument(skip(self, credentials), fields(api = %self.api, username = %credentials.username()))]
    pub(crate) async fn login(&self, credentials: &LoginCredentials) -> Result<Credential> {
        let url = self.api.endpoint(LOGIN);
        debug!("Login exchange");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("username", credentials.username()),
                ("password", credentials.password()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::BAD_REQUEST
        {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.handle_response(response).await
    }

    /// `POST /auth/refresh?refresh_token=<token>`.
    #[instrument(skip(self, refresh_token), fields(api = %self.api))]
    pub(crate) async fn refresh(&self, refresh_token: &RefreshToken) -> Result<Credential> {
        let url = self.api.endpoint(REFRESH);
        debug!("Refresh exchange");

        let response = self
            .http
            .post(&url)
            .query(&[("refresh_token", refresh_token.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        self.handle_response(response).await
    }

    /// `POST /auth/logout` with the current bearer token.
    #[instrument(skip(self, credential), fields(api = %self.api))]
    pub(crate) async fn logout(&self, credential: &Credential) -> Result<()> {
        let url = self.api.endpoint(LOGOUT);
        debug!("Logout");

        let response = self
            .http
            .post(&url)
            .headers(auth_headers(credential)?)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(parse_error_response(response).await.into())
        }
    }

    /// Send a resource request with `credential` attached.
    pub(crate) async fn send(
        &self,
        request: Request,
        credential: &Credential,
    ) -> Result<reqwest::Response> {
        let response = self
            .build(request, credential)?
            .send()
            .await
            .map_err(transport_error)?;

        trace!(status = %response.status(), "Backend response");
        Ok(response)
    }

    /// Build the outbound request. JSON bodies get an explicit JSON content
    /// type; multipart bodies keep the boundary type the transport sets.
    pub(crate) fn build(
        &self,
        request: Request,
        credential: &Credential,
    ) -> Result<reqwest::RequestBuilder> {
        let (method, path, query, body) = request.into_parts();
        let url = self.api.endpoint(&path);

        let mut builder = self
            .http
            .request(method, &url)
            .headers(auth_headers(credential)?);

        if !query.is_empty() {
            builder = builder.query(&query);
        }

        let builder = match body {
            Body::Empty => builder,
            Body::Json(value) => {
                let bytes = serde_json::to_vec(&value).map_err(|e| InvalidInputError::Other {
                    message: e.to_string(),
                })?;
                builder
                    .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                    .body(bytes)
            }
            Body::Multipart(form) => builder.multipart(form),
        };

        Ok(builder)
    }

    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "Backend response");

        if status.is_success() {
            response.json::<R>().await.map_err(transport_error)
        } else {
            Err(parse_error_response(response).await.into())
        }
    }
}

/// Authorization header for `credential`, marked sensitive so it is never
/// printed by the transport's debug output.
fn auth_headers(credential: &Credential) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(&credential.authorization())
        .map_err(|_| InvalidInputError::Header {
            name: "authorization",
        })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

/// Turn a non-success response into a [`ProtocolError`].
pub(crate) async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(ErrorResponse {
            detail: Some(serde_json::Value::String(detail)),
        }) => ProtocolError::new(status, Some(detail)),
        Ok(ErrorResponse {
            detail: Some(detail),
        }) => ProtocolError::new(status, Some(detail.to_string())),
        _ => ProtocolError::new(status, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> BackendClient {
        let config = ClientConfig::new(ApiUrl::new("http://localhost:8000").unwrap());
        BackendClient::new(&config).unwrap()
    }

    fn credential() -> Credential {
        Credential::new("access-token", "refresh-token", "bearer")
    }

    #[test]
    fn json_body_sets_json_content_type() {
        let request = Request::post("/athletes").with_json(serde_json::json!({"name": "Ana"}));
        let built = client().build(request, &credential()).unwrap().build().unwrap();

        assert_eq!(built.url().as_str(), "http://localhost:8000/athletes");
        assert_eq!(built.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(built.headers()[AUTHORIZATION], "Bearer access-token");
    }

    #[test]
    fn multipart_body_keeps_transport_content_type() {
        let request =
            Request::upload("/videos/upload", "clip.mp4", b"video".to_vec(), &[("athlete_id", "7")]);
        assert!(request.is_multipart());

        let built = client().build(request, &credential()).unwrap().build().unwrap();
        let content_type = built.headers()[CONTENT_TYPE].to_str().unwrap();

        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(built.headers()[AUTHORIZATION], "Bearer access-token");
    }

    #[test]
    fn empty_body_has_no_content_type() {
        let built = client()
            .build(Request::get("/users/me"), &credential())
            .unwrap()
            .build()
            .unwrap();
        assert!(built.headers().get(CONTENT_TYPE).is_none());
        assert!(built.headers()[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn query_parameters_are_encoded() {
        let request = Request::get("/evaluations")
            .with_query("athlete_id", "7")
            .with_query("q", "left foot");
        let built = client().build(request, &credential()).unwrap().build().unwrap();
        assert_eq!(built.url().query(), Some("athlete_id=7&q=left+foot"));
    }

    #[test]
    fn control_characters_in_token_are_rejected() {
        let bad = Credential::new("bad\ntoken", "r", "bearer");
        let err = client().build(Request::get("/athletes"), &bad).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput(InvalidInputError::Header { .. })
        ));
    }
}
