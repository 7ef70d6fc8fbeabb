//! Raw request facts handed to the interceptor.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};

/// What the interceptor needs to know about a request.
///
/// Built once per request by the caller; the interceptor only reads it.
#[derive(Debug, Clone, Default)]
pub struct RequestFacts {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl RequestFacts {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Facts from `http` request parts. Query parameters are decoded from
    /// the URI; headers keep their wire order.
    pub fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        let params = uri.query().map(parse_form).unwrap_or_default();
        let headers = headers
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_string(), value)
            })
            .collect();

        Self {
            method: method.as_str().to_string(),
            uri: uri.path().to_string(),
            headers,
            params,
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as UTF-8 (lossy), `None` when absent or blank.
    pub fn body_text(&self) -> Option<String> {
        let body = self.body.as_ref()?;
        let text = String::from_utf8_lossy(body);
        if text.trim().is_empty() {
            None
        } else {
            Some(text.into_owned())
        }
    }

    /// `"<METHOD> <URI>"`, the label of the request's timing task.
    pub fn task_name(&self) -> String {
        format!("{} {}", self.method, self.uri)
    }
}

/// Decode an `application/x-www-form-urlencoded` string into pairs.
pub fn parse_form(input: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input.as_bytes())
        .into_owned()
        .collect()
}
