use serde::Serialize;

use crate::error::Result;

/// Client identification string sent with every request.
pub const USER_AGENT: &str = "txt-teleop/0.1";

/// An HTTP/1.1 request (RFC 9112 §3).
///
/// Serializes to the standard wire format:
///
/// ```text
/// POST /api/v1/controller/0/motors/1 HTTP/1.1\r\n
/// Host: 192.168.7.2:80\r\n
/// User-Agent: txt-teleop/0.1\r\n
/// Connection: close\r\n
/// X-API-KEY: ...\r\n
/// Content-Type: application/json\r\n
/// Content-Length: 58\r\n
/// \r\n
/// {"enabled":true,...}
/// ```
///
/// Uses a builder pattern: chain [`header`](Self::header) and
/// [`json_body`](Self::json_body), then call [`serialize`](Self::serialize).
/// `Content-Length` is computed automatically when a body is present.
/// Every request asks for `Connection: close`; one connection carries
/// exactly one exchange.
#[must_use]
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: &'static str,
    /// Origin-form target, including any query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: &'static str, target: &str) -> Self {
        HttpRequest {
            method,
            target: target.to_string(),
            headers: vec![
                ("User-Agent".to_string(), USER_AGENT.to_string()),
                ("Connection".to_string(), "close".to_string()),
            ],
            body: None,
        }
    }

    pub fn get(target: &str) -> Self {
        Self::new("GET", target)
    }

    pub fn post(target: &str) -> Self {
        Self::new("POST", target)
    }

    pub fn delete(target: &str) -> Self {
        Self::new("DELETE", target)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body and its `Content-Type`.
    pub fn json_body<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        let mut request = self.header("Content-Type", "application/json");
        request.body = Some(body);
        Ok(request)
    }

    /// Serialize to the HTTP/1.1 wire format for the given `Host`.
    ///
    /// `POST` and `PATCH` requests without a body still carry
    /// `Content-Length: 0`, which some embedded servers require.
    pub fn serialize(&self, host: &str) -> Vec<u8> {
        let mut head = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", self.method, self.target, host);

        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        match &self.body {
            Some(body) => head.push_str(&format!("Content-Length: {}\r\n\r\n", body.len())),
            None if matches!(self.method, "POST" | "PATCH") => head.push_str("Content-Length: 0\r\n\r\n"),
            None => head.push_str("\r\n"),
        }

        let mut wire = head.into_bytes();
        if let Some(body) = &self.body {
            wire.extend_from_slice(body);
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(request: &HttpRequest) -> String {
        String::from_utf8(request.serialize("robot:80")).unwrap()
    }

    #[test]
    fn serialize_get() {
        let request = HttpRequest::get("/api/v1/controller/discovery").header("X-API-KEY", "k");
        let s = as_text(&request);
        assert!(s.starts_with("GET /api/v1/controller/discovery HTTP/1.1\r\nHost: robot:80\r\n"));
        assert!(s.contains("Connection: close\r\n"));
        assert!(s.contains("X-API-KEY: k\r\n"));
        assert!(!s.contains("Content-Length"));
        assert!(s.ends_with("\r\n\r\n"));
    }

    #[test]
    fn serialize_json_body() {
        let request = HttpRequest::post("/api/v1/controller/0/servomotors/1")
            .json_body(&serde_json::json!({ "value": 512 }))
            .unwrap();
        let s = as_text(&request);
        assert!(s.contains("Content-Type: application/json\r\n"));
        assert!(s.contains("Content-Length: 13\r\n"));
        assert!(s.ends_with("\r\n\r\n{\"value\":512}"));
    }

    #[test]
    fn empty_post_has_zero_length() {
        let s = as_text(&HttpRequest::post("/api/v1/controller/0"));
        assert!(s.ends_with("Content-Length: 0\r\n\r\n"));
        let s = as_text(&HttpRequest::new("PATCH", "/api/v1/controller/0/counters/1"));
        assert!(s.ends_with("Content-Length: 0\r\n\r\n"));
        let s = as_text(&HttpRequest::new("DELETE", "/api/v1/controller/camera/stop"));
        assert!(!s.contains("Content-Length"));
    }
}
