// api_utils.rs
use reqwest::{Client, Method, Response};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A single-attempt HTTP call. Build it up with optional basic authentication,
/// query parameters, and a timeout, then `execute()`. There is no retry and no
/// caching; a failed attempt is the caller's cue to degrade to another data
/// source.
pub struct ApiCallBuilder {
    method: String,
    url: String,
    basic_auth: Option<(String, String)>,
    query: Option<JsonValue>,
    timeout: u64,
}

impl ApiCallBuilder {
    pub fn call(method: &str, url: &str) -> Self {
        Self {
            method: method.to_uppercase(),
            url: url.to_string(),
            basic_auth: None,
            query: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        self.basic_auth = Some((username.to_string(), password.to_string()));
        self
    }

    /// Query parameters as a flat JSON object; non-string values are rendered
    /// with their JSON representation.
    pub fn query(mut self, query: JsonValue) -> Self {
        self.query = Some(query);
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Performs the call and returns `(status_code, body_text)` regardless of
    /// the status, so callers that care about specific codes can branch on
    /// them. Transport failures (DNS, refused connection, timeout) are the
    /// only `Err` cases.
    pub async fn execute_with_status(self) -> Result<(u16, String), Box<dyn StdError>> {
        let reqwest_method = match self.method.as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            _ => {
                return Err(Box::new(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "Invalid HTTP method",
                )))
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .build()
            .map_err(|e| Box::new(e) as Box<dyn StdError>)?;
        let mut request_builder = client.request(reqwest_method, &self.url);

        if let Some(query_params_json) = &self.query {
            let query_params = query_params_json
                .as_object()
                .unwrap_or(&Map::new())
                .iter()
                .map(|(k, v)| {
                    let rendered = match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), rendered)
                })
                .collect::<HashMap<_, _>>();
            request_builder = request_builder.query(&query_params);
        }

        if let Some((username, password)) = &self.basic_auth {
            request_builder = request_builder.basic_auth(username, Some(password));
        }

        let response: Response = request_builder
            .send()
            .await
            .map_err(|e| Box::new(e) as Box<dyn StdError>)?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Box::new(e) as Box<dyn StdError>)?;

        Ok((status, body))
    }

    /// Performs the call and returns the body text on a 2xx response. Any
    /// other status becomes an error carrying the code and a truncated body
    /// excerpt.
    pub async fn execute(self) -> Result<String, Box<dyn StdError>> {
        let (status, body) = self.execute_with_status().await?;

        if (200..300).contains(&status) {
            Ok(body)
        } else {
            let excerpt: String = body.chars().take(200).collect();
            Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("API error: {} {}", status, excerpt),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tokio::runtime::Runtime;

    fn spawn_one_shot_server(status_line: &str, body: &str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let status_line = status_line.to_string();
        let body = body.to_string();
        let handle = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{}", addr), handle)
    }

    #[test]
    fn execute_returns_body_on_success() {
        let (base_url, handle) = spawn_one_shot_server("200 OK", "hello");
        let rt = Runtime::new().expect("runtime");
        let body = rt
            .block_on(ApiCallBuilder::call("GET", &base_url).timeout(5).execute())
            .expect("success");
        assert_eq!(body, "hello");
        handle.join().expect("server thread");
    }

    #[test]
    fn execute_surfaces_status_and_excerpt_on_failure() {
        let (base_url, handle) = spawn_one_shot_server("500 Internal Server Error", "boom");
        let rt = Runtime::new().expect("runtime");
        let err = rt
            .block_on(ApiCallBuilder::call("GET", &base_url).timeout(5).execute())
            .expect_err("should fail");
        let message = err.to_string();
        assert!(message.contains("500"), "message: {}", message);
        assert!(message.contains("boom"), "message: {}", message);
        handle.join().expect("server thread");
    }

    #[test]
    fn execute_with_status_reports_non_2xx_without_error() {
        let (base_url, handle) = spawn_one_shot_server("401 Unauthorized", "denied");
        let rt = Runtime::new().expect("runtime");
        let (status, body) = rt
            .block_on(
                ApiCallBuilder::call("GET", &base_url)
                    .basic_auth("user", "pass")
                    .timeout(5)
                    .execute_with_status(),
            )
            .expect("transport ok");
        assert_eq!(status, 401);
        assert_eq!(body, "denied");
        handle.join().expect("server thread");
    }

    #[test]
    fn execute_rejects_unknown_methods() {
        let rt = Runtime::new().expect("runtime");
        let err = rt
            .block_on(ApiCallBuilder::call("BREW", "http://127.0.0.1:1").execute())
            .expect_err("should fail");
        assert!(err.to_string().contains("Invalid HTTP method"));
    }

    #[test]
    fn execute_errors_on_unreachable_host() {
        let rt = Runtime::new().expect("runtime");
        let result = rt.block_on(
            ApiCallBuilder::call("GET", "http://127.0.0.1:1")
                .timeout(2)
                .execute(),
        );
        assert!(result.is_err());
    }
}
