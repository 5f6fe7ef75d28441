//! Blocking HTTP implementation of the device API.

use super::{ApiError, DeviceApi, PublishOutcome};
use crate::device::DevicePath;
use crate::remote::ConfigResponse;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct PublishEventRequest<'a> {
    #[serde(rename = "binaryData")]
    binary_data: &'a str,
}

/// Device API client on top of `ureq`.
pub struct HttpDeviceApi {
    agent: ureq::Agent,
    base_url: String,
    device: DevicePath,
}

impl HttpDeviceApi {
    /// Creates a client for `device` under `base_url`. `timeout` bounds
    /// each whole request.
    pub fn new(base_url: impl Into<String>, device: DevicePath, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into(),
            device,
        }
    }

    /// Device this client talks for.
    pub fn device(&self) -> &DevicePath {
        &self.device
    }

    fn request(&self, method: &str, url: &str, bearer: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", bearer)
            .set("Content-Type", "application/json")
            .set("Cache-Control", "no-cache")
    }
}

impl DeviceApi for HttpDeviceApi {
    fn get_config(&self, bearer: &str, local_version: &str) -> Result<ConfigResponse, ApiError> {
        let url = self.device.config_url(&self.base_url);
        tracing::debug!(%url, local_version, "Fetching device config");

        match self
            .request("GET", &url, bearer)
            .query("local_version", local_version)
            .call()
        {
            Ok(resp) => {
                let code = resp.status();
                let body = resp.into_string()?;
                // 2xx other than 200 (e.g. 204) is still not a config.
                if code != 200 {
                    return Err(ApiError::Status { code, body });
                }
                Ok(serde_json::from_str(&body)?)
            }
            Err(ureq::Error::Status(code, resp)) => Err(ApiError::Status {
                code,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(ApiError::Transport(e.to_string())),
        }
    }

    fn publish_event(&self, bearer: &str, binary_data: &str) -> Result<PublishOutcome, ApiError> {
        let url = self.device.publish_event_url(&self.base_url);
        let body = serde_json::to_string(&PublishEventRequest { binary_data })?;
        tracing::debug!(%url, bytes = body.len(), "Publishing event");

        match self.request("POST", &url, bearer).send_string(&body) {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.into_string()?;
                Ok(PublishOutcome { status, body })
            }
            Err(ureq::Error::Status(status, resp)) => Ok(PublishOutcome {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(ApiError::Transport(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Serves one canned response on loopback and hands back the raw
    /// request it received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&stream);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (format!("http://{addr}/v1"), handle)
    }

    fn read_request(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut request = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            request.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }

        let content_length = request
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();
        request.push_str(&String::from_utf8(body).unwrap());
        request
    }

    fn client(base_url: &str) -> HttpDeviceApi {
        let device = DevicePath::new("proj", "asia-east1", "carts", "pi-01").unwrap();
        HttpDeviceApi::new(base_url, device, Duration::from_secs(5))
    }

    fn assert_common_headers(request: &str) {
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("\r\nauthorization: bearer tok\r\n"), "{request}");
        assert!(lower.contains("\r\ncontent-type: application/json\r\n"), "{request}");
        assert!(lower.contains("\r\ncache-control: no-cache\r\n"), "{request}");
    }

    #[test]
    fn test_get_config_ok() {
        let (base_url, server) = serve_once("200 OK", r#"{"version": "3", "binaryData": "e30="}"#);

        let response = client(&base_url).get_config("Bearer tok", "2").unwrap();
        assert_eq!(response.version, "3");
        assert_eq!(response.binary_data.as_deref(), Some("e30="));

        let request = server.join().unwrap();
        assert!(request.starts_with(
            "GET /v1/projects/proj/locations/asia-east1/registries/carts/devices/pi-01\
             /config?local_version=2 HTTP/1.1\r\n"
        ));
        assert_common_headers(&request);
    }

    #[test]
    fn test_get_config_non_200_is_status_error() {
        let (base_url, server) = serve_once("403 Forbidden", "nope");

        let result = client(&base_url).get_config("Bearer tok", "0");
        assert!(matches!(
            result,
            Err(ApiError::Status { code: 403, ref body }) if body == "nope"
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_get_config_2xx_without_config_is_error() {
        let (base_url, server) = serve_once("202 Accepted", "");

        assert!(matches!(
            client(&base_url).get_config("Bearer tok", "0"),
            Err(ApiError::Status { code: 202, .. })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_local_version_is_query_encoded() {
        let (base_url, server) = serve_once("200 OK", r#"{"version": "v 1&a=b"}"#);

        client(&base_url).get_config("Bearer tok", "v 1&a=b").unwrap();

        let request = server.join().unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.contains("?local_version=v+1%26a%3Db "), "{request_line}");
    }

    #[test]
    fn test_publish_event_sends_payload() {
        let (base_url, server) = serve_once("200 OK", "{}");

        let outcome = client(&base_url).publish_event("Bearer tok", "_9j_4A==").unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.body, "{}");

        let request = server.join().unwrap();
        assert!(request.starts_with(
            "POST /v1/projects/proj/locations/asia-east1/registries/carts/devices/pi-01\
             :publishEvent HTTP/1.1\r\n"
        ));
        assert_common_headers(&request);
        assert!(request.ends_with(r#"{"binaryData":"_9j_4A=="}"#));
    }

    #[test]
    fn test_publish_event_non_200_is_outcome() {
        let (base_url, server) = serve_once("500 Internal Server Error", "backend down");

        let outcome = client(&base_url).publish_event("Bearer tok", "AA==").unwrap();
        assert_eq!(
            outcome,
            PublishOutcome {
                status: 500,
                body: "backend down".into(),
            }
        );
        assert!(!outcome.is_success());
        server.join().unwrap();
    }

    #[test]
    fn test_publish_body_shape() {
        let body = serde_json::to_string(&PublishEventRequest {
            binary_data: "_9j_4A==",
        })
        .unwrap();
        assert_eq!(body, r#"{"binaryData":"_9j_4A=="}"#);
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let device = DevicePath::new("p", "l", "r", "d").unwrap();
        // Port 9 on loopback: connection refused, no network needed.
        let api = HttpDeviceApi::new("http://127.0.0.1:9/v1", device, Duration::from_secs(2));

        assert!(matches!(
            api.get_config("Bearer x", "0"),
            Err(ApiError::Transport(_))
        ));
        assert!(matches!(
            api.publish_event("Bearer x", "AA=="),
            Err(ApiError::Transport(_))
        ));
    }
}
