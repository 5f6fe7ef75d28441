//! Scripted in-memory device API for tests and dry runs.

use super::{ApiError, DeviceApi, PublishOutcome};
use crate::remote::ConfigResponse;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Device API that replays queued config replies.
///
/// When the queue runs dry every further fetch fails with a transport
/// error, which ends a polling loop.
#[derive(Debug)]
pub struct MockDeviceApi {
    config_replies: RefCell<VecDeque<Result<ConfigResponse, ApiError>>>,
    publish_status: Cell<u16>,
    fetched_versions: RefCell<Vec<String>>,
    published: RefCell<Vec<String>>,
    bearers: RefCell<Vec<String>>,
}

impl Default for MockDeviceApi {
    fn default() -> Self {
        Self {
            config_replies: RefCell::new(VecDeque::new()),
            publish_status: Cell::new(200),
            fetched_versions: RefCell::new(Vec::new()),
            published: RefCell::new(Vec::new()),
            bearers: RefCell::new(Vec::new()),
        }
    }
}

impl MockDeviceApi {
    /// Empty queues; publishes succeed with HTTP 200.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful config reply.
    pub fn push_config(&self, version: &str, binary_data: Option<&str>) {
        self.config_replies.borrow_mut().push_back(Ok(ConfigResponse {
            version: version.to_string(),
            binary_data: binary_data.map(str::to_string),
        }));
    }

    /// Queues a non-200 config reply.
    pub fn push_config_status(&self, code: u16) {
        self.config_replies
            .borrow_mut()
            .push_back(Err(ApiError::Status {
                code,
                body: String::new(),
            }));
    }

    /// Sets the status returned by every publish call.
    pub fn set_publish_status(&self, status: u16) {
        self.publish_status.set(status);
    }

    /// `local_version` of every config fetch, in order.
    pub fn fetched_versions(&self) -> Vec<String> {
        self.fetched_versions.borrow().clone()
    }

    /// Payload of every publish call, in order.
    pub fn published(&self) -> Vec<String> {
        self.published.borrow().clone()
    }

    /// Authorization header of every call, in order.
    pub fn bearers(&self) -> Vec<String> {
        self.bearers.borrow().clone()
    }
}

impl DeviceApi for MockDeviceApi {
    fn get_config(&self, bearer: &str, local_version: &str) -> Result<ConfigResponse, ApiError> {
        self.bearers.borrow_mut().push(bearer.to_string());
        self.fetched_versions
            .borrow_mut()
            .push(local_version.to_string());
        self.config_replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted reply".to_string())))
    }

    fn publish_event(&self, bearer: &str, binary_data: &str) -> Result<PublishOutcome, ApiError> {
        self.bearers.borrow_mut().push(bearer.to_string());
        self.published.borrow_mut().push(binary_data.to_string());
        Ok(PublishOutcome {
            status: self.publish_status.get(),
            body: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order() {
        let api = MockDeviceApi::new();
        api.push_config("1", None);
        api.push_config_status(503);

        assert_eq!(api.get_config("Bearer a", "0").unwrap().version, "1");
        assert!(matches!(
            api.get_config("Bearer b", "1"),
            Err(ApiError::Status { code: 503, .. })
        ));
        assert!(matches!(
            api.get_config("Bearer c", "1"),
            Err(ApiError::Transport(_))
        ));
        assert_eq!(api.fetched_versions(), vec!["0", "1", "1"]);
    }

    #[test]
    fn test_publish_records_payload() {
        let api = MockDeviceApi::new();
        api.set_publish_status(500);

        let outcome = api.publish_event("Bearer a", "AA==").unwrap();
        assert!(!outcome.is_success());
        assert_eq!(api.published(), vec!["AA=="]);
    }
}
