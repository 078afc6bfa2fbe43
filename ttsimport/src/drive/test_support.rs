//! Wiremock helpers shared by the mirror, share and importer tests.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub(crate) const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Answers every sub-request of a permission batch, failing the listed ids.
pub(crate) struct BatchResponder {
    pub failing: Vec<String>,
}

impl Respond for BatchResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut out = String::new();
        for (index, id) in batch_target_ids(request).into_iter().enumerate() {
            let (status, payload) = if self.failing.contains(&id) {
                (403, r#"{"error":{"code":403,"message":"sharing disabled"}}"#)
            } else {
                (200, r#"{"type":"anyone","role":"reader"}"#)
            };
            out.push_str(&format!(
                "--resp\r\nContent-Type: application/http\r\nContent-ID: <response-item-{index}>\r\n\r\n\
HTTP/1.1 {status} X\r\n\r\n{payload}\r\n"
            ));
        }
        out.push_str("--resp--\r\n");
        ResponseTemplate::new(200).set_body_raw(out, "multipart/mixed; boundary=resp")
    }
}

/// Ids targeted by a batch request body, in order.
pub(crate) fn batch_target_ids(request: &Request) -> Vec<String> {
    String::from_utf8_lossy(&request.body)
        .lines()
        .filter_map(|line| line.strip_prefix("POST /drive/v3/files/"))
        .map(|rest| rest.trim_end_matches("/permissions").to_string())
        .collect()
}

pub(crate) async fn mount_batch(server: &MockServer, failing: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/batch/drive/v3"))
        .respond_with(BatchResponder {
            failing: failing.iter().map(|s| s.to_string()).collect(),
        })
        .mount(server)
        .await;
}

pub(crate) async fn mount_file(server: &MockServer, id: &str, name: &str, mime: &str, trashed: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/drive/v3/files/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "name": name,
            "mimeType": mime,
            "trashed": trashed
        })))
        .mount(server)
        .await;
}

pub(crate) async fn mount_children(server: &MockServer, parent: &str, files: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param(
            "q",
            format!("'{parent}' in parents and trashed=false"),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": files })))
        .mount(server)
        .await;
}
