#![allow(dead_code)]

use std::time::Duration;

use bqlkkt_content::CmsClient;
use serde_json::{json, Value};
use wiremock::MockServer;

pub fn cms_client(server: &MockServer) -> CmsClient {
    CmsClient::new(server.uri(), Duration::from_secs(5)).expect("cliente del CMS")
}

pub fn node(kind: &str, id: &str, attributes: Value) -> Value {
    json!({ "id": id, "type": kind, "attributes": attributes })
}

pub fn collection(data: Vec<Value>) -> Value {
    let count = data.len();
    json!({ "data": data, "included": [], "meta": { "count": count } })
}

pub fn jsonapi(body: Value) -> wiremock::ResponseTemplate {
    wiremock::ResponseTemplate::new(200).set_body_json(body)
}

pub fn menu_response(label: &str, path: &str) -> Value {
    json!({
        "data": {
            "menuByName": {
                "links": [
                    { "link": { "label": label, "url": { "path": path }, "expanded": false }, "subtree": [] }
                ]
            }
        }
    })
}
