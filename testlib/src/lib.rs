//! # Test library functions
//!
//! These are common functions used in the integration tests for the script and for the lambda.
use assert_fs::TempDir;
use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use serde_json::{json, Value};
use std::fs::write;
use std::path::PathBuf;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PUT_ITEM_TARGET: &str = "DynamoDB_20120810.PutItem";

/// # Sets dummy credentials so the SDK can sign requests to the mock server
pub fn set_test_credentials() {
    std::env::set_var("AWS_ACCESS_KEY_ID", "test");
    std::env::set_var("AWS_SECRET_ACCESS_KEY", "test");
    std::env::set_var("AWS_REGION", "us-east-1");
}

/// # A message with the given body
pub fn message(body: Option<&str>) -> SqsMessage {
    SqsMessage {
        body: body.map(str::to_string),
        ..Default::default()
    }
}

/// # An SQS event holding one message per body, in order
pub fn sqs_event(bodies: &[Option<&str>]) -> SqsEvent {
    let records: Vec<Value> = bodies
        .iter()
        .enumerate()
        .map(|(index, body)| {
            let mut record = json!({
                "messageId": format!("message-{index}"),
                "eventSource": "aws:sqs",
            });
            if let Some(body) = body {
                record["body"] = json!(body);
            }
            record
        })
        .collect();
    serde_json::from_value(json!({ "Records": records })).unwrap()
}

/// # Writes an SQS event with the given bodies to a file in `dir`
pub fn create_event_file(dir: &TempDir, bodies: &[Option<&str>]) -> PathBuf {
    let event_path = dir.join("event.json");
    let event = serde_json::to_string(&sqs_event(bodies)).unwrap();
    write(&event_path, event).unwrap();
    event_path
}

/// # Mounts a PutItem handler on the mock server answering with `status`
pub async fn mount_put_item(server: &MockServer, status: u16) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_raw("{}", "application/x-amz-json-1.0")
    } else {
        ResponseTemplate::new(status).set_body_raw(
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ResourceNotFoundException","message":"Requested resource not found"}"#,
            "application/x-amz-json-1.0",
        )
    };
    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("x-amz-target", PUT_ITEM_TARGET))
        .respond_with(response)
        .mount(server)
        .await;
}

/// # The PutItem request bodies received by the mock server, in order
pub async fn put_item_requests(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| {
            request
                .headers
                .get("x-amz-target")
                .and_then(|target| target.to_str().ok())
                == Some(PUT_ITEM_TARGET)
        })
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

/// # A complete, valid invoice body
pub fn valid_body() -> &'static str {
    r#"{"id":"NF-1","cliente":"Acme","valor":150.50,"data_emissao":"2024-01-10"}"#
}

/// # The PutItem request we expect for `valid_body`
pub fn valid_put_item_request(table_name: &str) -> Value {
    json!({
        "TableName": table_name,
        "Item": {
            "id": {"S": "NF-1"},
            "cliente": {"S": "Acme"},
            "valor": {"N": "150.50"},
            "data_emissao": {"S": "2024-01-10"}
        }
    })
}

/// # The PutItem request we expect for a message without a body
pub fn default_put_item_request(table_name: &str) -> Value {
    json!({
        "TableName": table_name,
        "Item": {
            "id": {"S": "NF-desconhecida"},
            "cliente": {"S": "Desconhecido"},
            "valor": {"N": "0"},
            "data_emissao": {"S": "N/A"}
        }
    })
}
