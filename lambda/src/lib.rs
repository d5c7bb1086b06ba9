//! Invoice ingest lambda
//!
//! This lambda stores the invoices it receives from an SQS queue in a DynamoDB table.
//!
//! Given the following message body:
//! ```json
//! {
//!   "id": "NF-1",
//!   "cliente": "Acme",
//!   "valor": 150.50,
//!   "data_emissao": "2024-01-10"
//! }
//! ```
//! The lambda will:
//! * Build an invoice record, using defaults for any field that is missing
//! * Put the record in the table named by the `INVOICE_TABLE` environment variable, keyed by `id`
//! * Return a single success response once every message in the batch has been stored
//!
//! Any malformed body or failed write fails the whole invocation. Records written before the failure stay written.

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_lambda_events::sqs::{SqsEvent, SqsMessage};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDBClient;
use invoice_lib::InvoiceRecord;
use lambda_runtime::Error;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

pub const DEFAULT_TABLE_NAME: &str = "NotasFiscais";
pub const SUCCESS_MESSAGE: &str = "Nota fiscal gravada com sucesso!";
const DEFAULT_REGION: &str = "us-east-1";

/// # Settings read from the environment at cold start
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub table_name: String,
    pub endpoint_url: Option<String>,
}

impl Config {
    /// Reads `INVOICE_TABLE` and `DYNAMODB_ENDPOINT_URL`.
    pub fn from_env() -> Config {
        let table_name =
            std::env::var("INVOICE_TABLE").unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string());
        let endpoint_url = std::env::var("DYNAMODB_ENDPOINT_URL")
            .ok()
            .filter(|url| !url.is_empty());
        Config {
            table_name,
            endpoint_url,
        }
    }
}

/// # The response returned once per batch
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub status_code: u16,
    pub body: String,
}

impl BatchResponse {
    pub fn success() -> BatchResponse {
        BatchResponse {
            status_code: 200,
            body: json!(SUCCESS_MESSAGE).to_string(),
        }
    }
}

/// # Processes every message in the batch, in order
///
/// Each record is written before the next message is read. The first error stops the batch and is returned.
pub async fn process_batch(
    event: &SqsEvent,
    client: &DynamoDBClient,
    table_name: &str,
) -> Result<BatchResponse, Error> {
    for message in event.records.iter() {
        process_record(message, client, table_name).await?;
    }
    tracing::info!(records = event.records.len(), "Batch stored");
    Ok(BatchResponse::success())
}

/// # Processes the SQS message.
///
/// This will build the invoice record from the message body and put it in the table, overwriting any item with the same `id`.
pub async fn process_record(
    message: &SqsMessage,
    client: &DynamoDBClient,
    table_name: &str,
) -> Result<InvoiceRecord, Error> {
    let record = InvoiceRecord::from_body(message.body.as_deref())?;
    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(to_item(&record)))
        .send()
        .await?;
    tracing::info!(id = %record.id, "Invoice stored");
    Ok(record)
}

/// # Converts a record into a DynamoDB item
pub fn to_item(record: &InvoiceRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(record.id.clone())),
        ("cliente".to_string(), AttributeValue::S(record.client.clone())),
        ("valor".to_string(), AttributeValue::N(record.amount.to_string())),
        (
            "data_emissao".to_string(),
            AttributeValue::S(record.issue_date.clone()),
        ),
    ])
}

/// # Creates a DynamoDB client
pub async fn create_dynamodb_client(potential_endpoint_url: Option<&str>) -> DynamoDBClient {
    let config = aws_config(potential_endpoint_url).await;
    DynamoDBClient::new(&config)
}

/// # Creates an AWS SDK config object
///
/// Without an endpoint url the SDK resolves the regional endpoint.
async fn aws_config(potential_endpoint_url: Option<&str>) -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
    let loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
    match potential_endpoint_url {
        Some(endpoint_url) => loader.endpoint_url(endpoint_url).load().await,
        None => loader.load().await,
    }
}

#[cfg(test)]
mod test {
    use crate::{
        aws_config, create_dynamodb_client, to_item, BatchResponse, Config, SUCCESS_MESSAGE,
    };
    use aws_sdk_dynamodb::types::AttributeValue;
    use invoice_lib::InvoiceRecord;
    use serde_json::Number;

    /// Hides local AWS config files, profiles and endpoint overrides from the SDK.
    fn clear_aws_environment() {
        for name in [
            "AWS_REGION",
            "AWS_DEFAULT_REGION",
            "AWS_PROFILE",
            "AWS_ENDPOINT_URL",
            "AWS_ENDPOINT_URL_DYNAMODB",
        ] {
            std::env::remove_var(name);
        }
        std::env::set_var("AWS_CONFIG_FILE", "/nonexistent/aws/config");
        std::env::set_var("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/aws/credentials");
        std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
    }

    #[tokio::test]
    async fn test_create_client_with_default_region() {
        clear_aws_environment();
        let client = create_dynamodb_client(None).await;
        let config = client.config();

        assert_eq!(config.region().unwrap().to_string(), "us-east-1");
    }

    #[tokio::test]
    async fn test_aws_config_endpoint_url() {
        clear_aws_environment();
        let config_default_endpoint = aws_config(None).await;
        assert!(config_default_endpoint.endpoint_url().is_none());

        let config_custom_endpoint = aws_config(Some("http://localhost:4566")).await;
        assert_eq!(
            config_custom_endpoint.endpoint_url().unwrap(),
            "http://localhost:4566"
        );
    }

    #[test]
    fn test_to_item_uses_stored_attribute_names() {
        let record = InvoiceRecord {
            id: "NF-1".to_string(),
            client: "Acme".to_string(),
            amount: serde_json::from_str::<Number>("150.50").unwrap(),
            issue_date: "2024-01-10".to_string(),
        };
        let item = to_item(&record);

        assert_eq!(item.len(), 4);
        assert_eq!(item["id"], AttributeValue::S("NF-1".to_string()));
        assert_eq!(item["cliente"], AttributeValue::S("Acme".to_string()));
        assert_eq!(item["valor"], AttributeValue::N("150.50".to_string()));
        assert_eq!(
            item["data_emissao"],
            AttributeValue::S("2024-01-10".to_string())
        );
    }

    #[test]
    fn test_to_item_for_default_record() {
        let item = to_item(&InvoiceRecord::default());

        assert_eq!(item["id"], AttributeValue::S("NF-desconhecida".to_string()));
        assert_eq!(
            item["cliente"],
            AttributeValue::S("Desconhecido".to_string())
        );
        assert_eq!(item["valor"], AttributeValue::N("0".to_string()));
        assert_eq!(item["data_emissao"], AttributeValue::S("N/A".to_string()));
    }

    #[test]
    fn test_success_response_serialises_with_status_code() {
        let response = serde_json::to_string(&BatchResponse::success()).unwrap();
        assert_eq!(
            response,
            r#"{"statusCode":200,"body":"\"Nota fiscal gravada com sucesso!\""}"#
        );
    }

    #[test]
    fn test_success_body_is_the_json_encoded_message() {
        let body = BatchResponse::success().body;
        let message: String = serde_json::from_str(&body).unwrap();
        assert_eq!(message, SUCCESS_MESSAGE);
    }

    #[test]
    fn test_to_item_keeps_the_amount_text() {
        for amount in [
            "12345678901234567.89",
            "100000000000000000000001",
            "0.1000000000000000055511151231257827",
        ] {
            let record = InvoiceRecord {
                amount: serde_json::from_str::<Number>(amount).unwrap(),
                ..InvoiceRecord::default()
            };
            assert_eq!(
                to_item(&record)["valor"],
                AttributeValue::N(amount.to_string())
            );
        }
    }

    #[test]
    fn test_config_from_env() {
        std::env::remove_var("INVOICE_TABLE");
        std::env::remove_var("DYNAMODB_ENDPOINT_URL");
        assert_eq!(
            Config::from_env(),
            Config {
                table_name: "NotasFiscais".to_string(),
                endpoint_url: None,
            }
        );

        std::env::set_var("INVOICE_TABLE", "Invoices");
        std::env::set_var("DYNAMODB_ENDPOINT_URL", "http://localhost:4566");
        assert_eq!(
            Config::from_env(),
            Config {
                table_name: "Invoices".to_string(),
                endpoint_url: Some("http://localhost:4566".to_string()),
            }
        );
        std::env::remove_var("INVOICE_TABLE");
        std::env::remove_var("DYNAMODB_ENDPOINT_URL");
    }
}
