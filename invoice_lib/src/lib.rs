//! ## Invoice record library
//!
//! This library contains the invoice record model shared between the lambda and the local ingest script.
//!
//! Given a queue message body such as:
//! ```json
//! {
//!   "id": "NF-1",
//!   "cliente": "Acme",
//!   "valor": 150.50,
//!   "data_emissao": "2024-01-10"
//! }
//! ```
//! it builds an [`InvoiceRecord`], substituting a default for every field that is missing or `null`.
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub const DEFAULT_ID: &str = "NF-desconhecida";
pub const DEFAULT_CLIENT: &str = "Desconhecido";
pub const DEFAULT_ISSUE_DATE: &str = "N/A";

/// # Errors raised while turning a message body into a record
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed message body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

/// # The fields we read from the message body
///
/// Every field is optional, anything else in the body is ignored.
#[derive(Deserialize, Default)]
struct MessageBody {
    id: Option<String>,
    cliente: Option<String>,
    valor: Option<Number>,
    data_emissao: Option<String>,
}

/// # An invoice as it is written to the store
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub id: String,
    pub client: String,
    pub amount: Number,
    pub issue_date: String,
}

impl Default for InvoiceRecord {
    fn default() -> Self {
        InvoiceRecord {
            id: DEFAULT_ID.to_string(),
            client: DEFAULT_CLIENT.to_string(),
            amount: Number::from(0),
            issue_date: DEFAULT_ISSUE_DATE.to_string(),
        }
    }
}

impl InvoiceRecord {
    /// # Builds a record from an optional message body
    ///
    /// A missing body is treated as an empty object, so it produces the default record.
    /// A body that is not a JSON object, or has a field of the wrong type, is an error.
    pub fn from_body(body: Option<&str>) -> Result<InvoiceRecord, IngestError> {
        let message_body: MessageBody = match body {
            Some(json) => {
                let fields: Map<String, Value> = serde_json::from_str(json)?;
                serde_json::from_value(Value::Object(fields))?
            }
            None => MessageBody::default(),
        };
        let defaults = InvoiceRecord::default();
        Ok(InvoiceRecord {
            id: message_body.id.unwrap_or(defaults.id),
            client: message_body.cliente.unwrap_or(defaults.client),
            amount: message_body.valor.unwrap_or(defaults.amount),
            issue_date: message_body.data_emissao.unwrap_or(defaults.issue_date),
        })
    }
}
