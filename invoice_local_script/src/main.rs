//!## Invoice ingest script
//!
//! This is a script to replay a saved SQS event into a DynamoDB table, usually a local emulator.
//!
//! ## Running
//! ```bash
//! invoice-ingest --input /path/to/event.json
//! invoice-ingest --input ~/events/batch.json --endpoint-url http://localhost:4566 --table NotasFiscais
//! ```
//!
//! The input file must hold a single SQS event, `{"Records": [...]}`, the same shape the lambda receives.
//!
use aws_lambda_events::sqs::SqsEvent;
use clap::Parser;
use lambda::{create_dynamodb_client, process_batch, DEFAULT_TABLE_NAME};
use log::{self, LevelFilter};
use simple_logger::SimpleLogger;
use std::error::Error;
use std::fs::read_to_string;
use std::{path::PathBuf, process::exit};

/// # A struct representing the input arguments
#[derive(Parser)]
#[clap(name = "invoice-ingest")]
struct Opt {
    /// SQS event file
    #[clap(long, short, value_parser)]
    input: String,

    /// DynamoDB endpoint
    #[clap(long, short, value_parser, default_value = "http://localhost:4566")]
    endpoint_url: String,

    /// Table name
    #[clap(long, short, value_parser, default_value = DEFAULT_TABLE_NAME)]
    table: String,
}

/// # Read the event file and parse it into an `SqsEvent`
fn read_event(input: &str) -> Result<SqsEvent, Box<dyn Error + Send + Sync>> {
    let event_path: PathBuf = PathBuf::from(shellexpand::full(input)?.to_string());
    let event_json: String = read_to_string(&event_path)?;
    Ok(serde_json::from_str(&event_json)?)
}

async fn ingest(opt: &Opt) -> Result<String, Box<dyn Error + Send + Sync>> {
    let event = read_event(&opt.input)?;
    log::info!("Read {} records from {}", event.records.len(), opt.input);
    let client = create_dynamodb_client(Some(opt.endpoint_url.as_str())).await;
    let response = process_batch(&event, &client, &opt.table).await?;
    Ok(response.body)
}

/// # The entrypoint for the ingest script
#[tokio::main]
async fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();
    let opt = Opt::parse();
    match ingest(&opt).await {
        Ok(body) => log::info!("{body}"),
        Err(err) => {
            log::error!("Error: {err}");
            exit(1);
        }
    }
}
