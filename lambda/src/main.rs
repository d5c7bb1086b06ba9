use aws_lambda_events::event::sqs::SqsEvent;
use aws_sdk_dynamodb::Client as DynamoDBClient;
use lambda::{BatchResponse, Config};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};

async fn function_handler(
    client: &DynamoDBClient,
    config: &Config,
    event: LambdaEvent<SqsEvent>,
) -> Result<BatchResponse, Error> {
    lambda::process_batch(&event.payload, client, &config.table_name).await
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = &Config::from_env();
    let client = &lambda::create_dynamodb_client(config.endpoint_url.as_deref()).await;
    tracing::info!(table = %config.table_name, "Client initialised");

    run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        function_handler(client, config, event).await
    }))
    .await
}
