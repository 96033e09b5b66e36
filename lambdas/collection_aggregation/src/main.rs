use crate::event_handler::HandlerDeps;
use event_handler::function_handler;
use lambda_runtime::{run, service_fn, Error};
use shared::{
    adapters::{DynamoDbTableCatalog, SqsItemRelay},
    configuration::EnvironmentSource,
};

mod event_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    shared::observability::init_subscriber();
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);
    let sqs_client = aws_sdk_sqs::Client::new(&aws_config);

    let handler_deps = HandlerDeps {
        config_source: EnvironmentSource,
        table_catalog: DynamoDbTableCatalog::new(dynamodb_client),
        item_processor: SqsItemRelay::new(sqs_client),
    };

    run(service_fn(|event| function_handler(&handler_deps, event))).await
}
