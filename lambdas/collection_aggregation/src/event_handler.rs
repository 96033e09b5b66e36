use aws_lambda_events::sqs::SqsMessage;
use lambda_runtime::{Error, LambdaEvent};
use serde::Deserialize;
use shared::{
    configuration::{Configuration, ConfigurationSource},
    core::{ItemProcessor, TableCatalog},
    error::EntrypointError,
};

/// SQS trigger payload. `Records` is optional here so a missing collection reaches the
/// handler and is reported instead of failing deserialization in the runtime.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct InvocationEvent {
    #[serde(rename = "Records", default)]
    pub records: Option<Vec<SqsMessage>>,
}

pub(crate) struct HandlerDeps<S: ConfigurationSource, T: TableCatalog, P: ItemProcessor> {
    pub config_source: S,
    pub table_catalog: T,
    pub item_processor: P,
}

#[tracing::instrument(skip(deps, event), fields(request_id = %event.context.request_id))]
pub(crate) async fn function_handler<S: ConfigurationSource, T: TableCatalog, P: ItemProcessor>(
    deps: &HandlerDeps<S, T, P>,
    event: LambdaEvent<InvocationEvent>,
) -> Result<(), Error> {
    match guard_and_forward(deps, event.payload).await {
        Ok(forwarded) => tracing::info!(forwarded, "Invocation complete"),
        // The invocation never fails back to SQS; the error is only logged.
        Err(e) => tracing::error!(error = ?e, "{}", e),
    }

    Ok(())
}

/// Runs the smoke checks in order and, if they all pass, hands the bodies to the processor.
/// Returns how many bodies were forwarded.
pub(crate) async fn guard_and_forward<S: ConfigurationSource, T: TableCatalog, P: ItemProcessor>(
    deps: &HandlerDeps<S, T, P>,
    event: InvocationEvent,
) -> Result<usize, EntrypointError> {
    let config = Configuration::resolve(&deps.config_source)?;

    let has_table = deps
        .table_catalog
        .has_table(&config.entity_table_name)
        .await
        .map_err(|reason| EntrypointError::TableCheck {
            table_name: config.entity_table_name.clone(),
            reason,
        })?;
    if !has_table {
        return Err(EntrypointError::ResourceNotFound {
            table_name: config.entity_table_name,
        });
    }

    let Some(records) = event.records else {
        return Err(EntrypointError::MalformedEvent);
    };

    tracing::info!("processing items");
    let bodies = message_bodies(records);
    let forwarded = bodies.len();

    deps.item_processor
        .process_items(&config, bodies)
        .await
        .map_err(EntrypointError::Processing)?;

    Ok(forwarded)
}

fn message_bodies(records: Vec<SqsMessage>) -> Vec<String> {
    records
        .into_iter()
        .map(|record| record.body.unwrap_or_default())
        .collect()
}
