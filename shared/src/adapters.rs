use crate::{
    configuration::Configuration,
    core::{ItemProcessor, TableCatalog},
};
use async_trait::async_trait;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;

/// Largest number of entries SQS accepts in one `SendMessageBatch` call.
pub const MAX_BATCH_ENTRIES: usize = 10;

/// Largest combined body size, in bytes, SQS accepts in one `SendMessageBatch` call.
pub const MAX_BATCH_BYTES: usize = 262_144;

#[derive(Debug)]
pub struct DynamoDbTableCatalog {
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl DynamoDbTableCatalog {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client) -> Self {
        Self { dynamodb_client }
    }
}

#[async_trait]
impl TableCatalog for DynamoDbTableCatalog {
    async fn has_table(&self, table_name: &str) -> Result<bool, String> {
        let result = self
            .dynamodb_client
            .describe_table()
            .table_name(table_name)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                let generic_err_msg = format!("Error describing table: {:?}", e);
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    Ok(false)
                } else {
                    Err(generic_err_msg)
                }
            }
        }
    }
}

/// Relays message bodies, in order, to the queue named by the configuration.
#[derive(Debug)]
pub struct SqsItemRelay {
    sqs_client: aws_sdk_sqs::Client,
}

impl SqsItemRelay {
    pub fn new(sqs_client: aws_sdk_sqs::Client) -> Self {
        Self { sqs_client }
    }
}

#[async_trait]
impl ItemProcessor for SqsItemRelay {
    #[tracing::instrument(skip(self, config, bodies), fields(queue_url = %config.queue_url, items = bodies.len()))]
    async fn process_items(
        &self,
        config: &Configuration,
        bodies: Vec<String>,
    ) -> Result<(), String> {
        for entries in build_batches(bodies)? {
            let output = self
                .sqs_client
                .send_message_batch()
                .queue_url(&config.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|e| format!("Error sending message batch: {:?}", e))?;

            let failed: Vec<String> = output
                .failed()
                .iter()
                .map(|entry| format!("{} ({})", entry.id(), entry.code()))
                .collect();
            if !failed.is_empty() {
                return Err(format!("Failed to relay entries: {}", failed.join(", ")));
            }

            tracing::debug!("Relayed {} entries", output.successful().len());
        }

        Ok(())
    }
}

/// Splits the bodies into SQS batches bounded by entry count and combined body size.
/// Entry ids are the position of the body in the invocation. SQS rejects empty bodies,
/// so those are skipped.
pub fn build_batches(bodies: Vec<String>) -> Result<Vec<Vec<SendMessageBatchRequestEntry>>, String> {
    let mut batches: Vec<Vec<SendMessageBatchRequestEntry>> = Vec::new();
    let mut batch_bytes = 0;

    for (index, body) in bodies.into_iter().enumerate() {
        if body.is_empty() {
            tracing::warn!("Skipping empty message body at position {}", index);
            continue;
        }

        let body_bytes = body.len();
        let entry = SendMessageBatchRequestEntry::builder()
            .id(index.to_string())
            .message_body(body)
            .build()
            .map_err(|e| format!("Error building batch entry {}: {:?}", index, e))?;

        match batches.last_mut() {
            Some(batch)
                if batch.len() < MAX_BATCH_ENTRIES
                    && batch_bytes + body_bytes <= MAX_BATCH_BYTES =>
            {
                batch_bytes += body_bytes;
                batch.push(entry);
            }
            _ => {
                batch_bytes = body_bytes;
                batches.push(vec![entry]);
            }
        }
    }

    Ok(batches)
}
