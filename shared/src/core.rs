use crate::configuration::Configuration;
use async_trait::async_trait;
use std::fmt::Debug;

#[cfg(any(test, feature = "mocks"))]
use mockall::automock;

/// Answers whether a storage table is available to this function.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait TableCatalog: Debug + Send + Sync {
    async fn has_table(&self, table_name: &str) -> Result<bool, String>;
}

/// Receives the message bodies of an invocation once every precondition has passed.
#[cfg_attr(any(test, feature = "mocks"), automock)]
#[async_trait]
pub trait ItemProcessor: Debug + Send + Sync {
    async fn process_items(
        &self,
        config: &Configuration,
        bodies: Vec<String>,
    ) -> Result<(), String>;
}
