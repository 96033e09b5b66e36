use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::EntrypointError;

/// Environment variables every invocation needs, in the order they are checked.
pub const REQUIRED_VARIABLES: [&str; 5] = [
    "ENTITY_TABLE_NAME",
    "AWS_REGION",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "QUEUE_URL",
];

/// Where an invocation reads its settings from.
pub trait ConfigurationSource {
    fn snapshot(&self) -> Figment;
}

/// Reads the process environment each time a snapshot is taken.
///
/// Values are kept as the raw strings the environment holds, so `true`, `[x]` or
/// whitespace stay text instead of being parsed into other figment values.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn snapshot(&self) -> Figment {
        let values: BTreeMap<String, String> = Env::raw()
            .only(&REQUIRED_VARIABLES)
            .iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect();

        Figment::from(Serialized::defaults(values))
    }
}

impl ConfigurationSource for Figment {
    fn snapshot(&self) -> Figment {
        self.clone()
    }
}

#[derive(Default, Debug, Deserialize)]
struct RawConfiguration {
    entity_table_name: Option<String>,
    aws_region: Option<String>,
    aws_access_key_id: Option<String>,
    aws_secret_access_key: Option<String>,
    queue_url: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    pub entity_table_name: String,
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub queue_url: String,
}

impl Configuration {
    pub fn load() -> Result<Self, EntrypointError> {
        Configuration::resolve(&EnvironmentSource)
    }

    /// Extracts a snapshot from `source` and checks the required values in order,
    /// stopping at the first one that is missing or empty.
    pub fn resolve<S: ConfigurationSource + ?Sized>(source: &S) -> Result<Self, EntrypointError> {
        let raw: RawConfiguration =
            source
                .snapshot()
                .extract()
                .map_err(|e| EntrypointError::InvalidConfiguration {
                    variable: e
                        .path
                        .last()
                        .map(|key| key.to_uppercase())
                        .unwrap_or_else(|| "configuration".to_string()),
                    reason: e.to_string(),
                })?;

        Ok(Configuration {
            entity_table_name: require(raw.entity_table_name, REQUIRED_VARIABLES[0])?,
            aws_region: require(raw.aws_region, REQUIRED_VARIABLES[1])?,
            aws_access_key_id: require(raw.aws_access_key_id, REQUIRED_VARIABLES[2])?,
            aws_secret_access_key: require(raw.aws_secret_access_key, REQUIRED_VARIABLES[3])?,
            queue_url: require(raw.queue_url, REQUIRED_VARIABLES[4])?,
        })
    }
}

fn require(value: Option<String>, variable: &str) -> Result<String, EntrypointError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(EntrypointError::Configuration {
            variable: variable.to_string(),
        }),
    }
}

// Keeps the secret key out of the logs.
impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("entity_table_name", &self.entity_table_name)
            .field("aws_region", &self.aws_region)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .field("queue_url", &self.queue_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use figment::{providers::Serialized, Figment};
    use serde_json::json;

    use crate::configuration::{Configuration, REQUIRED_VARIABLES};
    use crate::error::EntrypointError;

    fn set_all_variables(jail: &mut figment::Jail) {
        jail.set_env("ENTITY_TABLE_NAME", "entity-table");
        jail.set_env("AWS_REGION", "eu-west-2");
        jail.set_env("AWS_ACCESS_KEY_ID", "AKIAEXAMPLE");
        jail.set_env("AWS_SECRET_ACCESS_KEY", "secret-example");
        jail.set_env("QUEUE_URL", "https://sqs.eu-west-2.amazonaws.com/123456789012/items");
    }

    #[test]
    fn when_all_variables_set_should_load() {
        figment::Jail::expect_with(|jail| {
            set_all_variables(jail);

            let config = Configuration::load().unwrap();

            assert_eq!(config.entity_table_name, "entity-table");
            assert_eq!(config.aws_region, "eu-west-2");
            assert_eq!(config.aws_access_key_id, "AKIAEXAMPLE");
            assert_eq!(config.aws_secret_access_key, "secret-example");
            assert_eq!(
                config.queue_url,
                "https://sqs.eu-west-2.amazonaws.com/123456789012/items"
            );

            Ok(())
        });
    }

    #[test]
    fn when_region_is_empty_should_name_it() {
        figment::Jail::expect_with(|jail| {
            set_all_variables(jail);
            jail.set_env("AWS_REGION", "");

            let result = Configuration::load();

            assert_eq!(
                result,
                Err(EntrypointError::Configuration {
                    variable: "AWS_REGION".to_string()
                })
            );

            Ok(())
        });
    }

    #[test]
    fn values_that_look_like_other_types_should_load_as_text() {
        figment::Jail::expect_with(|jail| {
            set_all_variables(jail);
            jail.set_env("AWS_SECRET_ACCESS_KEY", "true");
            jail.set_env("AWS_ACCESS_KEY_ID", "[abc]");
            jail.set_env("ENTITY_TABLE_NAME", "20240101");
            jail.set_env("AWS_REGION", "{eu}");

            let config = Configuration::load().unwrap();

            assert_eq!(config.aws_secret_access_key, "true");
            assert_eq!(config.aws_access_key_id, "[abc]");
            assert_eq!(config.entity_table_name, "20240101");
            assert_eq!(config.aws_region, "{eu}");

            Ok(())
        });
    }

    #[test]
    fn whitespace_value_counts_as_set() {
        figment::Jail::expect_with(|jail| {
            set_all_variables(jail);
            jail.set_env("AWS_SECRET_ACCESS_KEY", "   ");

            let config = Configuration::load().unwrap();

            assert_eq!(config.aws_secret_access_key, "   ");

            Ok(())
        });
    }

    #[test]
    fn when_value_cannot_be_read_as_text_should_report_invalid_not_missing() {
        let values = json!({
            "entity_table_name": "entity-table",
            "aws_region": "eu-west-2",
            "aws_access_key_id": "AKIAEXAMPLE",
            "aws_secret_access_key": "secret-example",
            "queue_url": { "nested": "value" },
        });

        let result = Configuration::resolve(&Figment::from(Serialized::defaults(values)));

        assert!(matches!(
            result,
            Err(EntrypointError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn when_each_variable_is_missing_should_name_it() {
        for missing in REQUIRED_VARIABLES {
            let mut values = json!({
                "entity_table_name": "entity-table",
                "aws_region": "eu-west-2",
                "aws_access_key_id": "AKIAEXAMPLE",
                "aws_secret_access_key": "secret-example",
                "queue_url": "https://sqs.eu-west-2.amazonaws.com/123456789012/items",
            });
            values
                .as_object_mut()
                .unwrap()
                .remove(&missing.to_lowercase());

            let result = Configuration::resolve(&Figment::from(Serialized::defaults(values)));

            assert_eq!(
                result,
                Err(EntrypointError::Configuration {
                    variable: missing.to_string()
                })
            );
        }
    }

    #[test]
    fn when_several_variables_are_missing_should_report_the_first_in_order() {
        let values = json!({
            "entity_table_name": "entity-table",
            "aws_access_key_id": "AKIAEXAMPLE",
        });

        let result = Configuration::resolve(&Figment::from(Serialized::defaults(values)));

        assert_eq!(
            result,
            Err(EntrypointError::Configuration {
                variable: "AWS_REGION".to_string()
            })
        );
    }

    #[test]
    fn debug_output_should_not_contain_the_secret() {
        let config = Configuration {
            entity_table_name: "entity-table".to_string(),
            aws_region: "eu-west-2".to_string(),
            aws_access_key_id: "AKIAEXAMPLE".to_string(),
            aws_secret_access_key: "secret-example".to_string(),
            queue_url: "queue".to_string(),
        };

        let output = format!("{:?}", config);

        assert!(!output.contains("secret-example"));
        assert!(output.contains("entity-table"));
    }
}
