//! @ai:module:intent Results service client for unique names and execution ages
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResultsServiceTrait, ResultsServiceClient, OfflineResultsService, UniqueNameRequestItem
//! @ai:module:stateless false

use crate::config::ServiceConfig;
use crate::definition::Variables;
use crate::error::{LoadError, Result};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

pub const UNIQUE_NAMES_PATH: &str = "v1/benchmark/generate-unique-names";
pub const EXECUTION_AGES_PATH: &str = "v1/benchmark/get-successful-execution-ages";

/// @ai:intent Trait for the two results-service endpoints the loader needs
#[allow(async_fn_in_trait)]
pub trait ResultsServiceTrait: Send + Sync {
    /// @ai:intent One unique name per request item, same order
    async fn generate_unique_names(&self, items: &[UniqueNameRequestItem]) -> Result<Vec<String>>;

    /// @ai:intent Age of the last successful execution per unique name, same order
    async fn successful_execution_ages(&self, unique_names: &[String]) -> Result<Vec<Duration>>;
}

/// @ai:intent Request body entry for unique name generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueNameRequestItem {
    pub name: String,
    pub variables: Variables,
}

/// @ai:intent Execution age as sent by the service: days or an ISO-8601 duration
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AgeValue {
    Days(f64),
    Iso(String),
}

impl AgeValue {
    fn into_duration(self) -> std::result::Result<Duration, String> {
        match self {
            AgeValue::Days(days) => {
                millis_to_duration(days * 86_400_000.0).ok_or_else(|| format!("invalid age {}", days))
            }
            AgeValue::Iso(text) => parse_iso8601_duration(&text),
        }
    }
}

/// @ai:intent HTTP client for the results service
pub struct ResultsServiceClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ResultsServiceClient {
    /// @ai:intent Create a client for the configured service URL
    /// @ai:effects pure
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| LoadError::InvalidConfig(format!("service url {}: {}", config.url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LoadError::InvalidConfig(format!("http client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// @ai:intent POST a JSON body and decode the JSON response
    /// @ai:effects network
    async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let endpoint = self.endpoint(path);
        let unavailable = |reason: String| LoadError::ServiceUnavailable {
            endpoint: endpoint.clone(),
            reason,
        };

        let response = self
            .client
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("status {}: {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| unavailable(format!("undecodable response: {}", e)))
    }
}

impl ResultsServiceTrait for ResultsServiceClient {
    /// @ai:effects network
    async fn generate_unique_names(&self, items: &[UniqueNameRequestItem]) -> Result<Vec<String>> {
        self.post(UNIQUE_NAMES_PATH, items).await
    }

    /// @ai:effects network
    async fn successful_execution_ages(&self, unique_names: &[String]) -> Result<Vec<Duration>> {
        let ages: Vec<AgeValue> = self.post(EXECUTION_AGES_PATH, unique_names).await?;
        ages.into_iter()
            .map(|age| {
                age.into_duration()
                    .map_err(|reason| LoadError::ServiceUnavailable {
                        endpoint: self.endpoint(EXECUTION_AGES_PATH),
                        reason,
                    })
            })
            .collect()
    }
}

/// @ai:intent Parse `PnDTnHnMnS` (any subset, fractional seconds allowed)
/// @ai:effects pure
pub fn parse_iso8601_duration(text: &str) -> std::result::Result<Duration, String> {
    let invalid = || format!("invalid ISO-8601 duration '{}'", text);
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let rest = rest
        .strip_prefix('P')
        .or_else(|| rest.strip_prefix('p'))
        .ok_or_else(invalid)?;

    let mut total = Duration::zero();
    let mut in_time = false;
    let mut number = String::new();
    let mut seen_component = false;

    for c in rest.chars() {
        match c.to_ascii_uppercase() {
            'T' if !in_time && number.is_empty() => in_time = true,
            d if d.is_ascii_digit() || d == '.' || d == '-' => number.push(d),
            unit => {
                let value: f64 = number.parse().map_err(|_| invalid())?;
                let millis = match (unit, in_time) {
                    ('W', false) => value * 7.0 * 86_400_000.0,
                    ('D', false) => value * 86_400_000.0,
                    ('H', true) => value * 3_600_000.0,
                    ('M', true) => value * 60_000.0,
                    ('S', true) => value * 1_000.0,
                    _ => return Err(invalid()),
                };
                total = millis_to_duration(millis)
                    .and_then(|component| total.checked_add(&component))
                    .ok_or_else(invalid)?;
                number.clear();
                seen_component = true;
            }
        }
    }

    if !number.is_empty() || !seen_component {
        return Err(invalid());
    }

    Ok(if negative { -total } else { total })
}

/// Out-of-range and non-finite values give `None`.
fn millis_to_duration(millis: f64) -> Option<Duration> {
    let millis = millis.round();
    if !millis.is_finite() || millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(millis as i64)
}

/// @ai:intent Results service stand-in that needs no network
/// @ai:post unique names are `name_k=v_...`; every age is the configured one
pub struct OfflineResultsService {
    age: Duration,
}

impl OfflineResultsService {
    /// @ai:intent Service reporting that nothing ran recently
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            age: Duration::days(i64::from(i32::MAX)),
        }
    }

    /// @ai:intent Service reporting the same age for every benchmark
    /// @ai:effects pure
    pub fn with_age(age: Duration) -> Self {
        Self { age }
    }
}

impl Default for OfflineResultsService {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsServiceTrait for OfflineResultsService {
    async fn generate_unique_names(&self, items: &[UniqueNameRequestItem]) -> Result<Vec<String>> {
        Ok(items
            .iter()
            .map(|item| {
                std::iter::once(item.name.clone())
                    .chain(item.variables.iter().map(|(k, v)| format!("{}={}", k, v)))
                    .collect::<Vec<_>>()
                    .join("_")
            })
            .collect())
    }

    async fn successful_execution_ages(&self, unique_names: &[String]) -> Result<Vec<Duration>> {
        Ok(vec![self.age; unique_names.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_iso8601_durations() {
        assert_eq!(parse_iso8601_duration("P2D").unwrap(), Duration::days(2));
        assert_eq!(parse_iso8601_duration("PT48H").unwrap(), Duration::days(2));
        assert_eq!(
            parse_iso8601_duration("P1DT2H3M4.5S").unwrap(),
            Duration::days(1)
                + Duration::hours(2)
                + Duration::minutes(3)
                + Duration::milliseconds(4_500)
        );
        assert_eq!(parse_iso8601_duration("PT-30M").unwrap(), Duration::minutes(-30));
    }

    #[test]
    fn test_invalid_iso8601_durations() {
        assert!(parse_iso8601_duration("2D").is_err());
        assert!(parse_iso8601_duration("P").is_err());
        assert!(parse_iso8601_duration("P5H").is_err());
        assert!(parse_iso8601_duration("PT5").is_err());
    }

    #[test]
    fn test_age_values_decode() {
        let ages: Vec<AgeValue> = serde_json::from_str(r#"[2, 0.5, "PT36H"]"#).unwrap();
        let durations: Vec<Duration> = ages
            .into_iter()
            .map(|age| age.into_duration().unwrap())
            .collect();

        assert_eq!(
            durations,
            vec![Duration::days(2), Duration::hours(12), Duration::hours(36)]
        );
    }

    #[test]
    fn test_out_of_range_ages_are_errors() {
        for body in ["[-1e300]", "[1e300]", r#"["P9999999999999999999DT1H"]"#] {
            let ages: Vec<AgeValue> = serde_json::from_str(body).unwrap();
            for age in ages {
                assert!(age.into_duration().is_err(), "{}", body);
            }
        }
        assert!(parse_iso8601_duration("P9999999999999999999DT1H").is_err());
        assert!(parse_iso8601_duration("P60000000000DT2000000000000H").is_err());
        assert_eq!(
            parse_iso8601_duration("P60000000000D").unwrap(),
            Duration::days(60_000_000_000)
        );
    }

    #[test]
    fn test_request_item_json() {
        let mut variables = Variables::new();
        variables.insert("size".to_string(), "1GB".to_string());
        variables.insert("format".to_string(), "orc".to_string());
        let item = UniqueNameRequestItem {
            name: "multi".to_string(),
            variables,
        };

        assert_eq!(
            serde_json::to_string(&item).unwrap(),
            r#"{"name":"multi","variables":{"size":"1GB","format":"orc"}}"#
        );
    }

    #[test]
    fn test_endpoint_joining() {
        let client = ResultsServiceClient::new(&ServiceConfig {
            url: "http://results:9000/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(
            client.endpoint(UNIQUE_NAMES_PATH),
            "http://results:9000/v1/benchmark/generate-unique-names"
        );
    }

    #[test]
    fn test_invalid_service_url() {
        let result = ResultsServiceClient::new(&ServiceConfig {
            url: "not a url".to_string(),
            timeout_secs: 5,
        });
        assert!(matches!(result, Err(LoadError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let client = ResultsServiceClient::new(&ServiceConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let result = client.successful_execution_ages(&["a".to_string()]).await;
        assert!(matches!(result, Err(LoadError::ServiceUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_offline_names_and_ages() {
        let service = OfflineResultsService::new();
        let mut variables = Variables::new();
        variables.insert("size".to_string(), "1GB".to_string());
        variables.insert("format".to_string(), "orc".to_string());

        let names = service
            .generate_unique_names(&[
                UniqueNameRequestItem {
                    name: "multi".to_string(),
                    variables,
                },
                UniqueNameRequestItem {
                    name: "simple".to_string(),
                    variables: Variables::new(),
                },
            ])
            .await
            .unwrap();
        assert_eq!(names, vec!["multi_size=1GB_format=orc", "simple"]);

        let ages = service
            .successful_execution_ages(&names)
            .await
            .unwrap();
        assert_eq!(ages, vec![Duration::days(i64::from(i32::MAX)); 2]);
    }
}
