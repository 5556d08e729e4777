//! Client for the eligibility API

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::ClientError;
use crate::models::{AddressRequest, CcaResult};

pub const ELIGIBLE_CCAS_PATH: &str = "/eligible_ccas";

/// Anything that can answer "which programs is this address eligible for"
#[async_trait]
pub trait EligibilitySource: Send + Sync {
    async fn eligible_ccas(&self, address: &str) -> Result<Vec<CcaResult>, ClientError>;
}

/// HTTP client for `POST {api_url}/eligible_ccas`
#[derive(Debug, Clone)]
pub struct EligibilityClient {
    client: Client,
    endpoint: String,
}

impl EligibilityClient {
    pub fn new(api_url: &str, config: &Config) -> Result<Self, ClientError> {
        let base = api_url.trim().trim_end_matches('/');
        reqwest::Url::parse(base).map_err(|e| ClientError::InvalidUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .user_agent(config.http.user_agent.as_str())
            .timeout(config.http_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base, ELIGIBLE_CCAS_PATH),
        })
    }

    /// Client for the API URL in the configuration
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(&config.api_url, config)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EligibilitySource for EligibilityClient {
    async fn eligible_ccas(&self, address: &str) -> Result<Vec<CcaResult>, ClientError> {
        debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&AddressRequest {
                address: address.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Eligibility API returned HTTP {}", status);
            return Err(ClientError::Status {
                status_code: status.as_u16(),
            });
        }

        let results: Vec<CcaResult> = response.json().await?;
        info!("Eligibility API returned {} programs", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EligibilityClient {
        EligibilityClient::new(&server.uri(), &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_successful_lookup() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/eligible_ccas"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({ "address": "95032" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "cca_name": "Test CCA", "signup_link": "http://test.com" },
                { "cca_name": "No Link CCA", "signup_link": null },
                { "cca_name": "Bare CCA" }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let results = client_for(&mock_server).eligible_ccas("95032").await.unwrap();
        assert_eq!(
            results,
            vec![
                CcaResult::new("Test CCA", Some("http://test.com")),
                CcaResult::new("No Link CCA", None),
                CcaResult::new("Bare CCA", None),
            ]
        );
    }

    #[tokio::test]
    async fn test_trailing_slash_is_stripped() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/eligible_ccas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api_url = format!("{}/", mock_server.uri());
        let client = EligibilityClient::new(&api_url, &Config::default()).unwrap();
        assert_eq!(client.endpoint(), format!("{}/eligible_ccas", mock_server.uri()));
        assert!(client.eligible_ccas("Santa Cruz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/eligible_ccas"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).eligible_ccas("95032").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status_code: 500 }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/eligible_ccas"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server).eligible_ccas("95032").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server);
        drop(mock_server);

        assert!(client.eligible_ccas("95032").await.is_err());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = EligibilityClient::new("localhost without scheme", &Config::default()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidUrl { .. }));
    }
}
