use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::fetch::auth::UrlParam;
use crate::fetch::{BackoffPolicy, HttpClient, fetch_text};
use crate::parser::parse_flow_document;
use crate::period::{API_TIMESTAMP_FORMAT, Month};
use crate::services::flow_source::FlowSource;
use crate::snapshot::types::FlowVolume;

pub const DEFAULT_BASE_URL: &str = "https://web-api.tp.entsoe.eu/api";

/// Cross-border physical flows.
const DOCUMENT_TYPE: &str = "A11";

/// REST client for the transparency platform's physical-flow endpoint.
pub struct TransparencyClient<C> {
    http: UrlParam<C>,
    base_url: Url,
    policy: BackoffPolicy,
}

impl<C: HttpClient> TransparencyClient<C> {
    pub fn new(inner: C, token: String, base_url: &str, policy: BackoffPolicy) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base url {base_url}"))?;
        Ok(Self {
            http: UrlParam::security_token(inner, token),
            base_url,
            policy,
        })
    }

    /// Request URL without the token, which [`UrlParam`] appends on the way out.
    pub fn flow_url(&self, month: Month, in_domain: &str, out_domain: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("documentType", DOCUMENT_TYPE)
            .append_pair("in_Domain", in_domain)
            .append_pair("out_Domain", out_domain)
            .append_pair(
                "periodStart",
                &month.start().format(API_TIMESTAMP_FORMAT).to_string(),
            )
            .append_pair(
                "periodEnd",
                &month.end().format(API_TIMESTAMP_FORMAT).to_string(),
            );
        url
    }
}

#[async_trait]
impl<C: HttpClient> FlowSource for TransparencyClient<C> {
    #[tracing::instrument(
        skip_all,
        fields(month = %month, in_domain = in_domain, out_domain = out_domain)
    )]
    async fn fetch_flow(
        &self,
        month: Month,
        in_domain: &str,
        out_domain: &str,
    ) -> Result<FlowVolume> {
        let url = self.flow_url(month, in_domain, out_domain);
        let body = fetch_text(&self.http, url.as_str(), &self.policy).await?;

        if body.trim().is_empty() {
            debug!("Empty response body, treating as no data");
            return Ok(FlowVolume::empty());
        }

        let volume = parse_flow_document(&body)?;
        debug!(
            energy_mwh = volume.energy_mwh,
            samples = volume.samples.len(),
            has_data = volume.has_data,
            "Flow parsed"
        );
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::mock::ScriptedClient;

    fn client(scripted: &ScriptedClient) -> TransparencyClient<&ScriptedClient> {
        TransparencyClient::new(
            scripted,
            "token-123".to_string(),
            "https://example.test/api",
            BackoffPolicy::default(),
        )
        .unwrap()
    }

    fn january() -> Month {
        "2024-01".parse().unwrap()
    }

    #[tokio::test]
    async fn test_request_follows_rest_contract() {
        let scripted = ScriptedClient::new(vec![ScriptedClient::ok("")]);

        client(&scripted)
            .fetch_flow(january(), "10Y1001C--00100H", "10YAL-KESH-----5")
            .await
            .unwrap();

        let urls = scripted.urls();
        assert_eq!(urls.len(), 1);
        let url = Url::parse(&urls[0]).unwrap();
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("documentType"), Some("A11"));
        assert_eq!(get("in_Domain"), Some("10Y1001C--00100H"));
        assert_eq!(get("out_Domain"), Some("10YAL-KESH-----5"));
        assert_eq!(get("periodStart"), Some("202401010000"));
        assert_eq!(get("periodEnd"), Some("202402010000"));
        assert_eq!(get("securityToken"), Some("token-123"));
    }

    #[tokio::test]
    async fn test_empty_body_is_zero_data() {
        let scripted = ScriptedClient::new(vec![ScriptedClient::ok("  \n")]);

        let volume = client(&scripted)
            .fetch_flow(january(), "A", "B")
            .await
            .unwrap();

        assert_eq!(volume, FlowVolume::empty());
    }

    #[tokio::test]
    async fn test_body_is_parsed() {
        let xml = r#"<Publication_MarketDocument>
  <TimeSeries>
    <Period>
      <timeInterval><start>2024-01-01T00:00Z</start><end>2024-01-01T02:00Z</end></timeInterval>
      <resolution>PT60M</resolution>
      <Point><position>1</position><quantity>12.5</quantity></Point>
      <Point><position>2</position><quantity>7.5</quantity></Point>
    </Period>
  </TimeSeries>
</Publication_MarketDocument>"#;
        let scripted = ScriptedClient::new(vec![ScriptedClient::ok(xml)]);

        let volume = client(&scripted)
            .fetch_flow(january(), "A", "B")
            .await
            .unwrap();

        assert!(volume.has_data);
        assert_eq!(volume.energy_mwh, 20.0);
        assert_eq!(volume.samples.len(), 2);
    }

    #[tokio::test]
    async fn test_non_retriable_status_propagates() {
        let scripted = ScriptedClient::new(vec![ScriptedClient::status(400, "bad domain")]);

        let err = client(&scripted)
            .fetch_flow(january(), "A", "B")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad domain"));
    }
}
