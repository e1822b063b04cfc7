//! Trait for retrieving one direction of a cross-border flow.

use anyhow::Result;

use crate::period::Month;
use crate::snapshot::types::FlowVolume;

/// Abstraction over the transparency platform's physical-flow endpoint.
///
/// `in_domain` receives the energy, `out_domain` sends it.
#[async_trait::async_trait]
pub trait FlowSource: Send + Sync {
    async fn fetch_flow(
        &self,
        month: Month,
        in_domain: &str,
        out_domain: &str,
    ) -> Result<FlowVolume>;
}
