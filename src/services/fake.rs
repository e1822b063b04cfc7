//! In-memory [`FlowSource`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, bail};

use super::flow_source::FlowSource;
use crate::period::Month;
use crate::snapshot::types::FlowVolume;

/// Serves canned volumes per `(in_domain, out_domain)` pair and records the
/// order of every request. Pairs without a canned volume return no data.
#[derive(Default)]
pub struct FakeFlowSource {
    volumes: HashMap<(String, String), FlowVolume>,
    failing: Option<Month>,
    calls: Mutex<Vec<(Month, String, String)>>,
}

impl FakeFlowSource {
    pub fn with(mut self, in_domain: &str, out_domain: &str, volume: FlowVolume) -> Self {
        self.volumes
            .insert((in_domain.to_string(), out_domain.to_string()), volume);
        self
    }

    pub fn failing_for(mut self, month: Month) -> Self {
        self.failing = Some(month);
        self
    }

    pub fn calls(&self) -> Vec<(Month, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FlowSource for FakeFlowSource {
    async fn fetch_flow(
        &self,
        month: Month,
        in_domain: &str,
        out_domain: &str,
    ) -> Result<FlowVolume> {
        self.calls
            .lock()
            .unwrap()
            .push((month, in_domain.to_string(), out_domain.to_string()));
        if self.failing == Some(month) {
            bail!("request failed with status 401 Unauthorized: invalid token");
        }
        Ok(self
            .volumes
            .get(&(in_domain.to_string(), out_domain.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
