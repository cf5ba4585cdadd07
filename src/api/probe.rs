//! Stage-2 proxy probe against the real departures endpoint.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::client::{DepartureRequest, FlightRadarClient};
use crate::error_handling::FetchError;
use crate::proxy::{ProbeVerdict, ProxyMapping, TargetProbe};

/// Requests one departure row for `airport_code` through the candidate proxy.
///
/// A decoded payload passes; any HTTP status failure is a clean rejection;
/// transport and decode failures surface as probe errors.
pub struct DepartureProbe {
    client: Arc<FlightRadarClient>,
    airport_code: String,
}

impl DepartureProbe {
    pub fn new(client: Arc<FlightRadarClient>, airport_code: impl Into<String>) -> Self {
        Self {
            client,
            airport_code: airport_code.into(),
        }
    }
}

#[async_trait]
impl TargetProbe for DepartureProbe {
    async fn probe(&self, mapping: &ProxyMapping) -> anyhow::Result<ProbeVerdict> {
        let request = DepartureRequest::new(self.airport_code.clone(), 1, 1);
        match self.client.fetch_via(&request, Some(mapping)).await {
            Ok(_) => Ok(ProbeVerdict {
                ok: true,
                status_code: Some(200),
                error: None,
            }),
            Err(FetchError::Status(code)) => Ok(ProbeVerdict {
                ok: false,
                status_code: Some(code),
                error: Some(format!("HTTP {code}")),
            }),
            Err(e @ FetchError::RateLimited { .. }) => Ok(ProbeVerdict {
                ok: false,
                status_code: Some(429),
                error: Some(e.to_string()),
            }),
            Err(e) => Err(e.into()),
        }
    }
}
