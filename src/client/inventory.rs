//! # Inventory Client
//!
//! Reads the service's current bandwidth, billing account and master site
//! from the carrier's product inventory.

use super::http::CarrierHttpClient;
use crate::constants::carrier;
use crate::error::InventoryError;
use crate::logging::log_carrier_operation;
use crate::models::{AccessToken, Bandwidth, BillingAccount, InventoryState, ServiceDescriptor};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

#[async_trait]
pub trait InventoryClient: Send + Sync {
    async fn fetch_state(
        &self,
        service: &ServiceDescriptor,
        token: &AccessToken,
    ) -> Result<InventoryState, InventoryError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryResponse {
    #[serde(default)]
    service_inventory: Vec<InventoryRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    billing_account: Option<BillingAccountRecord>,
    #[serde(default)]
    location: Option<LocationRecord>,
    #[serde(default)]
    product_characteristic: Vec<Characteristic>,
}

#[derive(Debug, Deserialize)]
struct BillingAccountRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    #[serde(default, rename = "masterSiteid", alias = "masterSiteId")]
    master_site_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Characteristic {
    name: String,
    #[serde(default)]
    value: Option<Value>,
}

/// Carrier ids arrive as either strings or numbers
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl InventoryRecord {
    fn into_state(self, service_id: &str) -> Result<InventoryState, InventoryError> {
        let raw_bandwidth = self
            .product_characteristic
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(carrier::BANDWIDTH_CHARACTERISTIC))
            .and_then(|c| c.value.as_ref())
            .and_then(value_text)
            .ok_or_else(|| {
                InventoryError::Permanent(format!(
                    "service {service_id} has no {} characteristic",
                    carrier::BANDWIDTH_CHARACTERISTIC
                ))
            })?;

        let current_bandwidth: Bandwidth = raw_bandwidth.parse().map_err(|e| {
            InventoryError::Permanent(format!(
                "service {service_id} reports unparseable bandwidth: {e}"
            ))
        })?;

        let billing_account = self.billing_account.and_then(|account| {
            account
                .id
                .as_ref()
                .and_then(value_text)
                .map(|id| BillingAccount {
                    id,
                    name: account.name.unwrap_or_default(),
                })
        });

        Ok(InventoryState {
            service_id: self
                .id
                .as_ref()
                .and_then(value_text)
                .unwrap_or_else(|| service_id.to_string()),
            current_bandwidth,
            status: self
                .status
                .or(self.state)
                .unwrap_or_else(|| "unknown".to_string()),
            billing_account,
            master_site_id: self
                .location
                .and_then(|l| l.master_site_id)
                .as_ref()
                .and_then(value_text),
        })
    }
}

/// Inventory lookups over the carrier's REST API
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    http: CarrierHttpClient,
    inventory_path: String,
}

impl HttpInventoryClient {
    pub fn new(http: CarrierHttpClient, inventory_path: impl Into<String>) -> Self {
        Self {
            http,
            inventory_path: inventory_path.into(),
        }
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn fetch_state(
        &self,
        service: &ServiceDescriptor,
        token: &AccessToken,
    ) -> Result<InventoryState, InventoryError> {
        let started = Instant::now();
        let page_size = carrier::INVENTORY_PAGE_SIZE.to_string();
        let request = self
            .http
            .authorized(
                Method::GET,
                &self.inventory_path,
                token,
                &service.customer_number,
            )?
            .query(&[
                ("pageNumber", "1"),
                ("pageSize", page_size.as_str()),
                ("naasEnabled", "true"),
                ("entitled", "true"),
                ("serviceType", carrier::SERVICE_TYPE),
                ("serviceId", service.service_id.as_str()),
            ]);

        let response: InventoryResponse = self.http.send_json(request, "inventory").await?;
        debug!(
            service_id = %service.service_id,
            records = response.service_inventory.len(),
            "Inventory response received"
        );

        // Prefer the record for this service; the filter should already guarantee it
        let mut records = response.service_inventory;
        let position = records
            .iter()
            .position(|r| r.id.as_ref().and_then(value_text).as_deref() == Some(&service.service_id))
            .unwrap_or(0);
        if records.is_empty() {
            return Err(InventoryError::Permanent(format!(
                "service {} not found in inventory",
                service.service_id
            )));
        }
        let state = records.swap_remove(position).into_state(&service.service_id)?;

        log_carrier_operation(
            "inventory",
            Some(&service.service_id),
            "success",
            Some(started.elapsed().as_millis() as u64),
            Some(&format!("bandwidth={}", state.current_bandwidth)),
        );

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> InventoryRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_record_extracts_billing_site_and_bandwidth() {
        let state = record(json!({
            "id": "SVC-1",
            "status": "active",
            "billingAccount": {"id": 12345, "name": "Example Corp"},
            "location": {"masterSiteid": "MS-9"},
            "productCharacteristic": [
                {"name": "Class of Service", "value": "Basic"},
                {"name": "Bandwidth", "value": "10 Mbps"}
            ]
        }))
        .into_state("SVC-1")
        .unwrap();

        assert_eq!(state.current_bandwidth.kbps(), 10_000);
        assert_eq!(state.status, "active");
        assert_eq!(
            state.billing_account,
            Some(BillingAccount {
                id: "12345".into(),
                name: "Example Corp".into()
            })
        );
        assert_eq!(state.master_site_id.as_deref(), Some("MS-9"));
    }

    #[test]
    fn test_missing_bandwidth_is_permanent() {
        let result = record(json!({"id": "SVC-1", "productCharacteristic": []})).into_state("SVC-1");
        assert!(matches!(result, Err(InventoryError::Permanent(_))));
    }

    #[test]
    fn test_unparseable_bandwidth_is_permanent() {
        let result = record(json!({
            "productCharacteristic": [{"name": "Bandwidth", "value": "fast"}]
        }))
        .into_state("SVC-1");
        assert!(matches!(result, Err(InventoryError::Permanent(_))));
    }

    #[test]
    fn test_status_falls_back_to_state_then_unknown() {
        let state = record(json!({
            "state": "provisioned",
            "productCharacteristic": [{"name": "bandwidth", "value": 100}]
        }))
        .into_state("SVC-1")
        .unwrap();
        assert_eq!(state.status, "provisioned");
        assert_eq!(state.service_id, "SVC-1");
        assert_eq!(state.current_bandwidth.kbps(), 100_000);

        let state = record(json!({
            "productCharacteristic": [{"name": "Bandwidth", "value": "1 Gbps"}]
        }))
        .into_state("SVC-1")
        .unwrap();
        assert_eq!(state.status, "unknown");
        assert!(state.billing_account.is_none());
    }
}
