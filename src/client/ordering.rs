//! # Ordering Client
//!
//! Price request, change-order submission with duplicate detection, and
//! order status lookups against the carrier's ordering API.
//!
//! Submission is safe to repeat: the external id depends only on prefix,
//! service id and target, and a "duplicate external id" answer is resolved to
//! the order the carrier already holds.

use super::http::{ApiFailure, CarrierHttpClient};
use crate::config::{BandwidthConfig, CheckerConfig};
use crate::constants::carrier;
use crate::error::{OrderStatusError, OrderSubmissionError};
use crate::logging::log_carrier_operation;
use crate::models::{
    AccessToken, BandwidthTarget, ChangeOrder, ContactBlock, InventoryState, OrderOutcome,
    OrderReference, ServiceDescriptor, SubmittedOrder,
};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info, warn};

#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn submit(
        &self,
        service: &ServiceDescriptor,
        inventory: &InventoryState,
        target: BandwidthTarget,
        token: &AccessToken,
    ) -> Result<SubmittedOrder, OrderSubmissionError>;
}

#[async_trait]
pub trait OrderStatusClient: Send + Sync {
    async fn order_status(
        &self,
        service: &ServiceDescriptor,
        reference: &OrderReference,
        token: &AccessToken,
    ) -> Result<OrderOutcome, OrderStatusError>;
}

/// Order fields that come from configuration rather than inventory
#[derive(Debug, Clone)]
pub struct OrderSettings {
    pub external_id_prefix: String,
    pub partner_id: String,
    pub contact: ContactBlock,
    pub bandwidth: BandwidthConfig,
    pub price_request_path: String,
    pub order_path: String,
}

impl OrderSettings {
    pub fn from_config(config: &CheckerConfig) -> Self {
        Self {
            external_id_prefix: config.external_id_prefix.clone(),
            partner_id: config.credentials.partner_id.clone(),
            contact: config.contact.clone(),
            bandwidth: config.bandwidth.clone(),
            price_request_path: config.api.price_request_path.clone(),
            order_path: config.api.order_path.clone(),
        }
    }
}

/// Ids arrive as strings or numbers
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a failed submission means the carrier already has this external id
fn is_duplicate(failure: &ApiFailure) -> bool {
    match failure {
        ApiFailure::Client { status: 409, .. } => true,
        ApiFailure::Client { status, body } if (400..500).contains(status) => {
            let body = body.to_ascii_lowercase();
            body.contains("duplicate") || body.contains("already exists")
        }
        _ => false,
    }
}

/// Find the order id in a lookup answer: a bare order, a list, or a wrapped list
fn first_order_id(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(first_order_id),
        Value::Object(map) => map.get("id").and_then(id_text).or_else(|| {
            ["productOrder", "orders", "items"]
                .iter()
                .find_map(|key| map.get(*key).and_then(first_order_id))
        }),
        _ => None,
    }
}

fn price_request_body(
    settings: &OrderSettings,
    service: &ServiceDescriptor,
    master_site_id: &str,
    order: &ChangeOrder,
) -> Value {
    json!({
        "sourceSystem": carrier::SOURCE_SYSTEM,
        "customerPriceRequestDescription": carrier::PRICE_REQUEST_DESCRIPTION,
        "customerPurchaseOrderNumber": "",
        "customerNumber": service.customer_number,
        "currencyCode": order.currency_code,
        "masterSiteId": master_site_id,
        "productCode": service.product_code,
        "partnerId": settings.partner_id,
        "productName": service.product_name,
        "speed": order.target_bandwidth.raw(),
    })
}

fn order_body(service: &ServiceDescriptor, inventory: &InventoryState, order: &ChangeOrder) -> Value {
    let billing = inventory.billing_account.as_ref();
    let quote_id = order.quote_id.clone().unwrap_or_default();
    json!({
        "externalId": order.external_id,
        "billingAccount": {
            "id": billing.map(|b| b.id.as_str()).unwrap_or_default(),
            "name": billing.map(|b| b.name.as_str()).unwrap_or_default(),
        },
        "channel": [{"id": carrier::CHANNEL_ID, "name": carrier::SOURCE_SYSTEM}],
        "note": [{"text": carrier::ORDER_NOTE}],
        "productOrderItem": [{
            "id": order.service_id,
            "quantity": 1,
            "action": carrier::ORDER_ACTION,
            "product": {
                "id": order.service_id,
                "productCharacteristic": [],
                "productSpecification": {
                    "id": carrier::PRODUCT_SPECIFICATION_ID,
                    "name": carrier::PRODUCT_SPECIFICATION_NAME,
                },
            },
            "productOffering": {
                "id": service.product_code,
                "name": service.product_name,
            },
        }],
        "quote": [{"id": quote_id, "name": quote_id}],
        "relatedContactInformation": [{
            "number": order.contact.phone,
            "emailAddress": order.contact.email,
            "role": order.contact.role,
            "organization": order.contact.organization,
            "name": order.contact.name,
            "numberExtension": "",
        }],
    })
}

/// Ordering over the carrier's REST API
#[derive(Debug, Clone)]
pub struct HttpOrderingClient {
    http: CarrierHttpClient,
    settings: OrderSettings,
}

impl HttpOrderingClient {
    pub fn new(http: CarrierHttpClient, settings: OrderSettings) -> Self {
        Self { http, settings }
    }

    async fn request_quote(
        &self,
        service: &ServiceDescriptor,
        inventory: &InventoryState,
        order: &ChangeOrder,
        token: &AccessToken,
    ) -> Result<String, OrderSubmissionError> {
        let master_site_id = inventory.master_site_id.as_deref().ok_or_else(|| {
            OrderSubmissionError::Malformed(format!(
                "inventory for {} has no master site id",
                service.service_id
            ))
        })?;

        let request = self
            .http
            .authorized(
                Method::POST,
                &self.settings.price_request_path,
                token,
                &service.customer_number,
            )?
            .json(&price_request_body(&self.settings, service, master_site_id, order));

        let response: Value = self.http.send_json(request, "price_request").await?;
        let quote_id = response.get("id").and_then(id_text).ok_or_else(|| {
            OrderSubmissionError::Malformed("price request response has no id".to_string())
        })?;

        debug!(service_id = %service.service_id, quote_id = %quote_id, "Quote obtained");
        Ok(quote_id)
    }

    async fn lookup_by_external_id(
        &self,
        service: &ServiceDescriptor,
        external_id: &str,
        token: &AccessToken,
    ) -> Result<OrderReference, OrderSubmissionError> {
        let request = self
            .http
            .authorized(
                Method::GET,
                &self.settings.order_path,
                token,
                &service.customer_number,
            )?
            .query(&[("externalId", external_id)]);

        let response: Value = self.http.send_json(request, "order_lookup").await?;
        let order_id = first_order_id(&response).ok_or_else(|| {
            OrderSubmissionError::Malformed(format!(
                "carrier reported duplicate external id {external_id} but no order was found"
            ))
        })?;

        Ok(OrderReference {
            order_id,
            external_id: external_id.to_string(),
            duplicate: true,
        })
    }
}

#[async_trait]
impl OrderSubmitter for HttpOrderingClient {
    async fn submit(
        &self,
        service: &ServiceDescriptor,
        inventory: &InventoryState,
        target: BandwidthTarget,
        token: &AccessToken,
    ) -> Result<SubmittedOrder, OrderSubmissionError> {
        let started = Instant::now();

        if inventory.billing_account.is_none() {
            return Err(OrderSubmissionError::Malformed(format!(
                "inventory for {} has no billing account",
                service.service_id
            )));
        }

        let order = ChangeOrder::new(
            &self.settings.external_id_prefix,
            service,
            target,
            self.settings.bandwidth.value_for(target).clone(),
            self.settings.contact.clone(),
        );
        let quote_id = self.request_quote(service, inventory, &order, token).await?;
        let order = order.with_quote(quote_id);

        info!(
            service_id = %service.service_id,
            external_id = %order.external_id,
            target = %target,
            target_bandwidth = %order.target_bandwidth,
            "Submitting change order"
        );

        let request = self
            .http
            .authorized(
                Method::POST,
                &self.settings.order_path,
                token,
                &service.customer_number,
            )?
            .json(&order_body(service, inventory, &order));

        let reference = match self.http.send_json::<Value>(request, "order_submit").await {
            Ok(response) => {
                let order_id = response.get("id").and_then(id_text).ok_or_else(|| {
                    OrderSubmissionError::Malformed("order response has no id".to_string())
                })?;
                OrderReference {
                    order_id,
                    external_id: order.external_id.clone(),
                    duplicate: false,
                }
            }
            Err(failure) if is_duplicate(&failure) => {
                warn!(
                    service_id = %service.service_id,
                    external_id = %order.external_id,
                    "Carrier already holds an order with this external id"
                );
                self.lookup_by_external_id(service, &order.external_id, token)
                    .await?
            }
            Err(failure) => return Err(failure.into()),
        };

        log_carrier_operation(
            "order_submit",
            Some(&service.service_id),
            if reference.duplicate { "duplicate" } else { "submitted" },
            Some(started.elapsed().as_millis() as u64),
            Some(&format!("order_id={}", reference.order_id)),
        );

        Ok(SubmittedOrder { order, reference })
    }
}

#[async_trait]
impl OrderStatusClient for HttpOrderingClient {
    async fn order_status(
        &self,
        service: &ServiceDescriptor,
        reference: &OrderReference,
        token: &AccessToken,
    ) -> Result<OrderOutcome, OrderStatusError> {
        let url = self
            .http
            .resource_url(&self.settings.order_path, &reference.order_id)?;
        let request =
            self.http
                .authorized_url(Method::GET, url, token, &service.customer_number);

        let response: Value = self.http.send_json(request, "order_status").await?;
        let state = response
            .get("state")
            .or_else(|| response.get("status"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                OrderStatusError::Permanent(format!(
                    "order {} status response has no state",
                    reference.order_id
                ))
            })?;

        let outcome = OrderOutcome::from_carrier_state(state);
        debug!(
            order_id = %reference.order_id,
            carrier_state = %state,
            outcome = %outcome,
            "Order status polled"
        );
        Ok(outcome)
    }
}
