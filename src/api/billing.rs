//! Billing Groups
//!
//! Typed access to `/billing-group`.

use super::client::AivenClient;
use super::http::ApiError;
use super::unwrap_envelope;
use serde::{Deserialize, Serialize};

/// A billing contact email as the API represents it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub email: String,
}

/// Create/update request body
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BillingGroupRequest {
    pub billing_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_extra_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_emails: Option<Vec<ContactEmail>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_lines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Billing group as returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct BillingGroup {
    #[serde(rename = "billing_group_id")]
    pub id: String,
    pub billing_group_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub card_id: Option<String>,
    #[serde(default)]
    pub vat_id: Option<String>,
    #[serde(default)]
    pub billing_currency: Option<String>,
    #[serde(default)]
    pub billing_extra_text: Option<String>,
    #[serde(default)]
    pub billing_emails: Vec<ContactEmail>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

pub struct BillingGroupHandler<'a> {
    client: &'a AivenClient,
}

impl<'a> BillingGroupHandler<'a> {
    pub(crate) fn new(client: &'a AivenClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &BillingGroupRequest) -> Result<BillingGroup, ApiError> {
        let body = serde_json::to_value(request)?;
        let url = self.client.billing_group_url(None);
        let response = self.client.post(&url, Some(&body)).await?;
        unwrap_envelope(response, "billing_group")
    }

    pub async fn get(&self, id: &str) -> Result<BillingGroup, ApiError> {
        let url = self.client.billing_group_url(Some(id));
        let response = self.client.get(&url).await?;
        unwrap_envelope(response, "billing_group")
    }

    pub async fn update(
        &self,
        id: &str,
        request: &BillingGroupRequest,
    ) -> Result<BillingGroup, ApiError> {
        let body = serde_json::to_value(request)?;
        let url = self.client.billing_group_url(Some(id));
        let response = self.client.put(&url, &body).await?;
        unwrap_envelope(response, "billing_group")
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let url = self.client.billing_group_url(Some(id));
        self.client.delete(&url).await?;
        Ok(())
    }
}
