//! `aiven_billing_group`

use crate::api::billing::{BillingGroup, BillingGroupRequest};
use crate::api::cards::get_long_card_id;
use crate::api::AivenClient;
use crate::provider::{OpContext, ProviderError, RemoteContext, ResourceData, ResourceDefinition, ResourceHandler};
use crate::schema::mapping::{contact_emails_for_api, contact_emails_for_state, empty_string_as_none, string_set};
use crate::schema::{Attribute, AttributeType, DiffSuppress, Schema};
use async_trait::async_trait;
use serde::Deserialize;

pub const TYPE_NAME: &str = "aiven_billing_group";

/// Optional string attributes, all suppressed while unset locally
const OPTIONAL_STRINGS: &[(&str, &str)] = &[
    ("card_id", "Credit card id"),
    ("vat_id", "VAT id"),
    ("account_id", "Account id"),
    ("billing_currency", "Billing currency"),
    ("billing_extra_text", "Billing extra text"),
    ("company", "Company name"),
    ("country_code", "Country code"),
    ("city", "City"),
    ("zip_code", "Zip Code"),
    ("state", "State"),
];

pub fn schema() -> Schema {
    let mut schema = Schema::new()
        .with(
            "name",
            Attribute::required(AttributeType::String).description("Billing Group name"),
        )
        .with(
            "billing_emails",
            Attribute::optional(AttributeType::set_of(AttributeType::String))
                .description("Billing contact emails")
                .suppress(DiffSuppress::WhenUnset),
        )
        .with(
            "address_lines",
            Attribute::optional(AttributeType::set_of(AttributeType::String))
                .description("Address lines")
                .suppress(DiffSuppress::WhenUnset),
        );

    for (name, description) in OPTIONAL_STRINGS {
        schema.insert(
            name,
            Attribute::optional(AttributeType::String)
                .description(description)
                .suppress(DiffSuppress::WhenUnset),
        );
    }

    schema
}

pub fn definition() -> ResourceDefinition {
    ResourceDefinition::new(TYPE_NAME, "Billing group", schema(), BillingGroupResource)
}

/// User-supplied attributes of a billing group
#[derive(Debug, Deserialize)]
struct BillingGroupModel {
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    card_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    vat_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    account_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    billing_currency: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    billing_extra_text: Option<String>,
    #[serde(default)]
    billing_emails: Option<Vec<String>>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    company: Option<String>,
    #[serde(default)]
    address_lines: Option<Vec<String>>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    country_code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    zip_code: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    state: Option<String>,
}

impl BillingGroupModel {
    async fn into_request(
        self,
        client: &AivenClient,
        new_resource: bool,
    ) -> Result<BillingGroupRequest, ProviderError> {
        let card_id = get_long_card_id(client, self.card_id.as_deref())
            .await
            .remote_context("cannot get long card id")?;

        Ok(BillingGroupRequest {
            billing_group_name: self.name,
            account_id: self.account_id,
            card_id,
            vat_id: self.vat_id,
            billing_currency: self.billing_currency,
            billing_extra_text: self.billing_extra_text,
            billing_emails: contact_emails_for_api(self.billing_emails, new_resource),
            company: self.company,
            address_lines: self.address_lines.map(string_set),
            country_code: self.country_code,
            city: self.city,
            zip_code: self.zip_code,
            state: self.state,
        })
    }
}

pub struct BillingGroupResource;

#[async_trait]
impl ResourceHandler for BillingGroupResource {
    async fn create(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let request = d.decode::<BillingGroupModel>()?.into_request(client, true).await?;

        let group = client
            .billing_groups()
            .create(&request)
            .await
            .remote_context("cannot create billing group")?;

        d.set_id(group.id);
        Ok(())
    }

    async fn read(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let id = d.require_id()?.to_string();

        let group = client
            .billing_groups()
            .get(&id)
            .await
            .remote_context("cannot get billing group")?;

        write_state(d, &group)
    }

    async fn update(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let id = d.require_id()?.to_string();
        let request = d.decode::<BillingGroupModel>()?.into_request(client, false).await?;

        let group = client
            .billing_groups()
            .update(&id, &request)
            .await
            .remote_context("cannot update billing group")?;

        d.set_id(group.id);
        Ok(())
    }

    async fn delete(&self, _ctx: &OpContext, d: &mut ResourceData, client: &AivenClient) -> Result<(), ProviderError> {
        let id = d.require_id()?.to_string();

        client
            .billing_groups()
            .delete(&id)
            .await
            .remote_context("cannot delete billing group")
    }
}

fn write_state(d: &mut ResourceData, group: &BillingGroup) -> Result<(), ProviderError> {
    d.set("name", &group.billing_group_name)?;
    d.set("account_id", &group.account_id)?;
    d.set("card_id", &group.card_id)?;
    d.set("vat_id", &group.vat_id)?;
    d.set("billing_currency", &group.billing_currency)?;
    d.set("billing_extra_text", &group.billing_extra_text)?;
    d.set("billing_emails", contact_emails_for_state(&group.billing_emails))?;
    d.set("company", &group.company)?;
    d.set("address_lines", string_set(group.address_lines.iter().map(String::as_str)))?;
    d.set("country_code", &group.country_code)?;
    d.set("city", &group.city)?;
    d.set("zip_code", &group.zip_code)?;
    d.set("state", &group.state)?;
    Ok(())
}
