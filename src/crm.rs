//! CRM domain caller built on the relay.
//!
//! Thin lead/deal operations over [`Relay::execute`]: each one checks its required
//! business fields before any network call, builds a descriptor, and returns the
//! response envelope untouched—business statuses (duplicate lead, not found, rate
//! limited) are the caller's to interpret, not this module's.

// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	http::RelayTransport,
	relay::Relay,
	request::{RequestDescriptor, ResponseEnvelope},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// CRM client specialized for the crate's default reqwest transport.
pub type ReqwestCrmClient = CrmClient<ReqwestTransport>;

/// JSON object payload supplied by callers.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Environment prefix read by [`CrmClient::from_env`].
pub const ENV_PREFIX: &str = "CRM";

const AUTH_SCHEME: &str = "Zoho-oauthtoken";
/// Workflow triggers fired upstream when records are written.
const RECORD_TRIGGERS: [&str; 3] = ["approval", "workflow", "blueprint"];

/// Lead and deal operations against the CRM API.
pub struct CrmClient<C>
where
	C: ?Sized + RelayTransport,
{
	relay: Relay<C>,
}
impl<C> CrmClient<C>
where
	C: ?Sized + RelayTransport,
{
	/// Creates a client over the provided transport.
	pub fn with_transport(config: &RelayConfig, transport: impl Into<Arc<C>>) -> Self {
		Self { relay: Relay::with_transport(config, transport).with_auth_scheme(AUTH_SCHEME) }
	}

	/// Returns the underlying relay.
	pub fn relay(&self) -> &Relay<C> {
		&self.relay
	}

	/// Creates a new lead. Requires `Last_Name` and `Company`.
	pub async fn create_lead(&self, lead: JsonMap) -> Result<ResponseEnvelope> {
		ensure_required(&lead, &["Last_Name", "Company"])?;

		let descriptor =
			RequestDescriptor::post("Leads").with_body(record_payload(lead, true));

		self.relay.execute(&descriptor).await
	}

	/// Fetches one page of leads, newest first.
	pub async fn list_leads(&self, page: u32, per_page: u32) -> Result<ResponseEnvelope> {
		let descriptor = RequestDescriptor::get("Leads")
			.with_query("page", page.to_string())
			.with_query("per_page", per_page.to_string())
			.with_query("sort_by", "Created_Time")
			.with_query("sort_order", "desc");

		self.relay.execute(&descriptor).await
	}

	/// Updates fields on an existing lead.
	pub async fn update_lead(&self, lead_id: &str, fields: JsonMap) -> Result<ResponseEnvelope> {
		let descriptor = RequestDescriptor::put(format!("Leads/{lead_id}"))
			.with_body(record_payload(fields, false));

		self.relay.execute(&descriptor).await
	}

	/// Searches leads by the provided criteria, passed as query parameters.
	pub async fn search_leads(
		&self,
		criteria: BTreeMap<String, String>,
	) -> Result<ResponseEnvelope> {
		let mut descriptor = RequestDescriptor::get("Leads/search");

		for (key, value) in criteria {
			descriptor = descriptor.with_query(key, value);
		}

		self.relay.execute(&descriptor).await
	}

	/// Creates a new deal. Requires `Deal_Name` and `Stage`.
	pub async fn create_deal(&self, deal: JsonMap) -> Result<ResponseEnvelope> {
		ensure_required(&deal, &["Deal_Name", "Stage"])?;

		let descriptor =
			RequestDescriptor::post("Deals").with_body(record_payload(deal, true));

		self.relay.execute(&descriptor).await
	}

	/// Converts a lead into a contact, creating a deal alongside it.
	pub async fn convert_lead(
		&self,
		lead_id: &str,
		conversion: LeadConversion,
	) -> Result<ResponseEnvelope> {
		let descriptor = RequestDescriptor::post(format!("Leads/{lead_id}/actions/convert"))
			.with_body(conversion.into_payload());

		self.relay.execute(&descriptor).await
	}

	/// Returns the API user the credential authenticates as, when one is reported.
	pub async fn current_user_id(&self) -> Result<Option<String>> {
		let descriptor = RequestDescriptor::get("users").with_query("type", "CurrentUser");
		let envelope = self.relay.execute(&descriptor).await?;
		let listing: UserList = envelope.json()?;

		Ok(listing.users.into_iter().next().map(|user| user.id))
	}
}
#[cfg(feature = "reqwest")]
impl CrmClient<ReqwestTransport> {
	/// Builds a client from `CRM_`-prefixed environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		let config = RelayConfig::from_env(ENV_PREFIX)?;

		Ok(Self::with_transport(&config, ReqwestTransport::default()))
	}
}
impl<C> Debug for CrmClient<C>
where
	C: ?Sized + RelayTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CrmClient").field("relay", &self.relay).finish()
	}
}

/// Inputs for a lead conversion.
///
/// `closing_date` is supplied by the caller in the API's `YYYY-MM-DD` spelling; the
/// client does not consult a clock.
#[derive(Clone, Debug)]
pub struct LeadConversion {
	/// Account the converted contact is attached to.
	pub account_name: String,
	/// Closing date recorded on the created deal.
	pub closing_date: String,
	/// Deal name; defaults to `Deal - {account_name}` when absent.
	pub deal_name: Option<String>,
	/// User the converted records are assigned to, when known.
	pub assign_to: Option<String>,
}
impl LeadConversion {
	/// Creates a conversion for the provided account and closing date.
	pub fn new(account_name: impl Into<String>, closing_date: impl Into<String>) -> Self {
		Self {
			account_name: account_name.into(),
			closing_date: closing_date.into(),
			deal_name: None,
			assign_to: None,
		}
	}

	/// Overrides the generated deal name.
	pub fn with_deal_name(mut self, name: impl Into<String>) -> Self {
		self.deal_name = Some(name.into());

		self
	}

	/// Assigns the converted records to a specific user.
	pub fn with_assignee(mut self, user_id: impl Into<String>) -> Self {
		self.assign_to = Some(user_id.into());

		self
	}

	fn into_payload(self) -> serde_json::Value {
		let deal_name =
			self.deal_name.unwrap_or_else(|| format!("Deal - {}", self.account_name));
		let mut entry = JsonMap::new();

		entry.insert("convert_to".into(), "Contacts".into());
		entry.insert("Accounts".into(), self.account_name.into());
		entry.insert(
			"Deals".into(),
			serde_json::json!({
				"Deal_Name": deal_name,
				"Closing_Date": self.closing_date,
				"Stage": "Qualification",
			}),
		);

		if let Some(user_id) = self.assign_to {
			entry.insert("assign_to".into(), user_id.into());
		}

		serde_json::json!({ "data": [entry] })
	}
}

/// Domain-caller validation failures raised before any network call.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A required business field is absent from the payload.
	#[error("Required field `{field}` is missing.")]
	MissingField {
		/// Name of the absent field.
		field: &'static str,
	},
}

#[derive(Debug, Deserialize)]
struct UserList {
	#[serde(default)]
	users: Vec<UserRecord>,
}
#[derive(Debug, Deserialize)]
struct UserRecord {
	id: String,
}

fn ensure_required(payload: &JsonMap, fields: &[&'static str]) -> Result<(), ValidationError> {
	for &field in fields {
		if !payload.contains_key(field) {
			return Err(ValidationError::MissingField { field });
		}
	}

	Ok(())
}

fn record_payload(record: JsonMap, with_triggers: bool) -> serde_json::Value {
	let mut payload = JsonMap::new();

	payload.insert("data".into(), serde_json::Value::Array(vec![record.into()]));

	if with_triggers {
		payload.insert("trigger".into(), serde_json::json!(RECORD_TRIGGERS));
	}

	payload.into()
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		auth::SecretString,
		http::testing::MockTransport,
		request::{Method, ResponseEnvelope},
	};

	fn client(transport: &Arc<MockTransport>) -> CrmClient<MockTransport> {
		let config = RelayConfig::new(
			"client-1",
			SecretString::new("secret-1"),
			SecretString::new("refresh-1"),
			Url::parse("https://api.example.com/crm/v5").expect("API fixture URL should parse."),
			Url::parse("https://accounts.example.com/oauth/v2/token")
				.expect("Token fixture URL should parse."),
		);
		let client = CrmClient::with_transport(&config, transport.clone());

		client.relay().credential.set_token(SecretString::new("T0"));

		client
	}

	fn record(fields: &[(&str, &str)]) -> JsonMap {
		fields.iter().map(|(key, value)| ((*key).to_string(), json!(value))).collect()
	}

	fn ok_envelope() -> ResponseEnvelope {
		ResponseEnvelope { status: 201, body: b"{}".to_vec() }
	}

	#[tokio::test]
	async fn missing_required_field_fails_before_any_network_call() {
		let transport = MockTransport::scripted([]);
		let client = client(&transport);
		let err = client
			.create_lead(record(&[("Last_Name", "Doe")]))
			.await
			.expect_err("A lead without a company must be rejected locally.");

		assert!(matches!(
			err,
			Error::Validation(ValidationError::MissingField { field: "Company" }),
		));
		assert!(transport.requests().is_empty(), "Validation must precede dispatch.");
	}

	#[tokio::test]
	async fn create_lead_wraps_the_record_and_triggers() {
		let transport = MockTransport::scripted([Ok(ok_envelope())]);
		let client = client(&transport);

		client
			.create_lead(record(&[("Last_Name", "Doe"), ("Company", "Acme")]))
			.await
			.expect("Lead creation should dispatch.");

		let seen = transport.requests();
		let body: serde_json::Value = serde_json::from_slice(
			seen[0].body.as_deref().expect("Lead creation must carry a body."),
		)
		.expect("Request bodies are JSON.");

		assert_eq!(seen[0].method, Method::Post);
		assert!(seen[0].url.path().ends_with("/Leads"));
		assert_eq!(body["data"][0]["Last_Name"], json!("Doe"));
		assert_eq!(body["trigger"], json!(["approval", "workflow", "blueprint"]));
	}

	#[tokio::test]
	async fn update_lead_omits_triggers() {
		let transport = MockTransport::scripted([Ok(ok_envelope())]);
		let client = client(&transport);

		client
			.update_lead("42", record(&[("Lead_Status", "Contacted")]))
			.await
			.expect("Lead update should dispatch.");

		let seen = transport.requests();
		let body: serde_json::Value = serde_json::from_slice(
			seen[0].body.as_deref().expect("Lead update must carry a body."),
		)
		.expect("Request bodies are JSON.");

		assert_eq!(seen[0].method, Method::Put);
		assert!(seen[0].url.path().ends_with("/Leads/42"));
		assert_eq!(body["data"][0]["Lead_Status"], json!("Contacted"));
		assert!(body.get("trigger").is_none());
	}

	#[tokio::test]
	async fn list_and_search_encode_query_parameters() {
		let transport = MockTransport::scripted([Ok(ok_envelope()), Ok(ok_envelope())]);
		let client = client(&transport);

		client.list_leads(2, 50).await.expect("Listing should dispatch.");
		client
			.search_leads(BTreeMap::from_iter([("email".to_string(), "a@b.co".to_string())]))
			.await
			.expect("Search should dispatch.");

		let seen = transport.requests();
		let listing_query = seen[0].url.query().expect("Listing must carry a query.");

		assert!(listing_query.contains("page=2"));
		assert!(listing_query.contains("per_page=50"));
		assert!(listing_query.contains("sort_by=Created_Time"));
		assert!(seen[1].url.path().ends_with("/Leads/search"));
		assert_eq!(seen[1].url.query(), Some("email=a%40b.co"));
	}

	#[tokio::test]
	async fn conversion_payload_defaults_the_deal_name() {
		let transport = MockTransport::scripted([Ok(ok_envelope())]);
		let client = client(&transport);

		client
			.convert_lead("42", LeadConversion::new("Acme", "2026-09-01").with_assignee("7"))
			.await
			.expect("Conversion should dispatch.");

		let seen = transport.requests();
		let body: serde_json::Value = serde_json::from_slice(
			seen[0].body.as_deref().expect("Conversion must carry a body."),
		)
		.expect("Request bodies are JSON.");

		assert!(seen[0].url.path().ends_with("/Leads/42/actions/convert"));
		assert_eq!(body["data"][0]["Deals"]["Deal_Name"], json!("Deal - Acme"));
		assert_eq!(body["data"][0]["Deals"]["Stage"], json!("Qualification"));
		assert_eq!(body["data"][0]["assign_to"], json!("7"));
	}

	#[tokio::test]
	async fn current_user_id_reads_the_first_listed_user() {
		let transport = MockTransport::scripted([Ok(ResponseEnvelope {
			status: 200,
			body: b"{\"users\":[{\"id\":\"7\",\"full_name\":\"Jo\"}]}".to_vec(),
		})]);
		let client = client(&transport);
		let user = client.current_user_id().await.expect("User lookup should dispatch.");

		assert_eq!(user.as_deref(), Some("7"));

		let seen = transport.requests();

		assert_eq!(seen[0].url.query(), Some("type=CurrentUser"));
	}

	#[tokio::test]
	async fn current_user_id_handles_an_empty_listing() {
		let transport = MockTransport::scripted([Ok(ResponseEnvelope {
			status: 200,
			body: b"{}".to_vec(),
		})]);
		let client = client(&transport);
		let user = client.current_user_id().await.expect("Empty listings decode.");

		assert_eq!(user, None);
	}
}
