#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use oauth2_relay::{
	auth::SecretString,
	config::RelayConfig,
	crm::{CrmClient, LeadConversion, ReqwestCrmClient, ValidationError},
	error::Error,
	http::ReqwestTransport,
	url::Url,
};

fn build_client(server: &MockServer) -> ReqwestCrmClient {
	let config = RelayConfig::new(
		"crm-client-it",
		SecretString::new("crm-secret-it"),
		SecretString::new("crm-refresh-it"),
		Url::parse(&server.url("/crm/v5")).expect("Mock API base URL should parse."),
		Url::parse(&server.url("/oauth/v2/token"))
			.expect("Mock token endpoint URL should parse."),
	);
	let client = CrmClient::with_transport(&config, ReqwestTransport::default());

	client.relay().credential.set_token(SecretString::new("crm-token"));

	client
}

fn lead(fields: &[(&str, &str)]) -> serde_json::Map<String, serde_json::Value> {
	fields.iter().map(|(key, value)| ((*key).to_string(), json!(value))).collect()
}

#[tokio::test]
async fn create_lead_posts_the_wrapped_record_with_the_crm_scheme() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/crm/v5/Leads")
				.header("authorization", "Zoho-oauthtoken crm-token")
				.header("content-type", "application/json")
				.json_body(json!({
					"data": [{"Company": "Acme", "Last_Name": "Doe"}],
					"trigger": ["approval", "workflow", "blueprint"],
				}));
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"code\":\"SUCCESS\"}]}");
		})
		.await;
	let response = client
		.create_lead(lead(&[("Last_Name", "Doe"), ("Company", "Acme")]))
		.await
		.expect("Lead creation should succeed end to end.");

	mock.assert_async().await;

	assert_eq!(response.status, 201);
	assert!(response.is_success());
}

#[tokio::test]
async fn missing_required_field_never_reaches_the_server() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/crm/v5/Leads");
			then.status(201);
		})
		.await;
	let err = client
		.create_lead(lead(&[("Last_Name", "Doe")]))
		.await
		.expect_err("Validation must fail before dispatch.");

	assert!(matches!(
		err,
		Error::Validation(ValidationError::MissingField { field: "Company" }),
	));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn duplicate_lead_status_is_returned_as_a_business_envelope() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/crm/v5/Leads");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"code\":\"DUPLICATE_DATA\"}]}");
		})
		.await;
	let response = client
		.create_lead(lead(&[("Last_Name", "Doe"), ("Company", "Acme")]))
		.await
		.expect("Business rejections are envelopes, not errors.");

	mock.assert_async().await;

	assert_eq!(response.status, 400);
	assert!(response.text().contains("DUPLICATE_DATA"));
}

#[tokio::test]
async fn lead_conversion_round_trips_through_a_stale_token() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);

	client.relay().credential.set_token(SecretString::new("stale"));

	let rejected_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/crm/v5/Leads/42/actions/convert")
				.header("authorization", "Zoho-oauthtoken stale");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"code\":\"INVALID_TOKEN\"}");
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/v2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"rotated\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let replay_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/crm/v5/Leads/42/actions/convert")
				.header("authorization", "Zoho-oauthtoken rotated");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":[{\"code\":\"SUCCESS\"}]}");
		})
		.await;
	let response = client
		.convert_lead("42", LeadConversion::new("Acme", "2026-09-01").with_deal_name("Pilot"))
		.await
		.expect("Conversion should succeed after the transparent refresh.");

	rejected_mock.assert_async().await;
	token_mock.assert_async().await;
	replay_mock.assert_async().await;

	assert_eq!(response.status, 200);
}

#[tokio::test]
async fn current_user_id_decodes_the_user_listing() {
	let server = MockServer::start_async().await;
	let client = build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/crm/v5/users").query_param("type", "CurrentUser");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"users\":[{\"id\":\"1001\",\"full_name\":\"Jo Example\"}]}");
		})
		.await;
	let user = client.current_user_id().await.expect("User lookup should succeed.");

	mock.assert_async().await;

	assert_eq!(user.as_deref(), Some("1001"));
}
