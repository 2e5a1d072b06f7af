use pureport_provider::model::{Connection, ConnectionBase, Link, Network};
use pureport_provider::resources::{
    AwsConnectionResource, GoogleCloudConnectionResource, NetworkResource,
};
use reconcile_framework::mock::{MockRemote, Recorded};
use reconcile_framework::record::{fields, Value};
use reconcile_framework::{
    ApiResponse, ErrorKind, Fields, Lifecycle, MapError, ReconcileError, ResourceData,
    ResourceDriver, ResourceKind, TransportError,
};
use serde_json::json;

// --- Helpers ---

fn network_ref() -> Value {
    vec![fields([
        ("id", "network-1".into()),
        ("href", "/networks/network-1".into()),
    ])]
    .into()
}

fn google_config() -> Fields {
    fields([
        ("name", "gcp-east".into()),
        ("speed", 50i64.into()),
        ("billing_term", "HOURLY".into()),
        ("location_href", "/locations/us-ral".into()),
        ("network", network_ref()),
        ("primary_pairing_key", "pk-1".into()),
    ])
}

fn desired_google() -> ResourceData {
    ResourceData::from_config(GoogleCloudConnectionResource::schema(), google_config()).unwrap()
}

fn remote_base(id: &str) -> ConnectionBase {
    ConnectionBase {
        id: Some(id.into()),
        href: Some(format!("/connections/{id}")),
        name: "gcp-east".into(),
        speed: 50,
        billing_term: "HOURLY".into(),
        location: Link::new("us-ral", "/locations/us-ral"),
        network: Link::new("network-1", "/networks/network-1"),
        state: Some("ACTIVE".into()),
        ..ConnectionBase::default()
    }
}

fn remote_google(id: &str) -> Connection {
    Connection::GoogleCloudInterconnect {
        base: remote_base(id),
        primary_pairing_key: "pk-1".into(),
        secondary_pairing_key: None,
    }
}

fn rejected(status: u16, code: &str, message: &str) -> ApiResponse {
    ApiResponse::new(status).with_body(
        json!({"status": status, "code": code, "message": message}).to_string(),
    )
}

fn google_driver(
    mock: &MockRemote<GoogleCloudConnectionResource>,
) -> ResourceDriver<GoogleCloudConnectionResource, MockRemote<GoogleCloudConnectionResource>> {
    ResourceDriver::new(mock.clone())
}

// --- Create ---

#[tokio::test]
async fn create_resolves_location_then_reads_back() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    mock.expect_add()
        .return_created("https://api.pureport.com/connections/abc123");
    mock.expect_get("abc123").return_ok(remote_google("abc123"));

    let mut data = desired_google();
    google_driver(&mock).create(&mut data).await.unwrap();

    assert_eq!(data.id().map(|id| id.as_str()), Some("abc123"));
    assert_eq!(data.get_int("speed"), Some(50));
    assert_eq!(data.get_str("name"), Some("gcp-east"));
    assert_eq!(data.get_str("state"), Some("ACTIVE"));
    assert_eq!(
        data.state().get("network"),
        Some(&network_ref()),
        "network is read back as a singleton reference"
    );

    assert_eq!(
        mock.requests(),
        vec![
            Recorded::Add {
                parent_id: "network-1".into(),
                body: json!({
                    "type": "GOOGLE_CLOUD_INTERCONNECT",
                    "name": "gcp-east",
                    "speed": 50,
                    "billingTerm": "HOURLY",
                    "location": {"href": "/locations/us-ral"},
                    "network": {"id": "network-1", "href": "/networks/network-1"},
                    "primaryPairingKey": "pk-1"
                }),
            },
            Recorded::Get { id: "abc123".into() },
        ]
    );
    mock.verify();
}

#[tokio::test]
async fn duplicate_create_is_absorbed() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    mock.expect_add()
        .return_response(rejected(409, "DUPLICATE", "exists"));

    let mut data = desired_google();
    google_driver(&mock).create(&mut data).await.unwrap();

    assert_eq!(data.lifecycle(), Lifecycle::Absent);
    assert!(data.state().is_empty());
    mock.verify();
}

#[test]
fn invalid_speed_is_rejected_before_any_request() {
    let mut config = google_config();
    config.insert("speed".into(), 0i64.into());

    let err = ResourceData::from_config(GoogleCloudConnectionResource::schema(), config).unwrap_err();
    assert!(err.to_string().contains("speed"));
}

// --- Read ---

#[tokio::test]
async fn read_of_a_deleted_connection_clears_the_identifier() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    mock.expect_get("x1")
        .return_response(rejected(404, "RESOURCE_NOT_FOUND", "gone"));

    let mut data = desired_google().with_id("x1");
    google_driver(&mock).read(&mut data).await.unwrap();

    assert_eq!(data.lifecycle(), Lifecycle::Absent);
    mock.verify();
}

#[tokio::test]
async fn read_of_another_subtype_is_a_mapping_error() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    mock.expect_get("conn-1").return_ok(Connection::AwsDirectConnect {
        base: remote_base("conn-1"),
        aws_account_id: "123456789012".into(),
        aws_region: "us-east-1".into(),
    });

    let mut data = desired_google().with_id("conn-1");
    let err = google_driver(&mock).read(&mut data).await.unwrap_err();

    match err {
        ReconcileError::Mapping { source, .. } => assert_eq!(
            source,
            MapError::Subtype {
                expected: "GOOGLE_CLOUD_INTERCONNECT",
                found: "AWS_DIRECT_CONNECT",
            }
        ),
        other => panic!("unexpected error {other}"),
    }
    assert!(data.state().is_empty(), "a failed flatten commits nothing");
    assert!(data.id().is_some());
}

#[tokio::test]
async fn read_server_error_propagates_with_remote_detail() {
    let mock = MockRemote::<AwsConnectionResource>::new();
    mock.expect_get("conn-1")
        .return_response(rejected(500, "INTERNAL", "try later"));

    let data_config = fields([
        ("name", "aws".into()),
        ("speed", 100i64.into()),
        ("billing_term", "HOURLY".into()),
        ("location_href", "/locations/us-ral".into()),
        ("network", network_ref()),
        ("aws_account_id", "123456789012".into()),
        ("aws_region", "us-east-1".into()),
    ]);
    let mut data = ResourceData::from_config(AwsConnectionResource::schema(), data_config)
        .unwrap()
        .with_id("conn-1");

    let driver = ResourceDriver::<AwsConnectionResource, _>::new(mock.clone());
    let err = driver.read(&mut data).await.unwrap_err();

    let remote = err.remote().unwrap();
    assert_eq!(remote.kind, ErrorKind::RemoteRejected);
    assert_eq!(remote.status_code, Some(500));
    assert_eq!(remote.remote_code.as_deref(), Some("INTERNAL"));
    assert_eq!(data.id().map(|id| id.as_str()), Some("conn-1"));
}

// --- Update ---

async fn present_google(mock: &MockRemote<GoogleCloudConnectionResource>) -> ResourceData {
    mock.expect_get("conn-1").return_ok(remote_google("conn-1"));
    let mut data = desired_google().with_id("conn-1");
    google_driver(mock).read(&mut data).await.unwrap();
    data
}

#[tokio::test]
async fn description_change_sends_the_full_body() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    let mut data = present_google(&mock).await;
    data.set_config("description", "primary link").unwrap();

    let mut updated = remote_google("conn-1");
    updated.base_mut().description = Some("primary link".into());
    mock.expect_update("conn-1").return_ok(updated.clone());
    mock.expect_get("conn-1").return_ok(updated);

    google_driver(&mock).update(&mut data).await.unwrap();

    assert_eq!(data.get_str("description"), Some("primary link"));
    assert!(!data.has_change("description"));
    assert_eq!(
        mock.requests()[1],
        Recorded::Update {
            id: "conn-1".into(),
            body: json!({
                "type": "GOOGLE_CLOUD_INTERCONNECT",
                "name": "gcp-east",
                "description": "primary link",
                "speed": 50,
                "billingTerm": "HOURLY",
                "location": {"href": "/locations/us-ral"},
                "network": {"id": "network-1", "href": "/networks/network-1"},
                "primaryPairingKey": "pk-1"
            }),
        }
    );
    mock.verify();
}

#[tokio::test]
async fn changing_the_pairing_key_requires_replacement() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    let mut data = present_google(&mock).await;
    data.set_config("primary_pairing_key", "pk-2").unwrap();

    let err = google_driver(&mock).update(&mut data).await.unwrap_err();

    match err {
        ReconcileError::RequiresReplacement { field, .. } => {
            assert_eq!(field, "primary_pairing_key")
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(mock.requests().len(), 1, "no update request is sent");
    mock.verify();
}

#[tokio::test]
async fn update_transport_failure_keeps_the_identifier() {
    let mock = MockRemote::<GoogleCloudConnectionResource>::new();
    let mut data = present_google(&mock).await;
    data.set_config("speed", 100i64).unwrap();
    mock.expect_update("conn-1")
        .return_err(TransportError::Timeout);

    let err = google_driver(&mock).update(&mut data).await.unwrap_err();

    assert_eq!(err.remote().map(|e| e.kind), Some(ErrorKind::TransportFailure));
    assert_eq!(data.id().map(|id| id.as_str()), Some("conn-1"));
    assert_eq!(data.state().get("speed"), Some(&Value::Int(50)));
}

// --- Network ---

#[tokio::test]
async fn network_is_created_under_its_account_and_renamed_in_place() {
    let mock = MockRemote::<NetworkResource>::new();
    let remote = |name: &str| Network {
        id: Some("network-1".into()),
        href: Some("/networks/network-1".into()),
        name: name.into(),
        description: None,
        account: Some(Link::new("ac-1", "/accounts/ac-1")),
    };
    mock.expect_add()
        .return_created("/networks/network-1");
    mock.expect_get("network-1").return_ok(remote("core"));
    mock.expect_update("network-1").return_ok(remote("backbone"));
    mock.expect_get("network-1").return_ok(remote("backbone"));

    let driver = ResourceDriver::<NetworkResource, _>::new(mock.clone());
    let mut data = ResourceData::from_config(
        NetworkResource::schema(),
        fields([("name", "core".into()), ("account_id", "ac-1".into())]),
    )
    .unwrap();

    driver.create(&mut data).await.unwrap();
    data.set_config("name", "backbone").unwrap();
    driver.update(&mut data).await.unwrap();

    let requests = mock.requests();
    assert_eq!(
        requests[0],
        Recorded::Add {
            parent_id: "ac-1".into(),
            body: json!({"name": "core"}),
        }
    );
    assert_eq!(
        requests[2],
        Recorded::Update {
            id: "network-1".into(),
            body: json!({"name": "backbone"}),
        }
    );
    assert_eq!(data.get_str("name"), Some("backbone"));
    mock.verify();
}
