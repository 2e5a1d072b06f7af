//! Runs one reconciliation lifecycle against the simulated API:
//! list accounts, create a network and a Google Cloud connection, change the
//! connection's description, then delete both.
//!
//! ```bash
//! cargo run -p pureport-provider                     # defaults
//! cargo run -p pureport-provider -- provider.toml    # from a file
//! RUST_LOG=debug cargo run -p pureport-provider      # request payloads
//! ```

use pureport_provider::model::Account;
use pureport_provider::resources::{AccountsDataSource, GoogleCloudConnectionResource, NetworkResource};
use pureport_provider::{ProviderConfig, ProviderError, Session};
use reconcile_framework::record::fields;
use reconcile_framework::tracing::setup_tracing;
use reconcile_framework::{ResourceData, ResourceKind};
use tracing::{info, Instrument};

#[tokio::main]
async fn main() -> Result<(), ProviderError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ProviderConfig::load(path)?,
        None => ProviderConfig::from_env()?,
    };
    setup_tracing(&config.log_filter);

    let session = Session::start(&config);
    session.seed_account(Account::new("ac-1", "prod-east")).await?;
    session.seed_account(Account::new("ac-2", "dev-west")).await?;

    let mut accounts = ResourceData::from_config(
        AccountsDataSource::schema(),
        fields([("name_regex", "prod-.*".into())]),
    )
    .map_err(invalid_record(AccountsDataSource::KIND))?;
    session.read_accounts(&mut accounts).await?;
    info!(
        matched = accounts.get_list("accounts").map_or(0, <[_]>::len),
        "Accounts data source read"
    );

    let networks = session.networks();
    let mut network = ResourceData::from_config(
        NetworkResource::schema(),
        fields([
            ("name", "core".into()),
            ("description", "backbone".into()),
            ("account_id", "ac-1".into()),
        ]),
    )
    .map_err(invalid_record(NetworkResource::KIND))?;
    networks
        .create(&mut network)
        .instrument(tracing::info_span!("network"))
        .await?;
    let network_id = network
        .id()
        .cloned()
        .ok_or(ProviderError::Unresolved {
            kind: NetworkResource::KIND,
            step: "create",
        })?;
    let network_href = network.get_str("href").unwrap_or_default().to_string();

    let connections = session.google_cloud_connections();
    let mut connection = ResourceData::from_config(
        GoogleCloudConnectionResource::schema(),
        fields([
            ("name", "gcp-primary".into()),
            ("speed", 50i64.into()),
            ("billing_term", "HOURLY".into()),
            ("location_href", "/locations/us-ral".into()),
            (
                "network",
                vec![fields([
                    ("id", network_id.as_str().into()),
                    ("href", network_href.into()),
                ])]
                .into(),
            ),
            ("primary_pairing_key", "00000000-0000-0000-0000-000000000000/us-east4/1".into()),
        ]),
    )
    .map_err(invalid_record(GoogleCloudConnectionResource::KIND))?;

    async {
        connections.create(&mut connection).await?;
        connection
            .set_config("description", "primary interconnect")
            .map_err(invalid_record(GoogleCloudConnectionResource::KIND))?;
        connections.update(&mut connection).await?;
        info!(
            state = connection.get_str("state").unwrap_or("unknown"),
            "Connection reconciled"
        );
        connections.delete(&mut connection).await?;
        Ok::<_, ProviderError>(())
    }
    .instrument(tracing::info_span!("connection"))
    .await?;

    networks.delete(&mut network).await?;

    drop(networks);
    drop(connections);
    session.shutdown().await;
    Ok(())
}

fn invalid_record(kind: &'static str) -> impl Fn(reconcile_framework::FieldError) -> ProviderError {
    move |source| ProviderError::InvalidRecord { kind, source }
}
