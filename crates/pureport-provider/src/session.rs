//! # Provider Session
//!
//! A [`Session`] starts one simulated API collection per remote object
//! family and hands out drivers bound to them. Dropping every handle closes
//! the collections' channels; [`Session::shutdown`] drops the session's own
//! handles and waits for the tasks to finish.
//!
//! Drivers handed out earlier hold handle clones that keep their collection
//! running. Shutdown waits at most [`SHUTDOWN_GRACE`] (or the duration given
//! to [`Session::shutdown_within`]) and then aborts collections still held
//! open. Later calls through such a driver fail with a transport error.
//!
//! ```rust,ignore
//! let session = Session::start(&ProviderConfig::default());
//! session.seed_account(Account::new("ac-1", "prod-east")).await?;
//!
//! let mut network = ResourceData::from_config(NetworkResource::schema(), config)?;
//! session.networks().create(&mut network).await?;
//!
//! session.shutdown().await;
//! ```

use crate::config::ProviderConfig;
use crate::model::{Account, Connection, Network};
use crate::resources::{
    AccountResource, AccountsDataSource, AwsConnectionResource, AzureConnectionResource,
    GoogleCloudConnectionResource, NetworkResource,
};
use crate::simulation::{AccountsApi, ConnectionsApi, NetworksApi};
use reconcile_framework::simulator::{ApiHandle, Fault, SimulatedApi, Verb};
use reconcile_framework::{ExternalId, ReconcileError, ResourceData, ResourceDriver, TransportError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long [`Session::shutdown`] waits for each collection to drain.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub type AccountDriver = ResourceDriver<AccountResource, ApiHandle<AccountsApi>>;
pub type NetworkDriver = ResourceDriver<NetworkResource, ApiHandle<NetworksApi>>;
pub type GoogleCloudConnectionDriver =
    ResourceDriver<GoogleCloudConnectionResource, ApiHandle<ConnectionsApi>>;
pub type AwsConnectionDriver = ResourceDriver<AwsConnectionResource, ApiHandle<ConnectionsApi>>;
pub type AzureConnectionDriver =
    ResourceDriver<AzureConnectionResource, ApiHandle<ConnectionsApi>>;

pub struct Session {
    accounts: ApiHandle<AccountsApi>,
    networks: ApiHandle<NetworksApi>,
    connections: ApiHandle<ConnectionsApi>,
    handles: Vec<JoinHandle<()>>,
}

impl Session {
    /// Spawns the simulated collections. Must be called inside a tokio
    /// runtime.
    pub fn start(config: &ProviderConfig) -> Self {
        let endpoint = config.endpoint.as_str();
        let buffer = config.channel_buffer;

        let (accounts_api, accounts) = SimulatedApi::<AccountsApi>::new(buffer, endpoint);
        let (networks_api, networks) = SimulatedApi::<NetworksApi>::new(buffer, endpoint);
        let (connections_api, connections) = SimulatedApi::<ConnectionsApi>::new(buffer, endpoint);

        let handles = vec![
            tokio::spawn(accounts_api.run()),
            tokio::spawn(networks_api.run()),
            tokio::spawn(connections_api.run()),
        ];
        info!(%endpoint, buffer, "Session started");

        Self {
            accounts,
            networks,
            connections,
            handles,
        }
    }

    pub fn accounts(&self) -> AccountDriver {
        ResourceDriver::new(self.accounts.clone())
    }

    pub fn networks(&self) -> NetworkDriver {
        ResourceDriver::new(self.networks.clone())
    }

    pub fn google_cloud_connections(&self) -> GoogleCloudConnectionDriver {
        ResourceDriver::new(self.connections.clone())
    }

    pub fn aws_connections(&self) -> AwsConnectionDriver {
        ResourceDriver::new(self.connections.clone())
    }

    pub fn azure_connections(&self) -> AzureConnectionDriver {
        ResourceDriver::new(self.connections.clone())
    }

    /// Reads the `pureport_accounts` data source.
    pub async fn read_accounts(&self, data: &mut ResourceData) -> Result<(), ReconcileError> {
        AccountsDataSource::read(&self.accounts, data).await
    }

    /// Makes an account visible. Accounts cannot be created through the API.
    pub async fn seed_account(&self, account: Account) -> Result<ExternalId, TransportError> {
        self.accounts.seed(account).await
    }

    /// Stores a network directly, bypassing the create path.
    pub async fn seed_network(&self, network: Network) -> Result<ExternalId, TransportError> {
        self.networks.seed(network).await
    }

    pub async fn seed_connection(&self, connection: Connection) -> Result<ExternalId, TransportError> {
        self.connections.seed(connection).await
    }

    /// Raw access to the collections, for out-of-band changes and fault
    /// injection.
    pub fn accounts_api(&self) -> &ApiHandle<AccountsApi> {
        &self.accounts
    }

    pub fn networks_api(&self) -> &ApiHandle<NetworksApi> {
        &self.networks
    }

    pub fn connections_api(&self) -> &ApiHandle<ConnectionsApi> {
        &self.connections
    }

    /// Fails the next account listing with `fault`.
    pub async fn fail_next_account_listing(&self, fault: Fault) -> Result<(), TransportError> {
        self.accounts.inject(Verb::Find, fault).await
    }

    /// Closes every collection and waits up to [`SHUTDOWN_GRACE`] for the
    /// tasks to drain.
    pub async fn shutdown(self) {
        self.shutdown_within(SHUTDOWN_GRACE).await;
    }

    /// Closes every collection, waits up to `grace` for each task, and
    /// aborts the ones still kept alive by outstanding drivers.
    pub async fn shutdown_within(self, grace: Duration) {
        let Self {
            accounts,
            networks,
            connections,
            handles,
        } = self;
        drop(accounts);
        drop(networks);
        drop(connections);

        let mut aborted = 0;
        for mut handle in handles {
            if tokio::time::timeout(grace, &mut handle).await.is_err() {
                handle.abort();
                let _ = handle.await;
                aborted += 1;
            }
        }
        if aborted > 0 {
            warn!(aborted, "Collections still in use were aborted");
        }
        info!("Session shut down");
    }
}
