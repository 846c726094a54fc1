//! Concurrent lifecycle manager: one running pump per registered network,
//! guarded by a single mutex. Construction re-arms pumps for every network
//! persisted as Registered so ingestion resumes across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use chainlens_store::{Injector, Selector};
use chainlens_types::error::{FabricError, ListenerError, StoreError};
use chainlens_types::models::{Network, NetworkStatus, NetworkType};
use chainlens_types::profile::{FabProfile, NetworkSpec};
use tokio::sync::{watch, Mutex};

use crate::errbus::ErrorBus;
use crate::pump::{BlockEventPump, PumpBuilder};

pub struct Registry {
    shutdown: watch::Receiver<bool>,
    errbus: ErrorBus,
    injector: Arc<dyn Injector>,
    selector: Option<Arc<dyn Selector>>,
    builder: Arc<dyn PumpBuilder>,
    pumps: Mutex<HashMap<String, Box<dyn BlockEventPump>>>,
}

impl Registry {
    /// Builds the registry and pre-registers every stored network with
    /// status Registered. A failure to list networks fails construction;
    /// per-network startup failures go to the error bus and do not stop
    /// the others.
    pub async fn new(
        shutdown: watch::Receiver<bool>,
        errbus: ErrorBus,
        injector: Arc<dyn Injector>,
        selector: Option<Arc<dyn Selector>>,
        builder: Arc<dyn PumpBuilder>,
    ) -> Result<Arc<Self>, ListenerError> {
        let registry = Arc::new(Self {
            shutdown,
            errbus,
            injector,
            selector,
            builder,
            pumps: Mutex::new(HashMap::new()),
        });
        registry.pre_register().await?;
        Ok(registry)
    }

    pub fn selector(&self) -> Option<Arc<dyn Selector>> {
        self.selector.clone()
    }

    async fn pre_register(&self) -> Result<(), ListenerError> {
        let Some(selector) = &self.selector else {
            return Ok(());
        };
        let networks = selector.networks(&[]).await?;
        tracing::info!(count = networks.len(), "pre-register networks");
        for network in networks {
            if network.status != NetworkStatus::Registered {
                tracing::debug!(network = %network.id, status = %network.status, "skip pre-register");
                continue;
            }
            if let Err(err) = self.pre_register_network(&network).await {
                self.errbus.send(err).await;
            }
        }
        Ok(())
    }

    async fn pre_register_network(&self, network: &Network) -> Result<(), ListenerError> {
        tracing::info!(network = %network.id, "pre-register network");
        match network.network_type {
            NetworkType::Fabric => {
                let profile: FabProfile = serde_json::from_slice(&network.profile)
                    .map_err(|e| FabricError::InvalidProfile(e.to_string()))?;
                let start_block = match self.start_at(&network.id).await {
                    Ok(n) => n,
                    Err(err) => {
                        self.errbus.send(err).await;
                        0
                    }
                };
                let pump = self.build_pump(&network.id, &profile, start_block).await?;
                self.pumps.lock().await.insert(network.id.clone(), pump);
                Ok(())
            }
            NetworkType::Unknown => Err(ListenerError::UnknownNetworkType(network.id.clone())),
        }
    }

    async fn start_at(&self, nid: &str) -> Result<u64, ListenerError> {
        match &self.selector {
            Some(selector) => Ok(selector.network_start_at(nid).await?),
            None => Ok(0),
        }
    }

    async fn build_pump(
        &self,
        nid: &str,
        profile: &FabProfile,
        start_block: u64,
    ) -> Result<Box<dyn BlockEventPump>, ListenerError> {
        self.builder
            .build(
                self.shutdown.clone(),
                self.errbus.clone(),
                self.injector.clone(),
                nid,
                profile,
                start_block,
            )
            .await
    }

    /// Registers a network and starts its pump at checkpoint 0. The
    /// effective id of a Fabric network with a channel is
    /// `{id}_{channel}`. On any step's failure the row is not written and
    /// no pump is retained.
    pub async fn register(&self, spec: &NetworkSpec) -> Result<(), ListenerError> {
        let Some(profile) = spec.fab_profile.clone() else {
            return Err(ListenerError::UnknownNetworkType(spec.id.clone()));
        };
        let nid = if profile.channel.is_empty() {
            spec.id.clone()
        } else {
            // One blockchain is identified by network and channel.
            format!("{}_{}", spec.id, profile.channel)
        };

        if self.pumps.lock().await.contains_key(&nid) {
            return Err(ListenerError::AlreadyExists(nid));
        }

        tracing::info!(network = %nid, "registering a new fabric network");
        let profile_json = serde_json::to_vec(&profile)
            .map_err(|e| FabricError::InvalidProfile(e.to_string()))?;
        // The upstream connect can be slow; build the pump without holding
        // the registry lock, then re-check for a racing register.
        let pump = self.build_pump(&nid, &profile, 0).await?;

        let mut pumps = self.pumps.lock().await;
        if pumps.contains_key(&nid) {
            pump.close();
            return Err(ListenerError::AlreadyExists(nid));
        }

        if let Err(err) = self
            .injector
            .inject_networks(&[Network {
                id: nid.clone(),
                network_type: NetworkType::Fabric,
                platform: spec.platform.clone(),
                profile: profile_json,
                status: NetworkStatus::Registered,
            }])
            .await
        {
            pump.close();
            return Err(err.into());
        }
        pumps.insert(nid, pump);

        Ok(())
    }

    /// Flips the stored status to Deregistered and stops the pump.
    /// Deregistering an absent or already-deregistered network is a no-op
    /// success.
    pub async fn deregister(&self, nid: &str) -> Result<(), ListenerError> {
        tracing::info!(network = %nid, "deregistering network");
        let mut pumps = self.pumps.lock().await;

        if let Some(selector) = &self.selector {
            match selector.network(nid).await {
                Ok(mut network) if network.status == NetworkStatus::Registered => {
                    network.status = NetworkStatus::Deregistered;
                    self.injector.inject_networks(&[network]).await?;
                }
                Ok(_) => {}
                Err(StoreError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(pump) = pumps.remove(nid) {
            pump.close();
        }
        Ok(())
    }

    /// Removes the network row and all dependent blocks and transactions,
    /// then stops the pump. The storage cascade runs even when no pump
    /// exists, as the repair path for half-deleted networks.
    pub async fn delete(&self, nid: &str) -> Result<(), ListenerError> {
        tracing::info!(network = %nid, "deleting network");
        let mut pumps = self.pumps.lock().await;

        self.injector.delete_network(nid).await?;

        if let Some(pump) = pumps.remove(nid) {
            pump.close();
        }
        Ok(())
    }

    /// The checkpoint the named pump opened its stream at, if it runs.
    pub async fn check_point(&self, nid: &str) -> Option<u64> {
        self.pumps.lock().await.get(nid).map(|p| p.check_point())
    }

    /// Whether a pump is live for this network id.
    pub async fn is_registered(&self, nid: &str) -> bool {
        self.pumps.lock().await.contains_key(nid)
    }
}
