//! Log-only injector for development runs without a database. There is no
//! matching selector, so checkpoints start at 0 and nothing survives a
//! restart.

use async_trait::async_trait;
use chainlens_types::error::StoreError;
use chainlens_types::models::{Block, Network, Transaction};

#[derive(Debug, Default, Clone)]
pub struct LogInjector;

impl LogInjector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl crate::Injector for LogInjector {
    async fn inject_networks(&self, networks: &[Network]) -> Result<(), StoreError> {
        for net in networks {
            tracing::info!(
                network = %net.id,
                platform = %net.platform,
                network_type = %net.network_type,
                "inject network"
            );
        }
        Ok(())
    }

    async fn inject_blocks(&self, blocks: &[Block]) -> Result<(), StoreError> {
        for blk in blocks {
            tracing::info!(network = %blk.network, number = blk.block_number, "inject block");
        }
        Ok(())
    }

    async fn inject_transactions(&self, transactions: &[Transaction]) -> Result<(), StoreError> {
        for tx in transactions {
            tracing::info!(
                tx = %tx.id,
                network = %tx.network,
                number = tx.block_number,
                "inject transaction"
            );
        }
        Ok(())
    }

    async fn delete_network(&self, nid: &str) -> Result<(), StoreError> {
        tracing::info!(network = %nid, "delete network");
        Ok(())
    }
}
