//! Connection profiles as carried in the admin register body. The JSON
//! shape is the wire contract with the cluster observer, so the field names
//! here are load-bearing.

use serde::{Deserialize, Serialize};

use crate::models::NetworkType;

/// The register request body: network identity plus an optional
/// platform-specific profile section. The presence of `fabProfile` is what
/// makes a network a Fabric network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub id: String,
    #[serde(default)]
    pub platform: String,
    #[serde(rename = "fabProfile", skip_serializing_if = "Option::is_none")]
    pub fab_profile: Option<FabProfile>,
}

impl NetworkSpec {
    pub fn network_type(&self) -> NetworkType {
        if self.fab_profile.is_some() {
            NetworkType::Fabric
        } else {
            NetworkType::Unknown
        }
    }
}

/// Everything needed to reach one Fabric peer as one organization user:
/// the gateway endpoint, the client identity material, and the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabProfile {
    pub organization: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub endpoint: NodeEndpoint,
    #[serde(default)]
    pub channel: String,
}

/// Client identity material. Key and cert are PEM blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: Pem,
    #[serde(default)]
    pub cert: Pem,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pem {
    #[serde(default)]
    pub pem: String,
}

/// A peer gateway endpoint. A `grpcs` scheme enables TLS using the CA
/// certificate carried alongside.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeEndpoint {
    #[serde(default)]
    pub url: String,
    #[serde(rename = "tlsCACerts", default)]
    pub tls_ca_certs: TlsCaCerts,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TlsCaCerts {
    #[serde(default)]
    pub pem: String,
}
