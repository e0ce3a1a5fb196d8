use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfiguration {
    pub address: SocketAddr,
}
