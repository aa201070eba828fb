//! Configuração do servidor via variáveis de ambiente.

use std::net::SocketAddr;

use anyhow::{Context, Result};

pub const ADDR_VAR: &str = "BRAT_WEB_ADDR";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Lê `BRAT_WEB_ADDR` (padrão `0.0.0.0:3000`).
    pub fn from_env() -> Result<Self> {
        Self::from_addr(std::env::var(ADDR_VAR).ok().as_deref())
    }

    fn from_addr(value: Option<&str>) -> Result<Self> {
        let raw = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(DEFAULT_ADDR);
        let addr = raw
            .parse()
            .with_context(|| format!("{ADDR_VAR} inválido: {raw:?}"))?;
        Ok(Self { addr })
    }
}
