//! ONOS REST client (`/onos/v1`).
//!
//! ureq is blocking, so every request runs on the tokio blocking pool. The
//! agent carries one overall timeout per request; a hung controller turns
//! into [`Error::Transport`] instead of stalling the loop.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use raven_core::config::ControllerConfig;
use raven_core::inventory::{Device, Host, InventoryLink};
use raven_core::naming::friendly_name;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{ControllerApi, Error, FlowRule, Result};

#[derive(Debug, Default, Deserialize)]
struct DevicesBody {
    #[serde(default)]
    devices: Vec<Device>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksBody {
    #[serde(default)]
    links: Vec<InventoryLink>,
}

#[derive(Debug, Default, Deserialize)]
struct HostsBody {
    #[serde(default)]
    hosts: Vec<Host>,
}

/// HTTP client for one ONOS instance.
#[derive(Debug, Clone)]
pub struct OnosClient {
    base_url: String,
    agent: ureq::Agent,
    authorization: String,
}

impl OnosClient {
    /// Client for the controller described by `cfg`.
    pub fn new(cfg: &ControllerConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(cfg.request_timeout())
            .timeout(cfg.request_timeout())
            .build();
        let credentials = STANDARD.encode(format!("{}:{}", cfg.username, cfg.password));
        Self {
            base_url: format!("{}/onos/v1", cfg.url.trim_end_matches('/')),
            agent,
            authorization: format!("Basic {credentials}"),
        }
    }

    /// Root of the REST API, e.g. `http://onos:8181/onos/v1`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T>(&self, resource: &str) -> Result<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}/{resource}", self.base_url);
        let agent = self.agent.clone();
        let authorization = self.authorization.clone();
        let body = tokio::task::spawn_blocking(move || -> Result<String> {
            let resp = agent
                .get(&url)
                .set("Authorization", &authorization)
                .set("Accept", "application/json")
                .call()
                .map_err(|e| map_ureq_error(e, &url))?;
            Ok(resp.into_string()?)
        })
        .await
        .map_err(|e| Error::Join(e.to_string()))??;
        Ok(serde_json::from_str(&body)?)
    }
}

fn map_ureq_error(err: ureq::Error, url: &str) -> Error {
    match err {
        ureq::Error::Status(code, _) => Error::Status {
            code,
            url: url.to_string(),
        },
        ureq::Error::Transport(t) => Error::Transport(t.to_string()),
    }
}

#[async_trait]
impl ControllerApi for OnosClient {
    async fn fetch_devices(&self) -> Result<Vec<Device>> {
        let body: DevicesBody = self.get_json("devices").await?;
        debug!(count = body.devices.len(), "fetched devices");
        Ok(body.devices)
    }

    async fn fetch_links(&self) -> Result<Vec<InventoryLink>> {
        let body: LinksBody = self.get_json("links").await?;
        debug!(count = body.links.len(), "fetched links");
        Ok(body.links)
    }

    async fn fetch_hosts(&self) -> Result<Vec<Host>> {
        let body: HostsBody = self.get_json("hosts").await?;
        debug!(count = body.hosts.len(), "fetched hosts");
        Ok(body.hosts)
    }

    /// Success means HTTP 200 or 201; anything else is a failed write.
    async fn install_flow(&self, rule: &FlowRule) -> Result<()> {
        let url = format!("{}/flows/{}", self.base_url, rule.device_id);
        let agent = self.agent.clone();
        let authorization = self.authorization.clone();
        let payload = rule.to_onos_json().to_string();
        let status = tokio::task::spawn_blocking(move || -> Result<u16> {
            let resp = agent
                .post(&url)
                .set("Authorization", &authorization)
                .set("Content-Type", "application/json")
                .send_string(&payload)
                .map_err(|e| map_ureq_error(e, &url))?;
            match resp.status() {
                code @ (200 | 201) => Ok(code),
                code => Err(Error::Status { code, url }),
            }
        })
        .await
        .map_err(|e| Error::Join(e.to_string()))??;
        info!(
            switch = %friendly_name(&rule.device_id),
            next_hop = %friendly_name(&rule.next_hop),
            dst = %rule.dst_mac,
            port = %rule.output_port,
            status,
            "flow installed"
        );
        Ok(())
    }
}
