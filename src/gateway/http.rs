//! HTTP 设备网关
//!
//! GET /registers/{addr} 读取、POST /registers/{addr} 写入；
//! reqwest 客户端在 builder 层设置超时，超时转 GatewayTimeout。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;
use crate::gateway::{DeviceGateway, GatewayOp, GatewayRequest};

pub struct HttpDeviceGateway {
    client: Client,
    base_url: String,
}

impl HttpDeviceGateway {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let base_url: String = base_url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn call(&self, request: &GatewayRequest) -> Result<String, AgentError> {
        let url = format!("{}/registers/{}", self.base_url, request.address);

        let response = match request.op {
            GatewayOp::Read => self.client.get(&url).send().await,
            GatewayOp::Write => {
                let body = serde_json::json!({ "value": request.value });
                self.client.post(&url).json(&body).send().await
            }
        };

        let response = response.map_err(|e| {
            if e.is_timeout() {
                AgentError::GatewayTimeout(format!("{} {}", request.op.as_str(), request.address))
            } else {
                AgentError::GatewayFailed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(AgentError::GatewayFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::GatewayFailed(e.to_string()))?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        Ok(match request.op {
            GatewayOp::Read => format!("{} = {}", request.address, value),
            GatewayOp::Write => format!(
                "{} <- {} (ok)",
                request.address,
                request.value.unwrap_or_default()
            ),
        })
    }
}

#[async_trait]
impl DeviceGateway for HttpDeviceGateway {
    async fn invoke(
        &self,
        request: &GatewayRequest,
        cancel: CancellationToken,
    ) -> Result<String, AgentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            r = self.call(request) => r,
        }
    }
}
