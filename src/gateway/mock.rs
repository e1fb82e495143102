//! Mock 设备网关（无硬件环境）
//!
//! 内存寄存器表：未写过的地址读出 0；可设置人工延迟模拟慢网关，
//! 超过自身超时时与真实网关一样返回 GatewayTimeout。

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;
use crate::gateway::{DeviceGateway, GatewayOp, GatewayRequest};

pub struct MockDeviceGateway {
    registers: RwLock<HashMap<String, i64>>,
    latency: Duration,
    timeout: Duration,
}

impl MockDeviceGateway {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO, Duration::from_secs(10))
    }

    /// 指定人工延迟与自身超时（用于测试慢网关路径）
    pub fn with_latency(latency: Duration, timeout: Duration) -> Self {
        Self {
            registers: RwLock::new(HashMap::new()),
            latency,
            timeout,
        }
    }

    /// 预置寄存器值
    pub fn preset(self, address: &str, value: i64) -> Self {
        if let Ok(mut registers) = self.registers.write() {
            registers.insert(address.to_uppercase(), value);
        }
        self
    }

    async fn call(&self, request: &GatewayRequest) -> Result<String, AgentError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match request.op {
            GatewayOp::Read => {
                let value = self
                    .registers
                    .read()
                    .map_err(|_| AgentError::GatewayFailed("register table poisoned".to_string()))?
                    .get(&request.address)
                    .copied()
                    .unwrap_or(0);
                Ok(format!("{} = {}", request.address, value))
            }
            GatewayOp::Write => {
                let value = request.value.unwrap_or(0);
                self.registers
                    .write()
                    .map_err(|_| AgentError::GatewayFailed("register table poisoned".to_string()))?
                    .insert(request.address.clone(), value);
                Ok(format!("{} <- {} (ok)", request.address, value))
            }
        }
    }
}

impl Default for MockDeviceGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceGateway for MockDeviceGateway {
    async fn invoke(
        &self,
        request: &GatewayRequest,
        cancel: CancellationToken,
    ) -> Result<String, AgentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            r = tokio::time::timeout(self.timeout, self.call(request)) => match r {
                Ok(inner) => inner,
                Err(_) => Err(AgentError::GatewayTimeout(format!(
                    "{} {}",
                    request.op.as_str(),
                    request.address
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_preset_and_default() {
        let gateway = MockDeviceGateway::new().preset("D100", 42);
        let cancel = CancellationToken::new();

        let request = GatewayRequest::from_params("read", &json!({"address": "D100"})).unwrap();
        let result = gateway.invoke(&request, cancel.clone()).await.unwrap();
        assert_eq!(result, "D100 = 42");

        let request = GatewayRequest::from_params("read", &json!({"address": "D200"})).unwrap();
        let result = gateway.invoke(&request, cancel).await.unwrap();
        assert_eq!(result, "D200 = 0");
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let gateway = MockDeviceGateway::new();
        let cancel = CancellationToken::new();

        let write =
            GatewayRequest::from_params("write", &json!({"address": "M5", "value": 1})).unwrap();
        gateway.invoke(&write, cancel.clone()).await.unwrap();

        let read = GatewayRequest::from_params("read", &json!({"address": "M5"})).unwrap();
        let result = gateway.invoke(&read, cancel).await.unwrap();
        assert_eq!(result, "M5 = 1");
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let gateway =
            MockDeviceGateway::with_latency(Duration::from_millis(100), Duration::from_millis(20));
        let request = GatewayRequest::from_params("read", &json!({"address": "D100"})).unwrap();

        let result = gateway.invoke(&request, CancellationToken::new()).await;
        assert!(matches!(result, Err(AgentError::GatewayTimeout(_))));
    }
}
