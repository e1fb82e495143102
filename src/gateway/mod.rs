//! 设备网关客户端
//!
//! 编排器以「工具」形式调用的外部设备能力：按地址读写寄存器。
//! 客户端自带独立超时（默认 10s，与轮取消无关），超时与失败都作为
//! 动作失败上报，不是致命错误。

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;

/// 网关操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    Read,
    Write,
}

impl GatewayOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayOp::Read => "read",
            GatewayOp::Write => "write",
        }
    }
}

/// 一次网关调用：操作 + 寄存器地址（如 D100）+ 写入值
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub op: GatewayOp,
    pub address: String,
    pub value: Option<i64>,
}

impl GatewayRequest {
    /// 从后端动作提案解析：target 为 op 名，params 携带 address / value。
    /// 非法输入返回 Err，由上层转为失败的 ToolResult。
    pub fn from_params(target: &str, params: &Value) -> Result<Self, String> {
        let op = match target.trim().to_lowercase().as_str() {
            "read" => GatewayOp::Read,
            "write" => GatewayOp::Write,
            other => return Err(format!("Unsupported gateway op: {}", other)),
        };

        let address = params
            .get("address")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Missing gateway param: address".to_string())?
            .to_uppercase();

        let value = params.get("value").and_then(|v| v.as_i64());
        if op == GatewayOp::Write && value.is_none() {
            return Err("Missing gateway param: value (required for write)".to_string());
        }

        Ok(Self { op, address, value })
    }
}

/// 设备网关接口：实现方自带超时，取消须及时生效
#[async_trait]
pub trait DeviceGateway: Send + Sync {
    async fn invoke(
        &self,
        request: &GatewayRequest,
        cancel: CancellationToken,
    ) -> Result<String, AgentError>;
}

pub use http::HttpDeviceGateway;
pub use mock::MockDeviceGateway;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_params_read() {
        let request = GatewayRequest::from_params("read", &json!({"address": "d100"})).unwrap();
        assert_eq!(request.op, GatewayOp::Read);
        assert_eq!(request.address, "D100");
        assert!(request.value.is_none());
    }

    #[test]
    fn test_from_params_write_requires_value() {
        let err = GatewayRequest::from_params("write", &json!({"address": "D100"})).unwrap_err();
        assert!(err.contains("value"));

        let request =
            GatewayRequest::from_params("write", &json!({"address": "D100", "value": 7})).unwrap();
        assert_eq!(request.value, Some(7));
    }

    #[test]
    fn test_from_params_rejects_bad_input() {
        assert!(GatewayRequest::from_params("reboot", &json!({"address": "D100"})).is_err());
        assert!(GatewayRequest::from_params("read", &json!({})).is_err());
        assert!(GatewayRequest::from_params("read", &json!({"address": "  "})).is_err());
    }
}
