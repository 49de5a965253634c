use serde::{Deserialize, Serialize};

use crate::Result;

/// 任务创建通知
///
/// 只携带任务ID，不携带完整记录。线上格式是单个JSON整数（如 `42`），
/// 没有信封，也没有版本字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Notification {
    pub task_id: i64,
}

impl Notification {
    pub fn new(task_id: i64) -> Self {
        Self { task_id }
    }

    /// 序列化为通道载荷
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// 从通道载荷反序列化
    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskServiceError;

    #[test]
    fn test_payload_is_bare_integer() {
        let payload = Notification::new(42).encode().unwrap();
        assert_eq!(payload, b"42");
        assert_eq!(Notification::decode(b"42").unwrap().task_id, 42);
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        for bad in [&b"not-json"[..], b"{\"id\":1}", b"\"7\"", b""] {
            let err = Notification::decode(bad).unwrap_err();
            assert!(matches!(err, TaskServiceError::Serialization(_)));
        }
    }
}
