//! 操作主体标识

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// 操作主体 ID
///
/// 由上游认证层解析出的不透明字符串, 不会为空白。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// 解析可选的主体标识, 空白视为未解析
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(ActorId::parse(Some("  U1 ")), Some(ActorId::new("U1")));
        assert_eq!(ActorId::parse(Some("   ")), None);
        assert_eq!(ActorId::parse(None), None);
    }
}
