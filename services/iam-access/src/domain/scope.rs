//! 权限范围模型

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// 逐字符忽略大小写比较 (Unicode)
///
/// 每个字符先转大写再转小写后比较, 资源/操作匹配与范围、效果解析共用此规则。
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    fn fold(c: char) -> impl Iterator<Item = char> {
        c.to_uppercase().flat_map(char::to_lowercase)
    }
    a.chars().flat_map(fold).eq(b.chars().flat_map(fold))
}

/// 范围种类
///
/// GLOBAL 不携带范围 ID; COUNTRY/PROVINCE 与主体的范围成员关系配对;
/// SELF 仅在目标 ID 等于主体 ID 时生效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScopeKind {
    #[serde(rename = "GLOBAL")]
    Global,
    #[serde(rename = "COUNTRY")]
    Country,
    #[serde(rename = "PROVINCE")]
    Province,
    #[serde(rename = "SELF")]
    SelfOnly,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Global => "GLOBAL",
            ScopeKind::Country => "COUNTRY",
            ScopeKind::Province => "PROVINCE",
            ScopeKind::SelfOnly => "SELF",
        }
    }

    /// 是否需要与主体的范围成员关系配对
    pub fn is_membership_scoped(&self) -> bool {
        matches!(self, ScopeKind::Country | ScopeKind::Province)
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeKind {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        [
            ScopeKind::Global,
            ScopeKind::Country,
            ScopeKind::Province,
            ScopeKind::SelfOnly,
        ]
        .into_iter()
        .find(|kind| eq_ignore_case(raw, kind.as_str()))
        .ok_or_else(|| AccessError::UnknownScopeKind(s.to_string()))
    }
}

/// 权限效果
///
/// 始终显式存储, 不提供默认值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Effect {
    #[serde(rename = "ALLOW")]
    Allow,
    #[serde(rename = "DENY")]
    Deny,
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Allow => write!(f, "ALLOW"),
            Effect::Deny => write!(f, "DENY"),
        }
    }
}

impl FromStr for Effect {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if eq_ignore_case(raw, "ALLOW") {
            Ok(Effect::Allow)
        } else if eq_ignore_case(raw, "DENY") {
            Ok(Effect::Deny)
        } else {
            Err(AccessError::UnknownEffect(s.to_string()))
        }
    }
}

static NO_SCOPE_IDS: BTreeSet<String> = BTreeSet::new();

/// 主体的范围成员关系, 按范围种类分组
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeMemberships {
    by_kind: HashMap<ScopeKind, BTreeSet<String>>,
}

impl ScopeMemberships {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条成员关系; 空白 ID 被忽略
    pub fn insert(&mut self, kind: ScopeKind, scope_id: impl Into<String>) {
        let scope_id = scope_id.into();
        if scope_id.trim().is_empty() {
            return;
        }
        self.by_kind.entry(kind).or_default().insert(scope_id);
    }

    pub fn with(mut self, kind: ScopeKind, scope_id: impl Into<String>) -> Self {
        self.insert(kind, scope_id);
        self
    }

    /// 某种类下的范围 ID 集合, 缺失的种类返回空集
    pub fn ids(&self, kind: ScopeKind) -> &BTreeSet<String> {
        self.by_kind.get(&kind).unwrap_or(&NO_SCOPE_IDS)
    }

    pub fn contains(&self, kind: ScopeKind, scope_id: &str) -> bool {
        self.ids(kind).contains(scope_id)
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.values().all(BTreeSet::is_empty)
    }
}

/// 被操作实体的最小投影
///
/// 创建操作时由请求中的目标国家/省份构造 (没有 id);
/// 更新/删除/查看时由已持久化的行构造。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub country_id: Option<String>,
    #[serde(default)]
    pub province_id: Option<String>,
}

impl TargetDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// 尚未持久化的目标 (创建请求)
    pub fn for_create(country_id: Option<String>, province_id: Option<String>) -> Self {
        Self {
            id: None,
            country_id,
            province_id,
        }
    }

    pub fn with_country(mut self, country_id: impl Into<String>) -> Self {
        self.country_id = Some(country_id.into());
        self
    }

    pub fn with_province(mut self, province_id: impl Into<String>) -> Self {
        self.province_id = Some(province_id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        non_blank(self.id.as_deref())
    }

    pub fn country_id(&self) -> Option<&str> {
        non_blank(self.country_id.as_deref())
    }

    pub fn province_id(&self) -> Option<&str> {
        non_blank(self.province_id.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
