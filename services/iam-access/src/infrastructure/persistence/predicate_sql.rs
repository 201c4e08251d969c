//! 过滤条件翻译为 PostgreSQL WHERE 片段

use scopegate_config::ColumnConfig;
use sqlx::{Postgres, QueryBuilder};

use crate::domain::authorization::{Predicate, TargetField};
use crate::error::AccessError;

/// 目标字段到列名的映射
///
/// 列名直接拼入 SQL, 只接受 `name` 或 `alias.name` 形式的标识符。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    id: String,
    country_id: String,
    province_id: String,
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn validate_column(column: &str) -> Result<String, AccessError> {
    let parts: Vec<&str> = column.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| is_identifier(p)) {
        return Err(AccessError::InvalidRequest(format!(
            "Invalid filter column name: {:?}",
            column
        )));
    }
    Ok(column.to_string())
}

impl ColumnMapping {
    pub fn new(id: &str, country_id: &str, province_id: &str) -> Result<Self, AccessError> {
        Ok(Self {
            id: validate_column(id)?,
            country_id: validate_column(country_id)?,
            province_id: validate_column(province_id)?,
        })
    }

    pub fn column(&self, field: TargetField) -> &str {
        match field {
            TargetField::Id => &self.id,
            TargetField::CountryId => &self.country_id,
            TargetField::ProvinceId => &self.province_id,
        }
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            country_id: "country_id".to_string(),
            province_id: "province_id".to_string(),
        }
    }
}

impl TryFrom<&ColumnConfig> for ColumnMapping {
    type Error = AccessError;

    fn try_from(config: &ColumnConfig) -> Result<Self, Self::Error> {
        Self::new(&config.id, &config.country_id, &config.province_id)
    }
}

/// 把过滤条件追加到查询中
///
/// `DenyAll` → `FALSE`, `AllowAll` → `TRUE`,
/// `Or` → `(col = ANY($n) OR ...)`, ID 集合作为数组参数绑定。
pub fn push_predicate(
    builder: &mut QueryBuilder<'_, Postgres>,
    predicate: &Predicate,
    columns: &ColumnMapping,
) {
    match predicate {
        Predicate::DenyAll => {
            builder.push("FALSE");
        }
        Predicate::AllowAll => {
            builder.push("TRUE");
        }
        Predicate::Or { clauses } if clauses.is_empty() => {
            builder.push("FALSE");
        }
        Predicate::Or { clauses } => {
            builder.push("(");
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder.push(columns.column(clause.field));
                builder.push(" = ANY(");
                builder.push_bind(clause.ids.iter().cloned().collect::<Vec<String>>());
                builder.push(")");
            }
            builder.push(")");
        }
    }
}
