// 位置(location)索引任务配置

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::Result;
use crate::util::common as util_common;
use crate::util::pattern::Pattern;

// 未配置 include 时默认保留全部
static KEEP_ALL: LazyLock<Vec<String>> = LazyLock::new(|| vec!["*".to_string()]);

const ACTION_ADD: &str = "ADD";

// 声明任务配置结构
// 所有可选项在读取时给出默认值，缺失的 key 不会报错
#[derive(Debug, Deserialize, Clone)]
pub struct Job {
    pub location: Location,
    pub connection: Option<Connection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Location {
    pub id: String,
    pub config: Option<LocationConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LocationConfig {
    pub fields: Option<FieldsConfig>,
    pub tables: Option<TablesConfig>,
    pub sql: Option<SqlConfig>,
    pub path: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FieldsConfig {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub mapping: Option<Vec<FieldMapping>>,
    pub map_default_prefix: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldMapping {
    pub table: String,
    pub map: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TablesConfig {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub constraints: Option<Vec<TableConstraint>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConstraint {
    pub table: String,
    pub constraint: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SqlConfig {
    pub connection: Option<SqlConnection>,
    pub query: Option<String>,
    pub queries: Option<Vec<TableQuery>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableQuery {
    pub table: String,
    pub query: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SqlConnection {
    pub driver: Option<String>,
    pub server: Option<String>,
    pub database: Option<String>,
    pub uid: Option<String>,
    pub pwd: Option<String>,
    pub schema: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Connection {
    /// 索引服务的 PUSH 地址，例如 tcp://127.0.0.1:7777
    pub indexer: Option<String>,
}

fn table_matches(pattern: &str, table_name: &str) -> bool {
    Pattern::new(pattern).is_ok_and(|p| p.is_match(table_name))
}

impl Job {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        util_common::load_job_config(path)
    }

    fn config(&self) -> Option<&LocationConfig> {
        self.location.config.as_ref()
    }

    fn fields(&self) -> Option<&FieldsConfig> {
        self.config().and_then(|c| c.fields.as_ref())
    }

    fn tables(&self) -> Option<&TablesConfig> {
        self.config().and_then(|c| c.tables.as_ref())
    }

    fn sql(&self) -> Option<&SqlConfig> {
        self.config().and_then(|c| c.sql.as_ref())
    }

    fn sql_connection(&self) -> Option<&SqlConnection> {
        self.sql().and_then(|s| s.connection.as_ref())
    }

    pub fn location_id(&self) -> &str {
        &self.location.id
    }

    pub fn action_type(&self) -> &'static str {
        ACTION_ADD
    }

    /// 需要保留的字段(可含通配符)，默认 `["*"]`
    pub fn fields_to_keep(&self) -> &[String] {
        self.fields()
            .and_then(|f| f.include.as_deref())
            .unwrap_or(&KEEP_ALL)
    }

    pub fn fields_to_skip(&self) -> Option<&[String]> {
        self.fields().and_then(|f| f.exclude.as_deref())
    }

    pub fn field_mapping(&self) -> Option<&[FieldMapping]> {
        self.fields().and_then(|f| f.mapping.as_deref())
    }

    /// 未映射字段的默认前缀，空字符串视为未配置
    pub fn default_mapping(&self) -> Option<&str> {
        self.fields()
            .and_then(|f| f.map_default_prefix.as_deref())
            .filter(|p| !p.is_empty())
    }

    pub fn tables_to_keep(&self) -> &[String] {
        self.tables()
            .and_then(|t| t.include.as_deref())
            .unwrap_or(&KEEP_ALL)
    }

    pub fn tables_to_skip(&self) -> Option<&[String]> {
        self.tables().and_then(|t| t.exclude.as_deref())
    }

    pub fn path(&self) -> &str {
        self.config().and_then(|c| c.path.as_deref()).unwrap_or("")
    }

    pub fn url(&self) -> &str {
        self.config().and_then(|c| c.url.as_deref()).unwrap_or("")
    }

    pub fn sql_driver(&self) -> Option<&str> {
        self.sql_connection().and_then(|c| c.driver.as_deref())
    }

    pub fn sql_connection_info(&self) -> Option<&SqlConfig> {
        self.sql()
    }

    pub fn sql_query(&self) -> Option<&str> {
        self.sql().and_then(|s| s.query.as_deref())
    }

    pub fn sql_schema(&self) -> Option<&str> {
        self.sql_connection().and_then(|c| c.schema.as_deref())
    }

    pub fn indexer(&self) -> Option<&str> {
        self.connection.as_ref().and_then(|c| c.indexer.as_deref())
    }

    /// 表级查询条件：优先匹配 sql.queries，其次使用全局 sql.query
    pub fn table_query(&self, table_name: &str) -> Option<&str> {
        self.sql()
            .and_then(|s| s.queries.as_deref())
            .and_then(|qs| qs.iter().find(|q| table_matches(&q.table, table_name)))
            .map(|q| q.query.as_str())
            .or_else(|| self.sql_query())
            .filter(|q| !q.trim().is_empty())
    }

    pub fn table_constraint(&self, table_name: &str) -> Option<&str> {
        self.tables()
            .and_then(|t| t.constraints.as_deref())
            .and_then(|cs| cs.iter().find(|c| table_matches(&c.table, table_name)))
            .map(|c| c.constraint.as_str())
            .filter(|c| !c.trim().is_empty())
    }

    // 字段重命名，输出顺序与输入一致
    // 映射表按顺序处理：'*' 在当前结果上继续映射，表名相同(不区分大小写)则从原始字段重新映射，
    // 遇到第一个不匹配的表项直接返回当前结果，后面的表项不再处理
    pub fn map_fields(&self, table_name: &str, field_names: &[String]) -> Vec<String> {
        let default_map = self.default_mapping();
        let mut mapped = field_names.to_vec();

        match self.field_mapping().filter(|m| !m.is_empty()) {
            Some(mappings) => {
                for mapping in mappings {
                    if mapping.table == "*" {
                        // 在当前结果上继续映射
                    } else if mapping.table.to_lowercase() == table_name.to_lowercase() {
                        mapped = field_names.to_vec();
                    } else {
                        return mapped;
                    }
                    for name in mapped.iter_mut() {
                        match mapping.map.get(name.as_str()) {
                            Some(new_name) => *name = new_name.clone(),
                            None => {
                                if let Some(prefix) = default_map {
                                    *name = format!("{}{}", prefix, name);
                                }
                            }
                        }
                    }
                }
                mapped
            }
            None => match default_map {
                Some(prefix) => mapped
                    .iter()
                    .map(|name| format!("{}{}", prefix, name))
                    .collect(),
                None => mapped,
            },
        }
    }

    /// 原始 shape 字段名，在 entry 中由 geo 表示
    pub fn shape_field(&self) -> String {
        match self.default_mapping() {
            Some(prefix) => format!("{}Shape", prefix),
            None => "SHAPE".to_string(),
        }
    }
}
