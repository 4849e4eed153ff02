pub mod mysql_db;
pub mod value;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// 空间类型列名
const SPATIAL_TYPES: [&str; 9] = [
    "geometry",
    "point",
    "linestring",
    "polygon",
    "multipoint",
    "multilinestring",
    "multipolygon",
    "geometrycollection",
    // mysql 8 的 DATA_TYPE
    "geomcollection",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ColumnInfo {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    pub fn is_geometry(&self) -> bool {
        SPATIAL_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.type_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    // 线、面等，使用外包矩形
    Extent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryInfo {
    pub column: String,
    pub kind: GeometryKind,
    pub srid: Option<i64>,
}

impl GeometryInfo {
    /// 查询结果中几何值占用的前置列数
    pub fn leading_values(&self) -> usize {
        match self.kind {
            GeometryKind::Point => 2,
            GeometryKind::Extent => 4,
        }
    }
}

// 单表查询
// 几何列表达式在前，普通列在后
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: String,
    pub geometry: Option<GeometryInfo>,
    pub columns: Vec<String>,
    pub expression: Option<String>,
}

impl Select {
    pub fn new(table: &str, geometry: Option<GeometryInfo>, columns: Vec<String>) -> Self {
        Select {
            table: table.to_string(),
            geometry,
            columns,
            expression: None,
        }
    }

    // query 与 constraint 同时存在时用 AND 连接
    pub fn with_filter(mut self, query: Option<&str>, constraint: Option<&str>) -> Self {
        self.expression = match (query, constraint) {
            (Some(q), Some(c)) => Some(format!("{} AND {}", q, c)),
            (Some(q), None) => Some(q.to_string()),
            (None, Some(c)) => Some(c.to_string()),
            (None, None) => None,
        };
        self
    }
}

/// 数据源：表结构查询与取数
#[async_trait]
pub trait RowSource: Send {
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// 几何类型与空间参考，表中没有非空几何值时返回 None
    async fn geometry_info(&mut self, table: &str, column: &str) -> Result<Option<GeometryInfo>>;

    async fn fetch_rows(&mut self, select: &Select) -> Result<Vec<Vec<Value>>>;

    async fn close(&mut self);
}
