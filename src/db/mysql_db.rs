use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySql, Pool, Row, TypeInfo};
use tracing::{debug, info};

use crate::db::value::{date_to_json, datetime_to_json, decimal_to_json, time_to_json};
use crate::db::{ColumnInfo, GeometryInfo, GeometryKind, RowSource, Select};
use crate::error::{Result, WorkerError};
use crate::model::job::Job;

// mysql 数据源
// 每个 worker 只持有一个连接，进程结束前 close
pub struct MysqlSource {
    pool: Pool<MySql>,
    schema: String,
}

impl MysqlSource {
    // 根据任务配置建立连接
    pub async fn connect(job: &Job) -> Result<Self> {
        if let Some(driver) = job.sql_driver() {
            if !driver.to_lowercase().contains("mysql") {
                return Err(WorkerError::Config(format!(
                    "unsupported sql driver: {}",
                    driver
                )));
            }
        }
        let conn = job
            .sql_connection_info()
            .and_then(|s| s.connection.as_ref())
            .ok_or_else(|| WorkerError::Config("missing location.config.sql.connection".into()))?;
        let server = conn
            .server
            .as_deref()
            .ok_or_else(|| WorkerError::Config("missing sql server".into()))?;
        let database = conn
            .database
            .as_deref()
            .ok_or_else(|| WorkerError::Config("missing sql database".into()))?;

        let mut options = MySqlConnectOptions::new().database(database);
        options = match server.split_once(':') {
            Some((host, port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| WorkerError::Config(format!("invalid sql server: {}", server)))?;
                options.host(host).port(port)
            }
            None => options.host(server),
        };
        if let Some(uid) = conn.uid.as_deref() {
            options = options.username(uid);
        }
        if let Some(pwd) = conn.pwd.as_deref() {
            options = options.password(pwd);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        info!(server, database, "connected to source database");

        // 未配置 schema 时使用 database
        let schema = job.sql_schema().unwrap_or(database).to_string();
        Ok(MysqlSource { pool, schema })
    }
}

#[async_trait]
impl RowSource for MysqlSource {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT CAST(TABLE_NAME AS CHAR) FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME",
        )
        .bind(&self.schema)
        .fetch_all(&self.pool)
        .await?;
        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get(0)?;
            tables.push(name);
        }
        Ok(tables)
    }

    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query(
            "SELECT CAST(COLUMN_NAME AS CHAR), CAST(DATA_TYPE AS CHAR) FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION",
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get(0)?;
            let type_name: String = row.try_get(1)?;
            columns.push(ColumnInfo::new(name, type_name));
        }
        Ok(columns)
    }

    async fn geometry_info(&mut self, table: &str, column: &str) -> Result<Option<GeometryInfo>> {
        let col = quote_ident(column);
        let sql = format!(
            "SELECT CAST(ST_GeometryType({col}) AS CHAR), CAST(ST_SRID({col}) AS SIGNED) \
             FROM {table} WHERE {col} IS NOT NULL LIMIT 1",
            col = col,
            table = qualified_table(&self.schema, table)
        );
        let row = sqlx::query(&sql).fetch_optional(&self.pool).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let geom_type: String = row.try_get(0)?;
        let srid: Option<i64> = row.try_get(1)?;
        let kind = if geom_type.eq_ignore_ascii_case("point") {
            GeometryKind::Point
        } else {
            GeometryKind::Extent
        };
        Ok(Some(GeometryInfo {
            column: column.to_string(),
            kind,
            srid,
        }))
    }

    async fn fetch_rows(&mut self, select: &Select) -> Result<Vec<Vec<Value>>> {
        let sql = render_select(&self.schema, select);
        debug!(%sql, "fetching rows");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn close(&mut self) {
        self.pool.close().await;
        debug!("source database closed");
    }
}

// 生成 select 语句，几何表达式在普通列之前
// 表名带上 schema，与 information_schema 查询保持一致
fn render_select(schema: &str, select: &Select) -> String {
    let mut columns: Vec<String> = Vec::new();
    if let Some(geo) = &select.geometry {
        let col = quote_ident(&geo.column);
        match geo.kind {
            // 先 Y 后 X
            GeometryKind::Point => {
                columns.push(format!("ST_Y({})", col));
                columns.push(format!("ST_X({})", col));
            }
            // 外包矩形第 1、3 个顶点
            GeometryKind::Extent => {
                let ring = format!("ST_ExteriorRing(ST_Envelope({}))", col);
                columns.push(format!("ST_X(ST_PointN({}, 1))", ring));
                columns.push(format!("ST_Y(ST_PointN({}, 1))", ring));
                columns.push(format!("ST_X(ST_PointN({}, 3))", ring));
                columns.push(format!("ST_Y(ST_PointN({}, 3))", ring));
            }
        }
    }
    columns.extend(select.columns.iter().map(|c| quote_ident(c)));

    let mut sql = format!(
        "SELECT {} FROM {}",
        columns.join(","),
        qualified_table(schema, &select.table)
    );
    if let Some(expression) = &select.expression {
        sql.push_str(" WHERE ");
        sql.push_str(expression);
    }
    sql
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

fn decode_row(row: &MySqlRow) -> Result<Vec<Value>> {
    (0..row.columns().len())
        .map(|i| decode_value(row, i))
        .collect()
}

// 列类型对应的解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Int,
    Uint,
    Float,
    Double,
    Decimal,
    DateTime,
    Date,
    Time,
    Year,
    Json,
    Text,
    // 二进制与几何原始值不发送
    Skip,
}

fn value_kind(type_name: &str) -> ValueKind {
    let type_name = type_name.to_uppercase();
    match type_name.as_str() {
        "BOOLEAN" => ValueKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ValueKind::Int,
        t if t.ends_with("UNSIGNED") => ValueKind::Uint,
        "FLOAT" => ValueKind::Float,
        "DOUBLE" => ValueKind::Double,
        "DECIMAL" => ValueKind::Decimal,
        "DATETIME" | "TIMESTAMP" => ValueKind::DateTime,
        "DATE" => ValueKind::Date,
        "TIME" => ValueKind::Time,
        "YEAR" => ValueKind::Year,
        "JSON" => ValueKind::Json,
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY"
        | "BIT" => ValueKind::Skip,
        // CHAR VARCHAR TEXT ENUM SET 等，以及未列出的类型
        _ => ValueKind::Text,
    }
}

// 按列类型解码为 json 值，解码失败直接返回错误
fn decode_value(row: &MySqlRow, index: usize) -> Result<Value> {
    let value = match value_kind(row.column(index).type_info().name()) {
        ValueKind::Bool => row.try_get::<Option<bool>, _>(index)?.map(Value::from),
        ValueKind::Int => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        ValueKind::Uint => row.try_get::<Option<u64>, _>(index)?.map(Value::from),
        ValueKind::Float => row
            .try_get::<Option<f32>, _>(index)?
            .map(|v| Value::from(v as f64)),
        ValueKind::Double => row.try_get::<Option<f64>, _>(index)?.map(Value::from),
        ValueKind::Decimal => row
            .try_get::<Option<BigDecimal>, _>(index)?
            .map(|v| decimal_to_json(&v)),
        ValueKind::DateTime => row
            .try_get::<Option<NaiveDateTime>, _>(index)?
            .map(|v| datetime_to_json(&v)),
        ValueKind::Date => row
            .try_get::<Option<NaiveDate>, _>(index)?
            .map(|v| date_to_json(&v)),
        ValueKind::Time => row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map(|v| time_to_json(&v)),
        ValueKind::Year => row.try_get::<Option<u16>, _>(index)?.map(Value::from),
        ValueKind::Json => row.try_get::<Option<Value>, _>(index)?,
        ValueKind::Text => row.try_get::<Option<String>, _>(index)?.map(Value::from),
        ValueKind::Skip => None,
    };
    Ok(value.unwrap_or(Value::Null))
}

#[cfg(test)]
mod test_mysql_db {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("parcels"), "`parcels`");
        assert_eq!(quote_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind("YEAR"), ValueKind::Year);
        assert_eq!(value_kind("json"), ValueKind::Json);
        assert_eq!(value_kind("DECIMAL"), ValueKind::Decimal);
        assert_eq!(value_kind("INT UNSIGNED"), ValueKind::Uint);
        assert_eq!(value_kind("BIGINT"), ValueKind::Int);
        assert_eq!(value_kind("TIMESTAMP"), ValueKind::DateTime);
        assert_eq!(value_kind("VARCHAR"), ValueKind::Text);
        assert_eq!(value_kind("GEOMETRY"), ValueKind::Skip);
        assert_eq!(value_kind("BLOB"), ValueKind::Skip);
    }

    // 未列出的类型按字符串解码，不会被当作二进制丢弃
    #[test]
    fn test_unknown_type_decodes_as_text() {
        assert_eq!(value_kind("ENUM"), ValueKind::Text);
        assert_eq!(value_kind("SOMETHING_NEW"), ValueKind::Text);
    }

    #[test]
    fn test_qualified_table() {
        assert_eq!(qualified_table("dbo", "parcels"), "`dbo`.`parcels`");
        assert_eq!(qualified_table("my`db", "t"), "`my``db`.`t`");
    }

    // schema 与连接的 database 不同时，查询必须落在 schema 下的表
    #[test]
    fn test_render_select_uses_schema() {
        let select = Select::new("parcels", None, vec!["id".into()]);
        let sql = render_select("dbo", &select);
        assert_eq!(sql, "SELECT `id` FROM `dbo`.`parcels`");
        assert!(!sql.contains(" `parcels`"));
    }

    #[test]
    fn test_render_plain_select() {
        let select = Select::new("parcels", None, vec!["id".into(), "name".into()])
            .with_filter(Some("id > 1"), None);
        assert_eq!(
            render_select("gis", &select),
            "SELECT `id`,`name` FROM `gis`.`parcels` WHERE id > 1"
        );
    }

    #[test]
    fn test_render_point_select() {
        let geo = GeometryInfo {
            column: "SHAPE".into(),
            kind: GeometryKind::Point,
            srid: Some(4326),
        };
        let select = Select::new("wells", Some(geo), vec!["name".into()]);
        assert_eq!(
            render_select("gis", &select),
            "SELECT ST_Y(`SHAPE`),ST_X(`SHAPE`),`name` FROM `gis`.`wells`"
        );
    }

    #[test]
    fn test_render_extent_select() {
        let geo = GeometryInfo {
            column: "SHAPE".into(),
            kind: GeometryKind::Extent,
            srid: None,
        };
        let select = Select::new("parcels", Some(geo), vec!["name".into()]);
        let sql = render_select("gis", &select);
        assert!(sql.starts_with("SELECT ST_X(ST_PointN(ST_ExteriorRing(ST_Envelope(`SHAPE`)), 1)),"));
        assert!(sql.ends_with(",`name` FROM `gis`.`parcels`"));
        assert_eq!(sql.matches("ST_PointN").count(), 4);
    }
}
