// 按表读取数据库行，逐行转为 entry 推送到索引服务

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::db::value::as_coordinate;
use crate::db::{GeometryInfo, GeometryKind, RowSource, Select};
use crate::error::Result;
use crate::handle::filter::{select_columns, select_names};
use crate::model::entry::{Entry, Geo, GeoShape};
use crate::model::job::Job;
use crate::sink::EntrySink;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub tables: usize,
    pub entries: usize,
}

pub struct SqlWorker<'a> {
    job: &'a Job,
}

impl<'a> SqlWorker<'a> {
    pub fn new(job: &'a Job) -> Self {
        SqlWorker { job }
    }

    // 任意一步出错都直接返回，不做重试
    pub async fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<WorkerStats>
    where
        S: RowSource + ?Sized,
        K: EntrySink + ?Sized,
    {
        let tables = self.select_tables(source).await?;
        info!(location = self.job.location_id(), count = tables.len(), "tables selected");

        let mut stats = WorkerStats::default();
        for table in &tables {
            let sent = self.index_table(source, sink, table).await?;
            info!(table = %table, entries = sent, "table indexed");
            stats.tables += 1;
            stats.entries += sent;
        }
        Ok(stats)
    }

    // 表名去重后排序，每张表只处理一次
    pub async fn select_tables<S>(&self, source: &mut S) -> Result<Vec<String>>
    where
        S: RowSource + ?Sized,
    {
        let available = source.list_tables().await?;
        let mut tables = select_names(
            &available,
            self.job.tables_to_keep(),
            self.job.tables_to_skip(),
        )?;
        tables.sort();
        Ok(tables)
    }

    // 生成单表查询，返回查询与映射后的字段名
    pub async fn build_select<S>(&self, source: &mut S, table: &str) -> Result<(Select, Vec<String>)>
    where
        S: RowSource + ?Sized,
    {
        let column_info = source.list_columns(table).await?;
        let available: Vec<String> = column_info.iter().map(|c| c.name.clone()).collect();
        let mut columns = select_columns(
            table,
            &available,
            self.job.fields_to_keep(),
            self.job.fields_to_skip(),
        )?;

        // 第一个空间类型列作为几何列
        let mut geometry = None;
        if let Some(geo_col) = column_info.iter().find(|c| c.is_geometry()) {
            geometry = source.geometry_info(table, &geo_col.name).await?;
            if geometry.is_some() {
                // 几何值通过 geo 表示，不作为普通字段查询
                columns.retain(|c| c != &geo_col.name);
            }
        }

        let mapped = self.job.map_fields(table, &columns);
        let select = Select::new(table, geometry, columns).with_filter(
            self.job.table_query(table),
            self.job.table_constraint(table),
        );
        Ok((select, mapped))
    }

    async fn index_table<S, K>(&self, source: &mut S, sink: &mut K, table: &str) -> Result<usize>
    where
        S: RowSource + ?Sized,
        K: EntrySink + ?Sized,
    {
        let (select, mapped) = self.build_select(source, table).await?;
        debug!(table, geometry = ?select.geometry, expression = ?select.expression, "select built");

        let rows = source.fetch_rows(&select).await?;
        let mut sent = 0;
        for (i, row) in rows.into_iter().enumerate() {
            let entry = build_entry(self.job, table, i, &mapped, select.geometry.as_ref(), row);
            sink.send(&entry).await?;
            sent += 1;
        }
        Ok(sent)
    }
}

// 单行 -> entry
// 点：第 0 列为 lat，第 1 列为 lon；外包矩形：前四列依次为 xmin ymin xmax ymax
pub fn build_entry(
    job: &Job,
    table: &str,
    row_index: usize,
    mapped: &[String],
    geometry: Option<&GeometryInfo>,
    row: Vec<Value>,
) -> Entry {
    let lead = geometry.map(|g| g.leading_values()).unwrap_or(0);
    let coord = |i: usize| row.get(i).and_then(as_coordinate);

    let geo = geometry.map(|g| {
        let shape = match g.kind {
            GeometryKind::Point => GeoShape::Point {
                lon: coord(1),
                lat: coord(0),
            },
            GeometryKind::Extent => GeoShape::Extent {
                xmin: coord(0),
                ymin: coord(1),
                xmax: coord(2),
                ymax: coord(3),
            },
        };
        Geo {
            shape,
            code: g.srid,
        }
    });

    let mut fields = Map::new();
    for (name, value) in mapped.iter().zip(row.into_iter().skip(lead)) {
        fields.insert(name.clone(), value);
    }
    fields.remove(&job.shape_field());

    Entry::new(job, table, row_index, fields, geo)
}
