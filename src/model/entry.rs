// 发送给索引服务的文档

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::job::Job;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Entry {
    pub id: String,
    pub location: String,
    pub action: String,
    pub entry: EntryBody,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryBody {
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Geo {
    #[serde(flatten)]
    pub shape: GeoShape,
    /// 空间参考 id (srid)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
}

// 点坐标或外包矩形，NULL 几何对应 None
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum GeoShape {
    Point {
        lon: Option<f64>,
        lat: Option<f64>,
    },
    Extent {
        xmin: Option<f64>,
        ymin: Option<f64>,
        xmax: Option<f64>,
        ymax: Option<f64>,
    },
}

impl Entry {
    pub fn new(
        job: &Job,
        table: &str,
        row_index: usize,
        fields: Map<String, Value>,
        geo: Option<Geo>,
    ) -> Self {
        Entry {
            id: entry_id(job.location_id(), table, row_index),
            location: job.location_id().to_string(),
            action: job.action_type().to_string(),
            entry: EntryBody { fields, geo },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

pub fn entry_id(location_id: &str, table: &str, row_index: usize) -> String {
    format!("{}_{}_{}", location_id, table, row_index)
}

#[cfg(test)]
mod test_entry {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_id() {
        assert_eq!(entry_id("loc1", "parcels", 3), "loc1_parcels_3");
    }

    #[test]
    fn test_serialize_point_entry() {
        let job: Job = serde_json::from_str(r#"{"location": {"id": "loc1"}}"#).unwrap();
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!("foo"));
        let geo = Geo {
            shape: GeoShape::Point {
                lon: Some(10.0),
                lat: Some(20.0),
            },
            code: Some(4326),
        };
        let entry = Entry::new(&job, "parcels", 0, fields, Some(geo));
        let value: Value = serde_json::from_slice(&entry.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "loc1_parcels_0",
                "location": "loc1",
                "action": "ADD",
                "entry": {
                    "fields": {"name": "foo"},
                    "geo": {"lon": 10.0, "lat": 20.0, "code": 4326}
                }
            })
        );
    }

    #[test]
    fn test_serialize_without_geo() {
        let job: Job = serde_json::from_str(r#"{"location": {"id": "loc1"}}"#).unwrap();
        let entry = Entry::new(&job, "t", 1, Map::new(), None);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["entry"], json!({"fields": {}}));
    }
}
