// 冒烟测试用 worker，不读数据库，直接生成 entry 推送

use serde_json::{Map, json};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::model::entry::{Entry, EntryBody};
use crate::model::job::Job;
use crate::sink::EntrySink;

pub const DEFAULT_TOTAL_ITEMS: usize = 1000;

// 每隔多少条打印一次进度
const PROGRESS_EVERY: usize = 100;

pub struct SyntheticWorker<'a> {
    job: &'a Job,
    total_items: usize,
}

impl<'a> SyntheticWorker<'a> {
    pub fn new(job: &'a Job, total_items: usize) -> Self {
        SyntheticWorker { job, total_items }
    }

    // 生成 item 1 .. total_items-1
    pub async fn run<K>(&self, sink: &mut K) -> Result<usize>
    where
        K: EntrySink + ?Sized,
    {
        let mut sent = 0;
        for x in 1..self.total_items {
            let entry = self.build_item(x);
            sink.send(&entry).await?;
            sent += 1;

            let percent = x as f64 / self.total_items as f64 * 100.0;
            if x % PROGRESS_EVERY == 0 {
                info!(worker = "synthetic", "{:.2}%", percent);
            } else {
                debug!(worker = "synthetic", "{:.2}%", percent);
            }
        }
        Ok(sent)
    }

    fn build_item(&self, x: usize) -> Entry {
        // 每个 item 需要 id 或 path
        let id = Uuid::new_v4().simple().to_string();
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("title".to_string(), json!(format!("item {}", x)));
        fields.insert("fss_foo".to_string(), json!(["foo1", "foo2"]));
        Entry {
            id,
            location: self.job.location_id().to_string(),
            action: self.job.action_type().to_string(),
            entry: EntryBody { fields, geo: None },
        }
    }
}
