pub mod filter;
pub mod sql_worker;
pub mod synthetic_worker;

use tracing::info;

use crate::db::RowSource;
use crate::db::mysql_db::MysqlSource;
use crate::error::Result;
use crate::model::job::Job;
use crate::sink::EntrySink;
use crate::sink::zmq_sink::ZmqSink;
use sql_worker::{SqlWorker, WorkerStats};
use synthetic_worker::SyntheticWorker;

// 运行 sql worker，无论成功失败都关闭数据源和 sink
pub async fn run_with<S, K>(job: &Job, source: &mut S, sink: &mut K) -> Result<WorkerStats>
where
    S: RowSource + ?Sized,
    K: EntrySink + ?Sized,
{
    let result = SqlWorker::new(job).run(source, sink).await;
    source.close().await;
    sink.close().await;
    result
}

// 先连接索引服务，再连接数据库
pub async fn run_sql_job(job: &Job) -> Result<WorkerStats> {
    let mut sink = ZmqSink::from_job(job).await?;
    let mut source = match MysqlSource::connect(job).await {
        Ok(source) => source,
        Err(e) => {
            sink.close().await;
            return Err(e);
        }
    };
    let stats = run_with(job, &mut source, &mut sink).await?;
    info!(
        location = job.location_id(),
        tables = stats.tables,
        entries = stats.entries,
        "sql job finished"
    );
    Ok(stats)
}

pub async fn run_synthetic_job(job: &Job, total_items: usize) -> Result<usize> {
    let mut sink = ZmqSink::from_job(job).await?;
    let result = SyntheticWorker::new(job, total_items).run(&mut sink).await;
    sink.close().await;
    result
}
