use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use locindex::{
    args::{ArgsConfig, WorkerKind},
    handle::{run_sql_job, run_synthetic_job},
    model::job::Job,
    util::logging::init_tracing,
};

// 每个进程只处理一个 location
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    // 处理命令行参数
    let args = ArgsConfig::parse();
    info!(?args, "starting worker");

    // 读取任务配置文件
    let job = match Job::from_file(&args.job_config_path) {
        Ok(job) => job,
        Err(e) => {
            error!(error = %e, "failed to load job config");
            return ExitCode::FAILURE;
        }
    };
    info!(location = job.location_id(), "job loaded");

    let result = match args.worker {
        WorkerKind::Sql => run_sql_job(&job).await.map(|stats| stats.entries),
        WorkerKind::Synthetic => run_synthetic_job(&job, args.items).await,
    };
    match result {
        Ok(sent) => {
            info!(location = job.location_id(), sent, "worker finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(location = job.location_id(), error = %e, "worker failed");
            ExitCode::FAILURE
        }
    }
}
