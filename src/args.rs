// 处理命令行参数

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::handle::synthetic_worker::DEFAULT_TOTAL_ITEMS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkerKind {
    /// 读取数据库表并推送每一行
    Sql,
    /// 推送生成的测试数据
    Synthetic,
}

#[derive(Debug, Parser)]
#[command(name = "locindex", about = "Index a location's database rows into the search indexer")]
pub struct ArgsConfig {
    /// 任务配置文件 (.json 或 .toml)
    pub job_config_path: PathBuf,

    #[arg(long, value_enum, default_value_t = WorkerKind::Sql)]
    pub worker: WorkerKind,

    /// synthetic worker 生成的条数
    #[arg(long, default_value_t = DEFAULT_TOTAL_ITEMS)]
    pub items: usize,
}

#[cfg(test)]
mod test_args {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ArgsConfig::try_parse_from(["locindex", "job.json"]).unwrap();
        assert_eq!(args.job_config_path, PathBuf::from("job.json"));
        assert_eq!(args.worker, WorkerKind::Sql);
        assert_eq!(args.items, DEFAULT_TOTAL_ITEMS);
    }

    #[test]
    fn test_synthetic_worker() {
        let args = ArgsConfig::try_parse_from([
            "locindex",
            "job.toml",
            "--worker",
            "synthetic",
            "--items",
            "10",
        ])
        .unwrap();
        assert_eq!(args.worker, WorkerKind::Synthetic);
        assert_eq!(args.items, 10);
    }

    #[test]
    fn test_missing_job_path() {
        assert!(ArgsConfig::try_parse_from(["locindex"]).is_err());
    }
}
