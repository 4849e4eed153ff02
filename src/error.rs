use thiserror::Error;

// worker 错误类型
// 任意一个错误都会终止当前 worker
#[derive(Debug, Error)]
pub enum WorkerError {
    /// 任务配置缺失或无效 (加载或连接时)
    #[error("job config error: {0}")]
    Config(String),

    /// include/exclude 过滤后表中没有可查询的列
    #[error("no columns to select: {0}")]
    NoColumns(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("transport error: {0}")]
    Transport(#[from] zeromq::ZmqError),

    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
