pub mod zmq_sink;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::entry::Entry;

/// 索引文档的接收端
#[async_trait]
pub trait EntrySink: Send {
    /// 发送后不等待确认，失败直接返回错误
    async fn send(&mut self, entry: &Entry) -> Result<()>;

    async fn close(&mut self);
}
