use async_trait::async_trait;
use tracing::{debug, info, warn};
use zeromq::{PushSocket, Socket, SocketSend};

use crate::error::{Result, WorkerError};
use crate::model::entry::Entry;
use crate::model::job::Job;
use crate::sink::EntrySink;

// PUSH socket，连接到索引服务的 PULL 端
pub struct ZmqSink {
    socket: Option<PushSocket>,
    endpoint: String,
    sent: usize,
}

impl ZmqSink {
    pub async fn connect(endpoint: &str) -> Result<Self> {
        let mut socket = PushSocket::new();
        info!(endpoint, "connecting PUSH socket");
        socket.connect(endpoint).await?;
        Ok(ZmqSink {
            socket: Some(socket),
            endpoint: endpoint.to_string(),
            sent: 0,
        })
    }

    // 使用任务配置中的 connection.indexer
    pub async fn from_job(job: &Job) -> Result<Self> {
        let endpoint = job
            .indexer()
            .ok_or_else(|| WorkerError::Config("missing connection.indexer".into()))?;
        Self::connect(endpoint).await
    }

    pub fn sent(&self) -> usize {
        self.sent
    }
}

#[async_trait]
impl EntrySink for ZmqSink {
    async fn send(&mut self, entry: &Entry) -> Result<()> {
        let socket = self
            .socket
            .as_mut()
            .ok_or_else(|| WorkerError::Config(format!("sink {} already closed", self.endpoint)))?;
        let bytes = entry.to_json()?;
        socket.send(bytes.into()).await?;
        self.sent += 1;
        debug!(id = %entry.id, "entry sent");
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            let errors = socket.close().await;
            for e in errors {
                warn!(endpoint = %self.endpoint, error = %e, "error closing PUSH socket");
            }
            info!(endpoint = %self.endpoint, sent = self.sent, "PUSH socket closed");
        }
    }
}

#[cfg(test)]
mod test_zmq_sink {
    use serde_json::{Map, Value, json};
    use zeromq::{PullSocket, SocketRecv};

    use super::*;

    #[tokio::test]
    async fn test_push_entry_to_pull_socket() {
        // 端口 0 由系统分配，连接 bind 返回的实际地址
        let mut pull = PullSocket::new();
        let endpoint = pull.bind("tcp://127.0.0.1:0").await.unwrap().to_string();

        let job: Job = serde_json::from_str(r#"{"location": {"id": "loc1"}}"#).unwrap();
        let mut fields = Map::new();
        fields.insert("name".into(), json!("foo"));
        let entry = Entry::new(&job, "parcels", 0, fields, None);

        let mut sink = ZmqSink::connect(&endpoint).await.unwrap();
        sink.send(&entry).await.unwrap();

        let msg = pull.recv().await.unwrap();
        let bytes = msg.get(0).unwrap();
        let value: Value = serde_json::from_slice(bytes.as_ref()).unwrap();
        assert_eq!(value["id"], "loc1_parcels_0");
        assert_eq!(value["entry"]["fields"]["name"], "foo");
        assert_eq!(sink.sent(), 1);

        sink.close().await;
        assert!(sink.send(&entry).await.is_err());
    }
}
