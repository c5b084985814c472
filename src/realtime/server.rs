use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::ClientEvent;
use super::hub::ProjectHub;
use crate::error::{Result, TaskboardError};

/// WebSocket 房间服务器。
///
/// ```rust,no_run
/// use taskboard::realtime::{ProjectHub, RealtimeServer};
///
/// # async fn example() -> taskboard::error::Result<()> {
/// let server = RealtimeServer::bind("127.0.0.1:3001", ProjectHub::new()).await?;
/// // 客户端连接 ws://127.0.0.1:3001
/// server.wait().await
/// # }
/// ```
pub struct RealtimeServer {
    local_addr: SocketAddr,
    hub: ProjectHub,
    accept_loop: JoinHandle<()>,
}

impl RealtimeServer {
    /// 绑定地址并在后台开始接受连接；端口 0 表示由系统分配
    pub async fn bind(addr: impl ToSocketAddrs, hub: ProjectHub) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        let hub_bg = hub.clone();
        let accept_loop = tokio::spawn(async move {
            info!("WebSocket 房间服务器已启动: ws://{local_addr}");
            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        debug!("新的 WebSocket 客户端连接: {peer}");
                        tokio::spawn(handle_connection(stream, peer, hub_bg.clone()));
                    }
                    Err(e) => {
                        error!("WebSocket accept 错误: {e}");
                    }
                }
            }
        });

        Ok(Self {
            local_addr,
            hub,
            accept_loop,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn hub(&self) -> &ProjectHub {
        &self.hub
    }

    /// 停止接受新连接；已建立的连接不受影响
    pub fn shutdown(&self) {
        self.accept_loop.abort();
    }

    /// 阻塞直到接受循环结束
    pub async fn wait(self) -> Result<()> {
        match self.accept_loop.await {
            Ok(()) => Ok(()),
            Err(e) if e.is_cancelled() => Ok(()),
            Err(e) => Err(TaskboardError::Other(format!("WebSocket 服务器异常退出: {e}"))),
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, hub: ProjectHub) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket 握手失败 ({peer}): {e}");
            return;
        }
    };

    let conn = Uuid::new_v4();
    let (mut write, mut read) = ws_stream.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = write.send(Message::Text(msg)).await {
                warn!("WS 消息发送失败: {e}");
                break;
            }
        }
    });

    while let Some(msg_result) = read.next().await {
        match msg_result {
            Ok(Message::Text(text)) => match ClientEvent::parse(&text) {
                Ok(event) => dispatch(&hub, conn, &tx, event).await,
                Err(e) => {
                    warn!("WebSocket 消息解析失败: {e}，原始内容: {text}");
                }
            },
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    hub.leave_all(conn).await;
    write_task.abort();
    info!("WebSocket 客户端断开: {peer}");
}

async fn dispatch(
    hub: &ProjectHub,
    conn: Uuid,
    tx: &tokio::sync::mpsc::UnboundedSender<String>,
    event: ClientEvent,
) {
    let Some(project_id) = event.project_id() else {
        warn!(?event, "事件缺少项目 ID，已忽略");
        return;
    };
    match event {
        ClientEvent::JoinProject(_) => hub.join(&project_id, conn, tx.clone()).await,
        ClientEvent::LeaveProject(_) => hub.leave(&project_id, conn).await,
        ClientEvent::TaskUpdate(data) => {
            if let Err(e) = hub.publish(&project_id, data).await {
                warn!("task-update 广播失败: {e}");
            }
        }
    }
}
