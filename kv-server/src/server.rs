use crate::connection::Connection;
use kv_common::command::CommandHandler;
use kv_common::store::StoreManager;
use log::{debug, error, info};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// 没有新连接时两次检查之间的等待
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct Server {
    host: String,
    port: u16,
    data_file: String,
    sync_on_append: bool,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    pub fn new(host: String, port: u16, data_file: String) -> Self {
        Server {
            host,
            port,
            data_file,
            sync_on_append: true,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 设置持久化日志每次追加后是否 fsync
    pub fn with_sync(mut self, sync_on_append: bool) -> Self {
        self.sync_on_append = sync_on_append;
        self
    }

    /// 置为 true 后接受循环在下一次检查时退出
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    // 启动服务器
    pub fn start(&mut self) -> Result<(), String> {
        let handler = self.open_handler()?;
        let listener = self.bind()?;

        // 捕获 Ctrl+C 信号
        let shutdown = self.shutdown_handle();
        ctrlc::set_handler(move || {
            info!("接收到终止信号，正在关闭服务器...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| format!("无法设置信号处理程序: {}", e))?;

        self.serve(listener, handler)
    }

    /// 回放持久化日志，得到挂好日志的命令处理器
    pub fn open_handler(&self) -> Result<CommandHandler, String> {
        info!("从持久化日志 {} 恢复数据...", self.data_file);
        let store_manager = StoreManager::open(Path::new(&self.data_file), self.sync_on_append)
            .map_err(|e| format!("加载持久化日志失败: {}", e))?;
        let stats = store_manager.recovery_stats();
        info!("回放 {} 条记录, 跳过 {} 行", stats.applied, stats.skipped);
        Ok(CommandHandler::new(store_manager))
    }

    pub fn bind(&self) -> Result<TcpListener, String> {
        let addr = format!("{}:{}", self.host, self.port);
        TcpListener::bind(&addr).map_err(|e| format!("无法绑定到地址 {}: {}", addr, e))
    }

    /// 接受连接直到收到关闭信号，每个连接一个线程
    pub fn serve(&self, listener: TcpListener, handler: CommandHandler) -> Result<(), String> {
        listener
            .set_nonblocking(true)
            .map_err(|e| format!("设置非阻塞模式失败: {}", e))?;

        match listener.local_addr() {
            Ok(addr) => info!("服务器在 {} 上启动", addr),
            Err(_) => info!("服务器已启动"),
        }

        while !self.shutdown.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    info!("新连接: {}", addr);
                    let handler = handler.clone();
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_client(stream, addr, handler) {
                            error!("处理客户端 {} 时出错: {}", addr, e);
                        }
                    });
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    error!("接受连接时出错: {}", e);
                }
            }
        }

        info!("服务器已关闭");
        Ok(())
    }

    // 处理单个客户端连接：一条命令完整执行（包括写日志）之后才发送回复
    fn handle_client(
        stream: TcpStream,
        addr: SocketAddr,
        handler: CommandHandler,
    ) -> io::Result<()> {
        // 监听套接字是非阻塞的，有些平台上接受的连接会继承这一设置
        stream.set_nonblocking(false)?;
        let mut connection = Connection::new(stream)?;

        while let Some(line) = connection.receive()? {
            debug!("从 {} 接收到命令: {}", connection.peer(), line);
            let response = handler.execute(&line);
            connection.send(&response)?;
        }

        info!("客户端 {} 断开连接", addr);
        Ok(())
    }
}
