use log::{debug, info, warn};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};

pub struct Client {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
    reader: Option<BufReader<TcpStream>>,
}

impl Client {
    pub fn new(host: String, port: u16) -> Self {
        Client {
            host,
            port,
            stream: None,
            reader: None,
        }
    }

    // 连接到服务器
    pub fn connect(&mut self) -> Result<(), String> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("尝试连接到服务器: {}", addr);

        let stream = TcpStream::connect(&addr)
            .map_err(|e| format!("无法连接到服务器 {}: {}", addr, e))?;
        let read_half = stream
            .try_clone()
            .map_err(|e| format!("克隆流失败: {}", e))?;

        info!("已连接到服务器: {}", addr);
        self.reader = Some(BufReader::new(read_half));
        self.stream = Some(stream);
        Ok(())
    }

    /// 发送一行命令，返回服务器的完整回复（多行以 `\n` 连接，不含结束空行）
    pub fn send_command(&mut self, command: &str) -> Result<String, String> {
        let (Some(stream), Some(reader)) = (self.stream.as_mut(), self.reader.as_mut()) else {
            return Err("未连接到服务器".to_string());
        };

        stream
            .write_all(format!("{}\n", command).as_bytes())
            .and_then(|_| stream.flush())
            .map_err(|e| format!("发送命令失败: {}", e))?;
        debug!("已发送命令: {}", command);

        let mut lines = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| format!("接收响应失败: {}", e))?;
            if n == 0 {
                return Err("服务器断开连接".to_string());
            }
            let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
            if line.is_empty() {
                return Ok(lines.join("\n"));
            }
            lines.push(line.to_string());
        }
    }

    /// 交互式命令行：每行输入发送给服务器并打印回复，输入 `exit` 或输入结束时退出
    pub fn run_interactive<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), String> {
        let prompt = format!("{}:{}> ", self.host, self.port);
        let mut buffer = String::new();

        loop {
            write!(output, "{}", prompt)
                .and_then(|_| output.flush())
                .map_err(|e| format!("刷新标准输出失败: {}", e))?;

            buffer.clear();
            let n = input
                .read_line(&mut buffer)
                .map_err(|e| format!("读取输入失败: {}", e))?;
            if n == 0 {
                break;
            }

            let command = buffer.trim_end_matches(|c: char| c == '\n' || c == '\r');
            if command == "exit" {
                writeln!(output, "断开连接并退出...").map_err(|e| e.to_string())?;
                break;
            }

            match self.send_command(command) {
                Ok(response) => {
                    if !response.is_empty() {
                        writeln!(output, "{}", response).map_err(|e| e.to_string())?;
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    self.disconnect();
                    return Err(e);
                }
            }
        }

        self.disconnect();
        Ok(())
    }

    // 关闭连接
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            info!("已断开与服务器的连接");
        }
        self.reader = None;
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// 使用标准输入输出运行交互式命令行
pub fn run_stdio(client: &mut Client) -> Result<(), String> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    client.run_interactive(stdin.lock(), stdout.lock())
}
