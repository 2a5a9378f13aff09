use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::TcpStream;

/// 一行命令的最大字节数（含换行）
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// 一个客户端连接上的行协议
///
/// 每行一条命令；每个回复之后跟一个空行，客户端据此判断回复结束。
pub struct Connection {
    peer: String,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let writer = BufWriter::new(stream.try_clone()?);
        Ok(Connection {
            peer,
            reader: BufReader::new(stream),
            writer,
        })
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// 读取下一行命令，对端关闭连接时返回 None
    ///
    /// 关闭前没有以换行结尾的半行不会被执行；超过 `MAX_LINE_LEN` 的行返回错误。
    pub fn receive(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let limit = MAX_LINE_LEN as u64;
        if (&mut self.reader).take(limit).read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        if !buf.ends_with(b"\n") {
            if buf.len() >= MAX_LINE_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("命令行超过 {} 字节", MAX_LINE_LEN),
                ));
            }
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(
            line.trim_end_matches(|c: char| c == '\n' || c == '\r')
                .to_string(),
        ))
    }

    /// 写出回复和结束空行
    pub fn send(&mut self, response: &str) -> io::Result<()> {
        self.writer.write_all(response.as_bytes())?;
        self.writer.write_all(b"\n\n")?;
        self.writer.flush()
    }
}
