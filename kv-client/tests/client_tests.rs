use kv_client::client::Client;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

// 模拟服务器：对每行命令按给定函数回复，回复后追加结束空行
fn mock_server<F>(respond: F) -> (SocketAddr, JoinHandle<Vec<String>>)
where
    F: Fn(&str) -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        serve_one(stream, respond)
    });

    (addr, handle)
}

fn serve_one<F: Fn(&str) -> String>(stream: TcpStream, respond: F) -> Vec<String> {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);
    let mut received = Vec::new();
    let mut line = String::new();
    while reader.read_line(&mut line).unwrap() > 0 {
        let command = line.trim_end_matches('\n').to_string();
        writer
            .write_all(format!("{}\n\n", respond(&command)).as_bytes())
            .unwrap();
        received.push(command);
        line.clear();
    }
    received
}

fn echo(command: &str) -> String {
    match command {
        "ping" => "pong".to_string(),
        "help" => "Available commands:\nset [key] [value]\nget [key]".to_string(),
        other => format!("echo {}", other),
    }
}

#[test]
fn test_send_command_single_line() {
    let (addr, server) = mock_server(echo);
    let mut client = Client::new(addr.ip().to_string(), addr.port());
    client.connect().unwrap();

    assert_eq!(client.send_command("ping").unwrap(), "pong");
    assert_eq!(client.send_command("get a").unwrap(), "echo get a");

    client.disconnect();
    assert!(client.send_command("ping").is_err());
    assert_eq!(server.join().unwrap(), vec!["ping", "get a"]);
}

#[test]
fn test_send_command_multi_line() {
    let (addr, server) = mock_server(echo);
    let mut client = Client::new(addr.ip().to_string(), addr.port());
    client.connect().unwrap();

    let help = client.send_command("help").unwrap();
    assert_eq!(help, "Available commands:\nset [key] [value]\nget [key]");
    // 多行回复读完后下一条命令的回复不会错位
    assert_eq!(client.send_command("ping").unwrap(), "pong");

    drop(client);
    server.join().unwrap();
}

#[test]
fn test_send_without_connection() {
    let mut client = Client::new("127.0.0.1".to_string(), 1);
    assert!(client.send_command("ping").is_err());
}

#[test]
fn test_connect_refused() {
    // 绑定后立即释放，得到一个没有监听者的端口
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = Client::new("127.0.0.1".to_string(), port);
    assert!(client.connect().is_err());
}

#[test]
fn test_server_disconnect_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        // 不回复直接关闭
    });

    let mut client = Client::new(addr.ip().to_string(), addr.port());
    client.connect().unwrap();
    server.join().unwrap();
    assert!(client.send_command("ping").is_err());
}

#[test]
fn test_interactive_session() {
    let (addr, server) = mock_server(echo);
    let mut client = Client::new(addr.ip().to_string(), addr.port());
    client.connect().unwrap();

    let input = Cursor::new("ping\nhelp\nexit\nnever sent\n");
    let mut output = Vec::new();
    client.run_interactive(input, &mut output).unwrap();
    assert!(client.send_command("ping").is_err());

    let output = String::from_utf8(output).unwrap();
    let prompt = format!("{}:{}> ", addr.ip(), addr.port());
    assert!(output.starts_with(&prompt));
    assert!(output.contains("pong\n"));
    assert!(output.contains("Available commands:\nset [key] [value]\nget [key]\n"));
    assert_eq!(output.matches(&prompt).count(), 3);

    assert_eq!(server.join().unwrap(), vec!["ping", "help"]);
}

#[test]
fn test_interactive_ends_at_eof() {
    let (addr, server) = mock_server(echo);
    let mut client = Client::new(addr.ip().to_string(), addr.port());
    client.connect().unwrap();

    let mut output = Vec::new();
    client
        .run_interactive(Cursor::new("set a 1"), &mut output)
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("echo set a 1\n"));
    assert_eq!(server.join().unwrap(), vec!["set a 1"]);
}
