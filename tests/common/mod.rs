//! 测试用的本地 HTTP 桩服务
//!
//! 绑定 127.0.0.1 随机端口，按固定状态行/响应体应答，
//! 并把收到的请求（请求行 + 正文）捕获到通道供断言。

// 各测试二进制只用到部分辅助方法
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub body: String,
}

pub struct StubServer {
    pub base_url: String,
    requests: mpsc::Receiver<CapturedRequest>,
}

impl StubServer {
    /// 取出下一条捕获的请求，1 秒内无请求则 panic
    pub fn next_request(&self) -> CapturedRequest {
        self.requests
            .recv_timeout(Duration::from_secs(1))
            .expect("expected a captured request")
    }

    /// 断言桩服务从未收到请求
    pub fn assert_no_requests(&self) {
        assert!(
            self.requests
                .recv_timeout(Duration::from_millis(200))
                .is_err(),
            "stub server received an unexpected request"
        );
    }
}

/// 启动桩服务，对所有请求返回同一份响应
pub fn spawn_stub(status_line: &'static str, response_body: &'static str) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind stub server");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let _ = handle_connection(stream, status_line, response_body, tx.clone());
        }
    });

    StubServer {
        base_url: format!("http://{}", addr),
        requests: rx,
    }
}

fn handle_connection(
    mut stream: TcpStream,
    status_line: &str,
    response_body: &str,
    tx: mpsc::Sender<CapturedRequest>,
) -> std::io::Result<()> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;

    // 读到头部结束符为止
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !contains_header_end(&buf) {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let header_end = find_header_end(&buf).unwrap_or(buf.len());
    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let request_line = head.lines().next().unwrap_or("").to_string();

    // 按 Content-Length 补读正文
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    let mut body_bytes = buf[header_end.min(buf.len())..].to_vec();
    while body_bytes.len() < content_length {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        body_bytes.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&body_bytes[..content_length.min(body_bytes.len())])
        .to_string();

    let _ = tx.send(CapturedRequest { request_line, body });

    let response = format!(
        "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        response_body.len(),
        response_body
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

fn contains_header_end(buf: &[u8]) -> bool {
    find_header_end(buf).is_some()
}

/// 返回正文起始偏移（头部结束符之后）
fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}
