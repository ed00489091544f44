//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A stats page whose body (and status) can be changed while it is running.
#[derive(Clone)]
pub struct MockStats {
    pub addr: SocketAddr,
    response: Arc<Mutex<(u16, String)>>,
}

impl MockStats {
    pub fn set_body(&self, body: &str) {
        *self.response.lock().unwrap() = (200, body.to_string());
    }

    #[allow(dead_code)]
    pub fn set_status(&self, status: u16) {
        self.response.lock().unwrap().0 = status;
    }
}

/// Start a minimal HTTP server answering every request with the current body.
pub async fn start_mock_stats(body: &str) -> MockStats {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = Arc::new(Mutex::new((200u16, body.to_string())));
    let shared = response.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let (status, body) = shared.lock().unwrap().clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        let _ = socket.read(&mut buf).await;
                        let status_text = match status {
                            200 => "200 OK",
                            503 => "503 Service Unavailable",
                            _ => "500 Internal Server Error",
                        };
                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockStats { addr, response }
}

/// Start a line-protocol admin socket that records commands and replies with `reply`.
#[allow(dead_code)]
pub async fn start_mock_admin(reply: &'static str) -> (SocketAddr, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let commands = Arc::new(Mutex::new(Vec::new()));
    let recorded = commands.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 1024];
                        if let Ok(n) = socket.read(&mut buf).await {
                            recorded
                                .lock()
                                .unwrap()
                                .push(String::from_utf8_lossy(&buf[..n]).trim().to_string());
                        }
                        let _ = socket.write_all(reply.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, commands)
}

/// Speak the agent-check protocol once. Returns the raw reply, empty if none was sent.
pub async fn query(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut reply = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut reply))
        .await
        .expect("agent kept the connection open")
        .unwrap();
    reply
}

/// Poll `check` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn eventually<F: FnMut() -> bool>(mut check: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

pub const STATS_CSV: &str = "\
# pxname,svname,qcur,qmax,scur,smax,slim,stot,bin,bout,dreq,dresp,ereq,econ,eresp,wretr,wredis,status,weight,act,bck,chkfail,chkdown,lastchg,downtime,
http-in,FRONTEND,,,0,1,3000,5,0,0,0,0,0,,,,,OPEN,,,,,,,,
web,A,0,0,0,1,,2,0,0,,0,,0,0,0,0,UP,1,1,0,0,0,4000,0,
web,B,0,0,0,1,,2,0,0,,0,,0,1,2,0,UP,1,1,0,3,0,4000,0,
web,BACKEND,0,0,0,1,300,4,0,0,0,0,,0,1,2,0,UP,2,2,0,,0,4000,0,
api,api1,0,0,0,0,,0,0,0,,0,,0,0,0,0,DOWN,1,1,0,9,1,30,30,
";
