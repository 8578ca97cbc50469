//! OSC 受信（UDP リスナースレッド）
//!
//! 受信スレッドは running フラグが降りるまでデータグラムを読み続け、
//! 購読パターンに一致したメッセージだけをチャネルへ流す。
//! デコード失敗は通知して読み飛ばす（致命的なのはバインド失敗のみ）。

use super::address::match_address;
use super::codec::{decode_packet, OscMessage};
use common::error::Error;
use common::notice_hub::NoticeHubHandle;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_millis(500);
const RECV_BUF_SIZE: usize = 8192;

/// UDP で OSC を受信するリスナー
pub struct OscListener {
    socket: UdpSocket,
    pattern: String,
}

impl OscListener {
    /// listen ソケットをバインドする。失敗は呼び出し側で致命扱いにする。
    pub fn bind(host: &str, port: u16, pattern: &str) -> Result<Self, Error> {
        let socket = UdpSocket::bind((host, port))
            .map_err(|e| Error::io_msg(format!("bind OSC listener {}:{}: {}", host, port, e)))?;
        socket
            .set_read_timeout(Some(RECV_TIMEOUT))
            .map_err(|e| Error::io_msg(format!("set read timeout: {}", e)))?;
        Ok(Self {
            socket,
            pattern: pattern.to_string(),
        })
    }

    /// 受信スレッドを起動する
    pub fn spawn(
        self,
        tx: mpsc::Sender<OscMessage>,
        notices: NoticeHubHandle,
        running: Arc<AtomicBool>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let mut buf = [0u8; RECV_BUF_SIZE];
            while running.load(Ordering::Relaxed) {
                let n = match self.socket.recv_from(&mut buf) {
                    Ok((n, _)) => n,
                    Err(e)
                        if e.kind() == std::io::ErrorKind::WouldBlock
                            || e.kind() == std::io::ErrorKind::TimedOut =>
                    {
                        continue;
                    }
                    Err(e) => {
                        notices.emit("error", format!("OSC RECV ERROR -> {}", e));
                        continue;
                    }
                };
                let msgs = match decode_packet(&buf[..n]) {
                    Ok(msgs) => msgs,
                    Err(e) => {
                        notices.emit("error", format!("OSC DECODE ERROR -> {}", e));
                        continue;
                    }
                };
                for msg in msgs {
                    if !match_address(&self.pattern, &msg.addr) {
                        continue;
                    }
                    if tx.send(msg).is_err() {
                        // 受信側が終了している
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::codec::{encode_message, OscArg};
    use common::adapter::StdClock;
    use common::notice_hub::{NoticeHub, NoticeHubHandle};

    fn quiet_notices() -> NoticeHubHandle {
        NoticeHubHandle::new(NoticeHub::new(Arc::new(StdClock), vec![]))
    }

    #[test]
    fn test_listener_receives_matching_messages() {
        let listener = OscListener::bind("127.0.0.1", 0, "/*").unwrap();
        let port = listener.socket.local_addr().unwrap().port();

        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel();
        let handle = listener.spawn(tx, quiet_notices(), Arc::clone(&running));

        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        let buf = encode_message("/chatbox/input", &[OscArg::Str("hi".to_string())]).unwrap();
        sock.send_to(&buf, ("127.0.0.1", port)).unwrap();

        let msg = rx.recv_timeout(Duration::from_secs(3)).unwrap();
        assert_eq!(msg.addr, "/chatbox/input");

        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();
    }

    #[test]
    fn test_listener_filters_by_pattern() {
        let listener = OscListener::bind("127.0.0.1", 0, "/chatbox/*").unwrap();
        let port = listener.socket.local_addr().unwrap().port();

        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel();
        let handle = listener.spawn(tx, quiet_notices(), Arc::clone(&running));

        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        let skip = encode_message("/avatar/parameters/x", &[OscArg::Int(1)]).unwrap();
        let keep = encode_message("/chatbox/typing", &[OscArg::Bool(true)]).unwrap();
        sock.send_to(&skip, ("127.0.0.1", port)).unwrap();
        sock.send_to(&keep, ("127.0.0.1", port)).unwrap();

        let msg = rx.recv_timeout(Duration::from_secs(3)).unwrap();
        assert_eq!(msg.addr, "/chatbox/typing");

        running.store(false, Ordering::Relaxed);
        handle.join().unwrap();
    }

    #[test]
    fn test_bind_in_use_is_error() {
        let first = OscListener::bind("127.0.0.1", 0, "/*").unwrap();
        let port = first.socket.local_addr().unwrap().port();
        assert!(OscListener::bind("127.0.0.1", port, "/*").is_err());
    }
}
