//! OSC 送信（UDP）

use super::codec::{encode_message, OscArg};
use super::CHATBOX_INPUT_ADDR;
use common::error::Error;
use std::net::UdpSocket;

/// VRChat へ OSC を送る UDP ソケット
pub struct OscSender {
    socket: UdpSocket,
    target: String,
}

impl OscSender {
    /// 送信用ソケットを作成する（エフェメラルポートにバインド）
    pub fn new(host: &str, port: u16) -> Result<Self, Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|e| Error::io_msg(format!("bind send socket: {}", e)))?;
        Ok(Self {
            socket,
            target: format!("{}:{}", host, port),
        })
    }

    /// 任意のアドレスへメッセージを送る
    pub fn send(&self, addr: &str, args: &[OscArg]) -> Result<(), Error> {
        let buf = encode_message(addr, args)?;
        self.socket
            .send_to(&buf, &self.target)
            .map_err(|e| Error::io_msg(format!("send OSC to {}: {}", self.target, e)))?;
        Ok(())
    }

    /// チャットボックスへテキストを送る（即時送信 + 通知音、VRChat の仕様どおり 3 引数）
    pub fn send_chatbox(&self, text: &str) -> Result<(), Error> {
        self.send(
            CHATBOX_INPUT_ADDR,
            &[
                OscArg::Str(text.to_string()),
                OscArg::Bool(true),
                OscArg::Bool(true),
            ],
        )
    }
}
