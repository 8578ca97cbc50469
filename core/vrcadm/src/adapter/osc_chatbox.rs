//! OSC 送信による ChatboxSink 実装

use crate::osc::OscSender;
use crate::ports::outbound::ChatboxSink;
use common::error::Error;

/// OscSender を ChatboxSink として公開する
pub struct OscChatbox {
    sender: OscSender,
}

impl OscChatbox {
    pub fn new(sender: OscSender) -> Self {
        Self { sender }
    }
}

impl ChatboxSink for OscChatbox {
    fn send_chatbox(&self, text: &str) -> Result<(), Error> {
        self.sender.send_chatbox(text)
    }
}
