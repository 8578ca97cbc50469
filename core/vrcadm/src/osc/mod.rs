//! OSC (Open Sound Control) の送受信
//!
//! VRChat が話すのは UDP 上の OSC 1.0 メッセージ。本ツールが使う型タグは
//! s / i / f / T / F のみで、それ以外は受信時に読み飛ばす。

pub mod address;
pub mod codec;
pub mod listener;
pub mod sender;

pub use address::match_address;
pub use codec::{decode_packet, encode_message, format_args, OscArg, OscMessage};
pub use listener::OscListener;
pub use sender::OscSender;

/// VRChat チャットボックスの入力アドレス
pub const CHATBOX_INPUT_ADDR: &str = "/chatbox/input";
