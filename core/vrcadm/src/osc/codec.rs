//! OSC 1.0 メッセージ・バンドルのコーデック
//!
//! 文字列は NUL 終端 + 4 バイト境界パディング、数値はビッグエンディアン。
//! バンドル（#bundle）は timetag の後にサイズ付き要素が並び、再帰的に展開する。

use common::error::Error;

/// OSC 引数（本ツールが使う型タグのみ）
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    /// 型タグ s
    Str(String),
    /// 型タグ i（i32 ビッグエンディアン）
    Int(i32),
    /// 型タグ f（f32 ビッグエンディアン）
    Float(f32),
    /// 型タグ T / F（ペイロードなし）
    Bool(bool),
}

impl OscArg {
    fn type_tag(&self) -> u8 {
        match self {
            Self::Str(_) => b's',
            Self::Int(_) => b'i',
            Self::Float(_) => b'f',
            Self::Bool(true) => b'T',
            Self::Bool(false) => b'F',
        }
    }
}

impl std::fmt::Display for OscArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{}", s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// OSC メッセージ 1 件
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub addr: String,
    pub args: Vec<OscArg>,
}

/// 引数列を通知用に整形する（空なら "-"）
pub fn format_args(args: &[OscArg]) -> String {
    if args.is_empty() {
        return "-".to_string();
    }
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

fn push_osc_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    // NUL 終端は必須。その上で 4 バイト境界まで埋める
    let padded = pad4(s.len() + 1);
    buf.resize(buf.len() + (padded - s.len()), 0);
}

/// OSC メッセージを 1 データグラムにエンコードする
pub fn encode_message(addr: &str, args: &[OscArg]) -> Result<Vec<u8>, Error> {
    if !addr.starts_with('/') {
        return Err(Error::invalid_argument(format!(
            "OSC address must start with '/': {}",
            addr
        )));
    }
    let mut buf = Vec::with_capacity(64);
    push_osc_string(&mut buf, addr);

    let mut tags = String::with_capacity(args.len() + 1);
    tags.push(',');
    for arg in args {
        tags.push(arg.type_tag() as char);
    }
    push_osc_string(&mut buf, &tags);

    for arg in args {
        match arg {
            OscArg::Str(s) => push_osc_string(&mut buf, s),
            OscArg::Int(i) => buf.extend_from_slice(&i.to_be_bytes()),
            OscArg::Float(f) => buf.extend_from_slice(&f.to_be_bytes()),
            OscArg::Bool(_) => {}
        }
    }
    Ok(buf)
}

fn read_osc_string(buf: &[u8], pos: &mut usize) -> Result<String, Error> {
    let start = *pos;
    let nul = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::invalid_argument("OSC string missing NUL terminator"))?;
    let s = std::str::from_utf8(&buf[start..start + nul])
        .map_err(|_| Error::invalid_argument("OSC string is not valid UTF-8"))?
        .to_string();
    *pos = start + pad4(nul + 1);
    if *pos > buf.len() {
        return Err(Error::invalid_argument("OSC string padding out of bounds"));
    }
    Ok(s)
}

fn read_u32(buf: &[u8], pos: &mut usize) -> Result<u32, Error> {
    let end = *pos + 4;
    if end > buf.len() {
        return Err(Error::invalid_argument("OSC packet truncated"));
    }
    let mut b = [0u8; 4];
    b.copy_from_slice(&buf[*pos..end]);
    *pos = end;
    Ok(u32::from_be_bytes(b))
}

fn decode_one(buf: &[u8], out: &mut Vec<OscMessage>) -> Result<(), Error> {
    let mut pos = 0usize;
    let addr = read_osc_string(buf, &mut pos)?;

    if addr == "#bundle" {
        // timetag (8 bytes) を読み飛ばし、サイズ付き要素を再帰的に展開する
        if pos + 8 > buf.len() {
            return Err(Error::invalid_argument("OSC bundle missing timetag"));
        }
        pos += 8;
        while pos < buf.len() {
            let size = read_u32(buf, &mut pos)? as usize;
            let end = pos + size;
            if end > buf.len() {
                return Err(Error::invalid_argument("OSC bundle element out of bounds"));
            }
            decode_one(&buf[pos..end], out)?;
            pos = end;
        }
        return Ok(());
    }

    let tags = read_osc_string(buf, &mut pos)?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(Error::invalid_argument(format!(
            "OSC type tag string must start with ',': {}",
            tags
        )));
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.bytes() {
        match tag {
            b's' => args.push(OscArg::Str(read_osc_string(buf, &mut pos)?)),
            b'i' => args.push(OscArg::Int(read_u32(buf, &mut pos)? as i32)),
            b'f' => args.push(OscArg::Float(f32::from_be_bytes(
                read_u32(buf, &mut pos)?.to_be_bytes(),
            ))),
            b'T' => args.push(OscArg::Bool(true)),
            b'F' => args.push(OscArg::Bool(false)),
            other => {
                return Err(Error::invalid_argument(format!(
                    "Unsupported OSC type tag: {}",
                    other as char
                )))
            }
        }
    }
    out.push(OscMessage { addr, args });
    Ok(())
}

/// 1 データグラムをデコードする（バンドルは展開してメッセージ列にする）
pub fn decode_packet(buf: &[u8]) -> Result<Vec<OscMessage>, Error> {
    if buf.is_empty() {
        return Err(Error::invalid_argument("Empty OSC packet"));
    }
    let mut out = Vec::new();
    decode_one(buf, &mut out)?;
    Ok(out)
}
