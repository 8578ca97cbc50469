//! OSC アドレスのワイルドカードマッチ
//!
//! セグメント単位のマッチ。`*` は 1 セグメントに一致し、パターン末尾の `*` は
//! 残りすべてのセグメントに一致する（`/*` で全アドレス購読）。

/// pattern が addr に一致するか
pub fn match_address(pattern: &str, addr: &str) -> bool {
    let pat_segs: Vec<&str> = pattern.trim_start_matches('/').split('/').collect();
    let addr_segs: Vec<&str> = addr.trim_start_matches('/').split('/').collect();

    for (i, pat) in pat_segs.iter().enumerate() {
        // 末尾の * は残り全部に一致（1 セグメント以上あること）
        if *pat == "*" && i == pat_segs.len() - 1 {
            return addr_segs.len() > i;
        }
        match addr_segs.get(i) {
            Some(seg) if *pat == "*" || pat == seg => continue,
            _ => return false,
        }
    }
    addr_segs.len() == pat_segs.len()
}
