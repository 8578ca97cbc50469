//! VRChat ログファイルの探索
//!
//! 既定のログディレクトリから最新の output_log*.txt を選ぶ。
//! 明示パスが与えられたときはそれを優先する。

use std::path::{Path, PathBuf};

/// 既定の VRChat ログディレクトリ（ホーム配下の AppData/LocalLow/VRChat/VRChat）
pub fn default_log_dir() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok().filter(|s| !s.is_empty())?;
    Some(
        PathBuf::from(home)
            .join("AppData")
            .join("LocalLow")
            .join("VRChat")
            .join("VRChat"),
    )
}

/// ディレクトリ内で最新（mtime 最大）の output_log*.txt を返す
pub fn find_latest_log(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !(name.starts_with("output_log") && name.ends_with(".txt")) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let Ok(mtime) = meta.modified() else { continue };
        match &latest {
            Some((best, _)) if *best >= mtime => {}
            _ => latest = Some((mtime, entry.path())),
        }
    }
    latest.map(|(_, p)| p)
}

/// 明示パス優先でログファイルを解決する。存在しなければ None。
pub fn resolve_log_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        return None;
    }
    let dir = default_log_dir()?;
    find_latest_log(&dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_latest_log_picks_newest_matching() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("output_log_2026-08-01.txt");
        let new = dir.path().join("output_log_2026-08-06.txt");
        let other = dir.path().join("notes.txt");
        fs::write(&old, "old").unwrap();
        fs::write(&other, "skip").unwrap();
        fs::write(&new, "new").unwrap();
        // mtime の差を明示的に付ける
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
        let f = fs::File::options().write(true).open(&old).unwrap();
        f.set_modified(past).unwrap();

        assert_eq!(find_latest_log(dir.path()), Some(new));
    }

    #[test]
    fn test_find_latest_log_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_latest_log(dir.path()), None);
    }

    #[test]
    fn test_resolve_log_path_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_log_x.txt");
        fs::write(&path, "x").unwrap();
        assert_eq!(resolve_log_path(Some(&path)), Some(path.clone()));
        assert_eq!(resolve_log_path(Some(&dir.path().join("missing.txt"))), None);
    }
}
