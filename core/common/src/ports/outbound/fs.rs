//! ファイルシステム Outbound ポート
//!
//! このリポジトリが実際に行う操作だけを持つ薄い trait。

use crate::error::Error;
use std::io::Write;
use std::path::Path;

/// ファイルシステム操作
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String, Error>;

    /// 全体を書き換える（親ディレクトリは呼び出し側で作成済みであること）
    fn write(&self, path: &Path, contents: &str) -> Result<(), Error>;

    /// 追記用にオープンする（無ければ作成）
    fn open_append(&self, path: &Path) -> Result<Box<dyn Write + Send>, Error>;

    fn create_dir_all(&self, path: &Path) -> Result<(), Error>;
}
