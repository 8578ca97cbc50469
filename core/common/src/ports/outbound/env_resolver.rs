//! 環境変数解決 Outbound ポート

use crate::domain::HomeDir;
use crate::error::Error;
use std::path::PathBuf;

/// ホームディレクトリと設定ファイルパスの解決
pub trait EnvResolver: Send + Sync {
    /// ホームディレクトリを解決する。
    /// `VRCADM_HOME` → `$XDG_CONFIG_HOME/vrcadm` → `$HOME/.config/vrcadm` の順。
    fn resolve_home_dir(&self) -> Result<HomeDir, Error>;

    /// 設定ファイル（config.json）のパス
    fn resolve_config_path(&self) -> Result<PathBuf, Error> {
        Ok(self.resolve_home_dir()?.join("config.json"))
    }
}
