//! vrcadm コマンドの enum（Command Pattern）
//!
//! 引数解析の結果を enum に落とし、match でディスパッチする。

/// vrcadm のサブコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// ヘルプ表示
    Help,

    /// 常駐監視（OSC 受信・ログ追尾・モデレーション・定期アナウンス）
    Run,

    /// 管理者メッセージをチャットボックスへ送信
    Send { text: String },

    /// クイックアナウンス（番号なしで一覧、番号付きで送信）
    Quick { index: Option<usize> },

    /// VRChat ログを走査してアクティブプレイヤーを表示
    Players,

    /// 1 件のチャットをモデレーションパイプラインに通して判定を表示
    Review { user: String, text: String },

    /// 運営アイデアを生成
    Idea,

    /// コードスニペットを生成
    Snippet,

    /// メモリファイルの内容を表示
    Memory,

    /// 未知のコマンド（エラー用）
    Unknown(String),
}

impl Command {
    /// コマンド名と引数から Command に解析する
    pub fn parse_with_args(name: &str, args: &[String]) -> Self {
        match name {
            "help" => Command::Help,
            "run" => Command::Run,
            "send" => Command::Send {
                text: args.join(" "),
            },
            "quick" => Command::Quick {
                index: args.first().and_then(|s| s.parse().ok()),
            },
            "players" => Command::Players,
            "review" => {
                let user = args.first().cloned().unwrap_or_default();
                let text = args.get(1..).map(|r| r.join(" ")).unwrap_or_default();
                Command::Review { user, text }
            }
            "idea" => Command::Idea,
            "snippet" => Command::Snippet,
            "memory" => Command::Memory,
            other => Command::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(Command::parse_with_args("run", &[]), Command::Run);
        assert_eq!(Command::parse_with_args("players", &[]), Command::Players);
        assert_eq!(Command::parse_with_args("idea", &[]), Command::Idea);
    }

    #[test]
    fn test_parse_send_joins_args() {
        assert_eq!(
            Command::parse_with_args("send", &strs(&["hello", "there"])),
            Command::Send {
                text: "hello there".to_string()
            }
        );
    }

    #[test]
    fn test_parse_quick_index() {
        assert_eq!(
            Command::parse_with_args("quick", &[]),
            Command::Quick { index: None }
        );
        assert_eq!(
            Command::parse_with_args("quick", &strs(&["3"])),
            Command::Quick { index: Some(3) }
        );
        assert_eq!(
            Command::parse_with_args("quick", &strs(&["abc"])),
            Command::Quick { index: None }
        );
    }

    #[test]
    fn test_parse_review_splits_user_and_text() {
        assert_eq!(
            Command::parse_with_args("review", &strs(&["Niko", "you", "all", "suck"])),
            Command::Review {
                user: "Niko".to_string(),
                text: "you all suck".to_string()
            }
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse_with_args("bogus", &[]),
            Command::Unknown("bogus".to_string())
        );
    }
}
