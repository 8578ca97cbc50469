//! CLI 引数解析（clap builder）
//!
//! 解析結果は文字列のまま Config に持ち、domain::Command への解釈は main 側で行う。

use clap::builder::ArgAction;
use clap::value_parser;
use clap_complete::Shell;
use common::error::Error;

/// CLI から受け取った生の設定
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub help: bool,
    /// --home-dir: 設定・メモリの置き場所（VRCADM_HOME 相当）
    pub home_dir: Option<String>,
    /// --log-file: VRChat ログの明示パス
    pub log_file: Option<String>,
    /// -p / --profile: LLM プロファイル名
    pub profile: Option<String>,
    /// -m / --model: モデル名（プロファイルの既定を上書き）
    pub model: Option<String>,
    /// --no-llm: LLM レビュー・生成を使わない
    pub no_llm: bool,
    /// --post-alerts: モデレーションアラートをチャットボックスにも投稿
    pub post_alerts: bool,
    /// コマンド名（None のときはヘルプ表示）
    pub command_name: Option<String>,
    pub command_args: Vec<String>,
}

/// 解析結果: 通常の Config または補完スクリプト生成
#[derive(Debug, Clone)]
pub enum ParseOutcome {
    Config(Config),
    GenerateCompletion(Shell),
}

fn global_args(cmd: clap::Command) -> clap::Command {
    cmd.disable_help_flag(true)
        .arg(
            clap::Arg::new("help")
                .short('h')
                .long("help")
                .help("Print help")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            clap::Arg::new("home-dir")
                .long("home-dir")
                .value_name("directory")
                .help("Directory for config.json and memory files (default: $VRCADM_HOME or ~/.config/vrcadm)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("log-file")
                .long("log-file")
                .value_name("path")
                .help("Explicit VRChat log file path (default: newest output_log*.txt)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("profile")
                .short('p')
                .long("profile")
                .value_name("profile")
                .help("LLM profile name from config (e.g. local, echo)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("model")
                .short('m')
                .long("model")
                .value_name("model")
                .help("Model name, overriding the profile default (e.g. llama3.1)")
                .num_args(1),
        )
        .arg(
            clap::Arg::new("no-llm")
                .long("no-llm")
                .help("Disable LLM review and generation (keyword rules and canned fallbacks only)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("post-alerts")
                .long("post-alerts")
                .help("Also post moderation alerts to the in-world chatbox")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("generate")
                .long("generate")
                .value_name("shell")
                .help("Generate shell completion script")
                .value_parser(value_parser!(Shell))
                .num_args(1),
        )
}

fn with_rest_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::Arg::new("args").num_args(0..).value_name("arg"))
}

fn build_clap_command() -> clap::Command {
    global_args(
        clap::Command::new("vrcadm")
            .about("VRChat instance admin tool: OSC chatbox, log monitor, moderation, assistant")
            .disable_help_subcommand(true)
            .subcommand_required(false)
            .subcommand(clap::Command::new("run").about("Run the monitor daemon (OSC + log tail + moderation + announcements)"))
            .subcommand(with_rest_args(
                clap::Command::new("send").about("Send an [ADMIN] message to the chatbox"),
            ))
            .subcommand(with_rest_args(
                clap::Command::new("quick")
                    .about("List quick announcements, or send one by number"),
            ))
            .subcommand(clap::Command::new("players").about("Scan the VRChat log and print active players"))
            .subcommand(with_rest_args(
                clap::Command::new("review")
                    .about("Run one chat message through the moderation pipeline"),
            ))
            .subcommand(clap::Command::new("idea").about("Generate admin ideas"))
            .subcommand(clap::Command::new("snippet").about("Generate a code snippet"))
            .subcommand(clap::Command::new("memory").about("Show assistant and moderation memory"))
            .subcommand(clap::Command::new("help").about("Print help")),
    )
}

/// プロセスの引数を解析する
pub fn parse_args() -> Result<ParseOutcome, Error> {
    parse_from(std::env::args().collect())
}

/// 引数列を解析する（テスト用入口）
pub fn parse_from(argv: Vec<String>) -> Result<ParseOutcome, Error> {
    let matches = build_clap_command()
        .try_get_matches_from(argv)
        .map_err(|e| Error::invalid_argument(e.to_string()))?;

    if let Some(shell) = matches.get_one::<Shell>("generate") {
        return Ok(ParseOutcome::GenerateCompletion(*shell));
    }

    let mut config = Config {
        help: matches.get_flag("help"),
        home_dir: matches.get_one::<String>("home-dir").cloned(),
        log_file: matches.get_one::<String>("log-file").cloned(),
        profile: matches.get_one::<String>("profile").cloned(),
        model: matches.get_one::<String>("model").cloned(),
        no_llm: matches.get_flag("no-llm"),
        post_alerts: matches.get_flag("post-alerts"),
        command_name: None,
        command_args: Vec::new(),
    };

    if let Some((name, sub)) = matches.subcommand() {
        config.command_name = Some(name.to_string());
        if let Ok(Some(args)) = sub.try_get_many::<String>("args") {
            config.command_args = args.cloned().collect();
        }
        if sub.get_flag("help") {
            config.help = true;
        }
    }
    Ok(ParseOutcome::Config(config))
}

/// 補完スクリプトを stdout に出力する
pub fn print_completion(shell: Shell) {
    let mut cmd = build_clap_command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<ParseOutcome, Error> {
        let mut argv = vec!["vrcadm".to_string()];
        argv.extend(args.iter().map(|s| s.to_string()));
        parse_from(argv)
    }

    fn config(args: &[&str]) -> Config {
        match parse(args).unwrap() {
            ParseOutcome::Config(c) => c,
            other => panic!("expected config, got {:?}", other),
        }
    }

    #[test]
    fn test_no_args_is_empty_config() {
        let c = config(&[]);
        assert!(c.command_name.is_none());
        assert!(!c.help);
    }

    #[test]
    fn test_run_subcommand() {
        let c = config(&["run"]);
        assert_eq!(c.command_name.as_deref(), Some("run"));
    }

    #[test]
    fn test_send_with_message_args() {
        let c = config(&["send", "hello", "there"]);
        assert_eq!(c.command_name.as_deref(), Some("send"));
        assert_eq!(c.command_args, vec!["hello", "there"]);
    }

    #[test]
    fn test_global_flags() {
        let c = config(&[
            "--home-dir",
            "/tmp/vrcadm",
            "--no-llm",
            "--post-alerts",
            "-p",
            "echo",
            "-m",
            "llama3.1",
            "review",
            "Niko",
            "hi",
        ]);
        assert_eq!(c.home_dir.as_deref(), Some("/tmp/vrcadm"));
        assert!(c.no_llm);
        assert!(c.post_alerts);
        assert_eq!(c.profile.as_deref(), Some("echo"));
        assert_eq!(c.model.as_deref(), Some("llama3.1"));
        assert_eq!(c.command_name.as_deref(), Some("review"));
        assert_eq!(c.command_args, vec!["Niko", "hi"]);
    }

    #[test]
    fn test_help_flag() {
        assert!(config(&["-h"]).help);
        assert!(config(&["run", "--help"]).help);
    }

    #[test]
    fn test_generate_completion() {
        match parse(&["--generate", "bash"]).unwrap() {
            ParseOutcome::GenerateCompletion(shell) => {
                assert_eq!(shell.to_string(), "bash");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_flag_is_usage_error() {
        let err = parse(&["--bogus"]).unwrap_err();
        assert!(err.is_usage());
        assert_eq!(err.exit_code(), 64);
    }
}
