mod adapter;
mod cli;
mod config;
mod domain;
mod logwatch;
mod moderation;
mod osc;
mod ports;
mod usecase;
mod wiring;

use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cli::{parse_args, print_completion, Config, ParseOutcome};
use common::error::Error;
use common::ports::outbound::{now_iso8601, LogLevel, LogRecord};
use domain::memory::{render_assistant_memory, render_mod_memory};
use domain::{AssistantMode, ChatMessage, Command};
use logwatch::{resolve_log_path, EventParser};
use usecase::announce;
use wiring::{wire_app, App};

/// Command をディスパッチする Runner（match は main レイヤーに集約）
struct Runner {
    app: App,
}

impl Runner {
    fn run(&self, config: &Config) -> Result<i32, Error> {
        let cmd = match &config.command_name {
            Some(name) => Command::parse_with_args(name, &config.command_args),
            None => Command::Help,
        };
        let command_name = cmd_name_for_log(&cmd);
        self.log_lifecycle("command started", command_name, None);

        let result = self.dispatch(cmd);

        let code = result.as_ref().copied().unwrap_or(0);
        self.log_lifecycle("command finished", command_name, Some(code));
        if let Err(e) = &result {
            let _ = self.app.logger.log(&LogRecord {
                ts: now_iso8601(),
                level: LogLevel::Error,
                message: e.to_string(),
                layer: Some("cli".to_string()),
                kind: Some("error".to_string()),
                fields: None,
            });
        }
        result
    }

    fn dispatch(&self, cmd: Command) -> Result<i32, Error> {
        match cmd {
            Command::Help => {
                print_help();
                Ok(0)
            }
            Command::Run => {
                let running = Arc::new(AtomicBool::new(true));
                let flag = Arc::clone(&running);
                ctrlc::set_handler(move || flag.store(false, Ordering::Relaxed))
                    .map_err(|e| Error::io_msg(format!("install signal handler: {}", e)))?;
                let monitor = self.app.build_monitor()?;
                monitor.run(running)?;
                Ok(0)
            }
            Command::Send { text } => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return Err(Error::invalid_argument("send: message text is required"));
                }
                let chatbox = self.app.build_chatbox()?;
                let message = announce::admin_message(&text);
                chatbox.send_chatbox(&message)?;
                self.app
                    .notices
                    .emit("announce", format!("ADMIN CHAT: {}", text));
                Ok(0)
            }
            Command::Quick { index } => {
                let announcer = self.app.build_announcer();
                match index {
                    None => {
                        for (i, msg) in announcer.quick_list().iter().enumerate() {
                            println!("{:2}. {}", i + 1, msg);
                        }
                        Ok(0)
                    }
                    Some(n) => {
                        let Some(message) = announcer.quick_message(n) else {
                            return Err(Error::invalid_argument(format!(
                                "quick: no announcement #{} (1..{})",
                                n,
                                announcer.quick_list().len()
                            )));
                        };
                        let chatbox = self.app.build_chatbox()?;
                        chatbox.send_chatbox(&message)?;
                        self.app
                            .notices
                            .emit("announce", format!("ADMIN QUICK: {}", message));
                        Ok(0)
                    }
                }
            }
            Command::Players => {
                let Some(path) = resolve_log_path(self.app.log_file.as_deref()) else {
                    self.app
                        .notices
                        .emit("error", "VRCHAT LOG NOT FOUND: set --log-file and try again.");
                    return Ok(1);
                };
                let contents = self.app.fs.read_to_string(&path)?;
                let parser = EventParser::new()?;
                let players = parser.active_players(contents.lines());
                self.app
                    .notices
                    .emit("roster", format!("VRCHAT PLAYERS FOUND: {}", players.len()));
                for name in &players {
                    println!("{}", name);
                }
                Ok(0)
            }
            Command::Review { user, text } => {
                if user.trim().is_empty() || text.trim().is_empty() {
                    return Err(Error::invalid_argument(
                        "review: usage is `review <user> <message...>`",
                    ));
                }
                let mut moderation = self.app.build_moderation(None)?;
                let outcome = moderation.process(&ChatMessage::new(user.trim(), text.trim()));
                println!(
                    "action: {}\nreason: {}\nconfidence: {:.2}",
                    outcome.action.as_str(),
                    outcome.reason,
                    outcome.confidence
                );
                if let Some(ctx) = &outcome.context {
                    println!(
                        "scores: base {} + format {} + history {} (llm floor {}) = {}",
                        ctx.base_score,
                        ctx.format_score,
                        ctx.history_score,
                        ctx.llm_floor,
                        ctx.total_score
                    );
                    println!(
                        "signals: length {}, links {}, uppercase {:.2}",
                        ctx.message_length, ctx.link_count, ctx.uppercase_ratio
                    );
                    if let Some(keyword) = &ctx.matched_keyword {
                        println!("keyword: {}", keyword);
                    }
                    if let Some(pattern) = &ctx.blocked_pattern {
                        println!("blocked: {}", pattern);
                    }
                    println!("note: {}", ctx.review_note);
                }
                if let Some(alert) = &outcome.alert {
                    println!("alert: {}", alert);
                }
                Ok(0)
            }
            Command::Idea => self.generate(AssistantMode::Idea),
            Command::Snippet => self.generate(AssistantMode::Snippet),
            Command::Memory => {
                let assistant = self.app.build_assistant_store();
                let moderation = self.app.build_mod_store();
                println!("# assistant memory ({})", assistant.path().display());
                let rendered = render_assistant_memory(&assistant.load_recent(usize::MAX)?);
                if !rendered.is_empty() {
                    println!("{}", rendered);
                }
                println!("\n# moderation memory ({})", moderation.path().display());
                let rendered = render_mod_memory(&moderation.load_recent(usize::MAX)?);
                if !rendered.is_empty() {
                    println!("{}", rendered);
                }
                Ok(0)
            }
            Command::Unknown(name) => Err(Error::invalid_argument(format!(
                "Unknown command: {}",
                name
            ))),
        }
    }

    fn generate(&self, mode: AssistantMode) -> Result<i32, Error> {
        let assistant = self.app.build_assistant()?;
        let output = assistant.generate(mode);
        let first_line: String = output.lines().next().unwrap_or("").chars().take(160).collect();
        self.app.notices.emit(
            "assistant",
            format!("AI {} RESULT -> {}", mode.as_str().to_uppercase(), first_line),
        );
        println!("{}", output);
        Ok(0)
    }

    fn log_lifecycle(&self, message: &str, command: &str, exit_code: Option<i32>) {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("command".to_string(), serde_json::json!(command));
        if let Some(code) = exit_code {
            fields.insert("exit_code".to_string(), serde_json::json!(code));
        }
        let _ = self.app.logger.log(&LogRecord {
            ts: now_iso8601(),
            level: LogLevel::Info,
            message: message.to_string(),
            layer: Some("cli".to_string()),
            kind: Some("lifecycle".to_string()),
            fields: Some(fields),
        });
    }
}

fn cmd_name_for_log(cmd: &Command) -> &'static str {
    match cmd {
        Command::Help => "help",
        Command::Run => "run",
        Command::Send { .. } => "send",
        Command::Quick { .. } => "quick",
        Command::Players => "players",
        Command::Review { .. } => "review",
        Command::Idea => "idea",
        Command::Snippet => "snippet",
        Command::Memory => "memory",
        Command::Unknown(_) => "unknown",
    }
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            if e.is_usage() {
                print_usage();
            }
            eprintln!("vrcadm: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let outcome = parse_args()?;
    let config = match outcome {
        ParseOutcome::Config(c) => c,
        ParseOutcome::GenerateCompletion(shell) => {
            print_completion(shell);
            return Ok(0);
        }
    };
    if config.help {
        print_help();
        return Ok(0);
    }
    let app = wire_app(&config)?;
    let runner = Runner { app };
    runner.run(&config)
}

fn print_usage() {
    eprintln!("Usage: vrcadm [options] <command> [args...]");
}

fn print_help() {
    println!("Usage: vrcadm [options] <command> [args...]");
    println!();
    println!("Commands:");
    println!("  run                     Run the monitor daemon (OSC listener, log tail, moderation, announcements)");
    println!("  send <message...>       Send an [ADMIN] message to the in-world chatbox");
    println!("  quick [n]               List quick announcements, or send #n");
    println!("  players                 Scan the VRChat log and print active players");
    println!("  review <user> <text...> Run one chat message through the moderation pipeline");
    println!("  idea                    Generate admin ideas (LLM, falls back to canned text)");
    println!("  snippet                 Generate a code snippet");
    println!("  memory                  Show assistant and moderation memory files");
    println!();
    println!("Options:");
    println!("  -h, --help              Show this help message");
    println!("  --home-dir <directory>  Config and memory location (default: $VRCADM_HOME or ~/.config/vrcadm)");
    println!("  --log-file <path>       Explicit VRChat log file (default: newest output_log*.txt)");
    println!("  -p, --profile <name>    LLM profile from config.json (e.g. local, echo)");
    println!("  -m, --model <model>     Model name, overriding the profile default (e.g. llama3.1)");
    println!("  --no-llm                Disable LLM calls; keyword rules and canned fallbacks only");
    println!("  --post-alerts           Also post moderation alerts to the chatbox");
    println!("  --generate <shell>      Generate shell completion script (bash, zsh, fish)");
    println!();
    println!("Environment:");
    println!("  VRCADM_HOME             Home directory. Config: $VRCADM_HOME/config.json");
    println!("                          If unset, $XDG_CONFIG_HOME/vrcadm (e.g. ~/.config/vrcadm) is used.");
    println!();
    println!("Examples:");
    println!("  vrcadm run");
    println!("  vrcadm send Please keep the noise down");
    println!("  vrcadm quick 2");
    println!("  vrcadm --no-llm review Niko \"you all suck\"");
}
