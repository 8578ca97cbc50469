//! 常駐監視デーモン
//!
//! OSC 受信スレッド・モデレーションワーカー・メインループ（ログ追尾と定期アナウンス）
//! の 3 本で動く。停止は running フラグを降ろすだけで、各スレッドは
//! タイムアウト付きの受信で自然に抜ける。致命的なのは起動時のバインド失敗のみ。

use crate::domain::{ChatMessage, Roster};
use crate::logwatch::{resolve_log_path, EventParser, LogEvent, LogTailer};
use crate::osc::{format_args, OscListener, OscMessage};
use crate::ports::outbound::ChatboxSink;
use crate::usecase::{Announcer, ModerationUseCase};
use common::error::Error;
use common::notice_hub::NoticeHubHandle;
use common::ports::outbound::Clock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const LOOP_TICK: Duration = Duration::from_millis(150);
const WORKER_RECV_TIMEOUT: Duration = Duration::from_millis(200);

/// 監視デーモンの設定（wiring で AdminConfig から組み立てる）
pub struct MonitorSettings {
    pub listen_host: String,
    pub listen_port: u16,
    pub subscribe: String,
    pub poll_interval_secs: u64,
    pub announce_interval_secs: u64,
    pub log_file: Option<PathBuf>,
}

/// 常駐監視ユースケース
pub struct Monitor {
    settings: MonitorSettings,
    chatbox: Arc<dyn ChatboxSink>,
    moderation: ModerationUseCase,
    announcer: Announcer,
    parser: EventParser,
    notices: NoticeHubHandle,
    clock: Arc<dyn Clock>,
}

/// メインループが持ち回る追尾状態
struct LogWatchState {
    explicit_path: Option<PathBuf>,
    tailer: Option<LogTailer>,
    roster: Roster,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        chatbox: Arc<dyn ChatboxSink>,
        moderation: ModerationUseCase,
        announcer: Announcer,
        parser: EventParser,
        notices: NoticeHubHandle,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            chatbox,
            moderation,
            announcer,
            parser,
            notices,
            clock,
        }
    }

    /// running が true の間デーモンを回す。バインド失敗のみ Err。
    pub fn run(self, running: Arc<AtomicBool>) -> Result<(), Error> {
        let Monitor {
            settings,
            chatbox,
            mut moderation,
            mut announcer,
            parser,
            notices,
            clock,
        } = self;

        let listener =
            OscListener::bind(&settings.listen_host, settings.listen_port, &settings.subscribe)?;

        let (osc_tx, osc_rx) = mpsc::channel::<OscMessage>();
        let listener_handle = listener.spawn(osc_tx, notices.clone(), Arc::clone(&running));

        let (mod_tx, mod_rx) = mpsc::channel::<ChatMessage>();
        let worker_running = Arc::clone(&running);
        let worker_handle = thread::spawn(move || {
            while worker_running.load(Ordering::Relaxed) {
                match mod_rx.recv_timeout(WORKER_RECV_TIMEOUT) {
                    Ok(message) => {
                        let _ = moderation.process(&message);
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        notices.emit(
            "lifecycle",
            format!(
                "Admin system started (OSC {}:{})",
                settings.listen_host, settings.listen_port
            ),
        );

        let mut state = LogWatchState {
            explicit_path: settings.log_file.clone(),
            tailer: None,
            roster: Roster::new(),
        };
        let poll_interval_ms = settings.poll_interval_secs.max(1) * 1000;
        let announce_interval_ms = settings.announce_interval_secs * 1000;
        let mut last_poll = 0u64;
        // 初回アナウンスは 1 周期後（元ツールと同じ）
        let mut last_announce = clock.now_ms();

        while running.load(Ordering::Relaxed) {
            // OSC 受信分を通知へ流す
            while let Ok(msg) = osc_rx.try_recv() {
                notices.emit("osc", format!("OSC {} -> {}", msg.addr, format_args(&msg.args)));
            }

            let now = clock.now_ms();

            if now.saturating_sub(last_poll) >= poll_interval_ms {
                last_poll = now;
                poll_log(&parser, &notices, &mut state, &mod_tx);
            }

            if announce_interval_ms > 0 && now.saturating_sub(last_announce) >= announce_interval_ms
            {
                last_announce = now;
                announce(&mut announcer, chatbox.as_ref(), &notices);
            }

            thread::sleep(LOOP_TICK);
        }

        notices.emit("lifecycle", "Admin system stopped");
        drop(mod_tx);
        let _ = worker_handle.join();
        let _ = listener_handle.join();
        Ok(())
    }
}

/// ログの出現・切り替わりを見ながら新しい行を処理する
fn poll_log(
    parser: &EventParser,
    notices: &NoticeHubHandle,
    state: &mut LogWatchState,
    mod_tx: &mpsc::Sender<ChatMessage>,
) {
    let resolved = resolve_log_path(state.explicit_path.as_deref());
    let Some(path) = resolved else {
        if state.tailer.is_some() {
            notices.emit("logwatch", "VRChat log disappeared; waiting");
            state.tailer = None;
        }
        return;
    };

    let needs_new = match &state.tailer {
        Some(t) => t.path() != path,
        None => true,
    };
    if needs_new {
        match LogTailer::anchored(&path) {
            Ok(t) => {
                notices.emit(
                    "logwatch",
                    format!("Monitoring VRChat log -> {}", path.display()),
                );
                state.tailer = Some(t);
            }
            Err(e) => {
                notices.emit("error", format!("VRCHAT LOG OPEN ERROR -> {}", e));
                return;
            }
        }
    }

    let Some(tailer) = &mut state.tailer else {
        return;
    };
    let lines = match tailer.poll() {
        Ok(lines) => lines,
        Err(e) => {
            notices.emit("error", format!("VRCHAT LOG READ ERROR -> {}", e));
            return;
        }
    };
    for line in &lines {
        match parser.parse_line(line) {
            Some(LogEvent::Join(name)) => {
                state.roster.apply_join(&name);
                notices.emit(
                    "roster",
                    format!(
                        "USER JOINED: {} (active: {})",
                        name,
                        state.roster.active_count()
                    ),
                );
            }
            Some(LogEvent::Leave(name)) => {
                state.roster.apply_leave(&name);
                notices.emit(
                    "roster",
                    format!(
                        "USER LEFT: {} (active: {})",
                        name,
                        state.roster.active_count()
                    ),
                );
            }
            Some(LogEvent::Chat(message)) => {
                if mod_tx.send(message).is_err() {
                    // ワーカーが終了している: 停止処理中
                    return;
                }
            }
            None => {}
        }
    }
}

fn announce(announcer: &mut Announcer, chatbox: &dyn ChatboxSink, notices: &NoticeHubHandle) {
    let Some(text) = announcer.next_announcement() else {
        return;
    };
    match chatbox.send_chatbox(&text) {
        Ok(()) => notices.emit("announce", format!("AUTO ANNOUNCEMENT: {}", text)),
        Err(e) => notices.emit("error", format!("ANNOUNCEMENT SEND FAILED -> {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{JsonlStore, WordMemory};
    use crate::moderation::{DecisionEngine, TextNormalizer, Thresholds};
    use common::adapter::{StdClock, StdFileSystem};
    use common::notice_hub::{NoticeHub, NoticeHubHandle};
    use common::ports::outbound::{NoticeRecord, NoticeSink};
    use std::collections::HashMap;
    use std::io::Write;
    use std::net::UdpSocket;
    use std::path::Path;
    use std::sync::Mutex;

    struct CollectingSink(Arc<Mutex<Vec<NoticeRecord>>>);

    impl NoticeSink for CollectingSink {
        fn emit(&mut self, rec: &NoticeRecord) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(rec.clone());
            Ok(())
        }
    }

    struct NullChatbox;

    impl ChatboxSink for NullChatbox {
        fn send_chatbox(&self, _text: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    fn moderation(dir: &Path, notices: NoticeHubHandle) -> ModerationUseCase {
        let fs: Arc<StdFileSystem> = Arc::new(StdFileSystem);
        ModerationUseCase::new(
            DecisionEngine::new(
                &["dox".to_string()],
                vec![],
                TextNormalizer::new(&HashMap::new(), crate::moderation::Morphology::Stem),
                Thresholds::default(),
            ),
            None,
            None,
            false,
            WordMemory::new(
                Arc::clone(&fs) as Arc<dyn common::ports::outbound::FileSystem>,
                Arc::new(StdClock),
                dir.join("word_memory.jsonl"),
                Some(30),
            ),
            JsonlStore::new(
                Arc::clone(&fs) as Arc<dyn common::ports::outbound::FileSystem>,
                dir.join("mod_memory.jsonl"),
                30,
                200_000,
            ),
            true,
            notices.clone(),
            Arc::new(StdClock),
        )
    }

    /// デーモンを数秒回し、ログ追尾 → モデレーション → ライフサイクル通知まで通す
    #[test]
    fn test_daemon_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("output_log_test.txt");
        std::fs::write(&log_path, "boot noise\n").unwrap();

        let collected = Arc::new(Mutex::new(Vec::new()));
        let notices = NoticeHubHandle::new(NoticeHub::new(
            Arc::new(StdClock),
            vec![Box::new(CollectingSink(Arc::clone(&collected)))],
        ));

        let settings = MonitorSettings {
            listen_host: "127.0.0.1".to_string(),
            listen_port: 0,
            subscribe: "/*".to_string(),
            poll_interval_secs: 1,
            announce_interval_secs: 0,
            log_file: Some(log_path.clone()),
        };
        let monitor = Monitor::new(
            settings,
            Arc::new(NullChatbox),
            moderation(dir.path(), notices.clone()),
            Announcer::new(vec![], vec![]),
            EventParser::new().unwrap(),
            notices,
            Arc::new(StdClock),
        );

        let running = Arc::new(AtomicBool::new(true));
        let run_flag = Arc::clone(&running);
        let handle = thread::spawn(move || monitor.run(run_flag));

        // アンカー後に join とチャットを書き足す
        thread::sleep(Duration::from_millis(1300));
        {
            let mut f = std::fs::OpenOptions::new()
                .append(true)
                .open(&log_path)
                .unwrap();
            writeln!(f, "OnPlayerJoined Niko").unwrap();
            writeln!(f, "OnPlayerChat Niko: i will dox you").unwrap();
        }
        thread::sleep(Duration::from_millis(1800));

        running.store(false, Ordering::Relaxed);
        handle.join().unwrap().unwrap();

        let records = collected.lock().unwrap();
        let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
        assert!(messages.iter().any(|m| m.starts_with("Admin system started")));
        assert!(messages.iter().any(|m| m.contains("USER JOINED: Niko")));
        assert!(messages
            .iter()
            .any(|m| m.contains("MOD ALERT -> Niko: ESCALATE")));
        assert!(messages.iter().any(|m| m == &"Admin system stopped"));
    }

    /// バインド失敗は Err で返る（唯一の致命エラー）
    #[test]
    fn test_bind_failure_is_fatal() {
        let held = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = held.local_addr().unwrap().port();
        let dir = tempfile::tempdir().unwrap();
        let notices = NoticeHubHandle::new(NoticeHub::new(Arc::new(StdClock), vec![]));
        let settings = MonitorSettings {
            listen_host: "127.0.0.1".to_string(),
            listen_port: port,
            subscribe: "/*".to_string(),
            poll_interval_secs: 1,
            announce_interval_secs: 300,
            log_file: None,
        };
        let monitor = Monitor::new(
            settings,
            Arc::new(NullChatbox),
            moderation(dir.path(), notices.clone()),
            Announcer::new(vec![], vec![]),
            EventParser::new().unwrap(),
            notices,
            Arc::new(StdClock),
        );
        let err = monitor.run(Arc::new(AtomicBool::new(true))).unwrap_err();
        assert!(err.to_string().contains("bind OSC listener"));
    }
}
