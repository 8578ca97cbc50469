//! 配線: 標準アダプタでユースケースを組み立てる

use crate::adapter::{JsonlStore, LlmReviewer, OscChatbox, WordMemory};
use crate::cli;
use crate::config::AdminConfig;
use crate::logwatch::EventParser;
use crate::moderation::{DecisionEngine, Morphology, TextNormalizer, Thresholds};
use crate::osc::OscSender;
use crate::ports::outbound::{ChatboxSink, ModReviewer};
use crate::usecase::monitor::MonitorSettings;
use crate::usecase::{Announcer, AssistantUseCase, ModerationUseCase, Monitor};
use common::adapter::{
    FileJsonLog, FixedHomeResolver, HumanLogSink, PlainLogSink, StdClock, StdEnvResolver,
    StdFileSystem, TranscriptSink,
};
use common::domain::{HomeDir, ModelName, ProviderName};
use common::error::Error;
use common::llm::{create_driver, resolve_provider, AnyProvider, LlmDriver};
use common::notice_hub::{NoticeHub, NoticeHubHandle};
use common::ports::outbound::{Clock, EnvResolver, FileSystem, Log, NoticeSink};
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;
use std::sync::Arc;

/// 配線済みのアプリ状態
pub struct App {
    pub config: AdminConfig,
    pub home: HomeDir,
    pub fs: Arc<dyn FileSystem>,
    pub clock: Arc<dyn Clock>,
    pub logger: Arc<dyn Log>,
    pub notices: NoticeHubHandle,
    /// CLI 上書き
    pub profile: Option<ProviderName>,
    pub model: Option<ModelName>,
    pub no_llm: bool,
    pub post_alerts: bool,
    pub log_file: Option<PathBuf>,
}

/// CLI 設定から App を組み立てる
pub fn wire_app(cli: &cli::Config) -> Result<App, Error> {
    let fs: Arc<dyn FileSystem> = Arc::new(StdFileSystem);
    let env: Arc<dyn EnvResolver> = match &cli.home_dir {
        Some(dir) => Arc::new(FixedHomeResolver(PathBuf::from(dir))),
        None => Arc::new(StdEnvResolver),
    };
    let home = env.resolve_home_dir()?;
    let config = AdminConfig::load(fs.as_ref(), env.as_ref())?;
    let clock: Arc<dyn Clock> = Arc::new(StdClock);

    let logger: Arc<dyn Log> = Arc::new(FileJsonLog::new(
        Arc::clone(&fs),
        home.join(&config.json_log_file),
    ));

    let sinks: Vec<Box<dyn NoticeSink>> = vec![
        Box::new(HumanLogSink::new()),
        Box::new(PlainLogSink::new(
            Arc::clone(&fs),
            home.join(&config.event_log_file),
        )),
        Box::new(TranscriptSink::new(
            Arc::clone(&fs),
            home.join(&config.transcript_file),
        )),
    ];
    let notices = NoticeHubHandle::new(NoticeHub::new(Arc::clone(&clock), sinks));

    Ok(App {
        home,
        fs,
        clock,
        logger,
        notices,
        profile: cli.profile.as_deref().map(ProviderName::new),
        model: cli.model.as_deref().map(ModelName::new),
        no_llm: cli.no_llm,
        post_alerts: cli.post_alerts || config.post_alerts,
        log_file: cli
            .log_file
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| config.log_file.clone()),
        config,
    })
}

impl App {
    /// アシスタントメモリの有界ストア
    pub fn build_assistant_store(&self) -> JsonlStore {
        JsonlStore::new(
            Arc::clone(&self.fs),
            self.home.join(&self.config.assistant_memory.file),
            self.config.assistant_memory.max_items,
            self.config.assistant_memory.max_bytes,
        )
    }

    /// モデレーションメモリの有界ストア
    pub fn build_mod_store(&self) -> JsonlStore {
        JsonlStore::new(
            Arc::clone(&self.fs),
            self.home.join(&self.config.mod_memory.file),
            self.config.mod_memory.max_items,
            self.config.mod_memory.max_bytes,
        )
    }

    /// LLM ドライバー（--no-llm のときは None）
    pub fn build_driver(&self) -> Result<Option<LlmDriver<AnyProvider>>, Error> {
        if self.no_llm {
            return Ok(None);
        }
        let section = self.config.llm_section()?;
        let mut resolved = resolve_provider(self.profile.as_ref(), section.as_ref())?;
        if let Some(model) = &self.model {
            resolved.model = Some(model.as_ref().to_string());
        }
        Ok(Some(create_driver(&resolved)))
    }

    /// チャットボックス送信（OSC）
    pub fn build_chatbox(&self) -> Result<Arc<dyn ChatboxSink>, Error> {
        let sender = OscSender::new(&self.config.send_host, self.config.send_port)?;
        Ok(Arc::new(OscChatbox::new(sender)))
    }

    /// 判定エンジン（設定の不正な正規表現は警告して読み飛ばす）
    pub fn build_engine(&self) -> DecisionEngine {
        let normalizer = TextNormalizer::new(
            &self.config.synonyms,
            Morphology::parse(&self.config.morphology),
        );
        let mut blocked: Vec<(String, Regex)> = Vec::new();
        for raw in &self.config.blocked_patterns {
            match RegexBuilder::new(raw).case_insensitive(true).build() {
                Ok(re) => blocked.push((raw.clone(), re)),
                Err(e) => self
                    .notices
                    .emit("error", format!("Invalid blocked pattern ignored: {} ({})", raw, e)),
            }
        }
        for phrase in &self.config.blocked_phrases {
            if !phrase.trim().is_empty() {
                blocked.push((
                    phrase.clone(),
                    crate::moderation::patterns::blocked_pattern(phrase),
                ));
            }
        }
        DecisionEngine::new(
            &self.config.keywords,
            blocked,
            normalizer,
            Thresholds {
                warn: self.config.warn_threshold,
                remove: self.config.remove_threshold,
                escalate: self.config.escalate_threshold,
            },
        )
    }

    /// モデレーションユースケース。
    /// chatbox はアラート投稿が有効なときだけ渡す（review コマンドではソケット不要）。
    pub fn build_moderation(
        &self,
        chatbox: Option<Arc<dyn ChatboxSink>>,
    ) -> Result<ModerationUseCase, Error> {
        let reviewer: Option<Arc<dyn ModReviewer>> = if self.config.use_llm_review {
            self.build_driver()?.map(|driver| {
                Arc::new(LlmReviewer::new(
                    driver,
                    self.config.local_only,
                    Arc::clone(&self.logger),
                )) as Arc<dyn ModReviewer>
            })
        } else {
            None
        };

        let mut word_memory = WordMemory::new(
            Arc::clone(&self.fs),
            Arc::clone(&self.clock),
            self.home.join(&self.config.word_memory_file),
            Some(self.config.word_memory_retention_days),
        );
        word_memory.load()?;

        let mod_memory = self.build_mod_store();

        Ok(ModerationUseCase::new(
            self.build_engine(),
            reviewer,
            chatbox,
            self.post_alerts,
            word_memory,
            mod_memory,
            self.config.use_mod_memory,
            self.notices.clone(),
            Arc::clone(&self.clock),
        ))
    }

    /// アシスタントユースケース
    pub fn build_assistant(&self) -> Result<AssistantUseCase, Error> {
        let memory = self.build_assistant_store();
        Ok(AssistantUseCase::new(
            self.build_driver()?,
            self.config.local_only,
            self.config.prefer_amd,
            memory,
            self.config.use_assistant_memory,
            Arc::clone(&self.clock),
            Arc::clone(&self.logger),
        ))
    }

    pub fn build_announcer(&self) -> Announcer {
        Announcer::new(
            self.config.announcements.clone(),
            self.config.quick_announcements.clone(),
        )
    }

    /// 常駐監視デーモン
    pub fn build_monitor(&self) -> Result<Monitor, Error> {
        let chatbox = self.build_chatbox()?;
        let moderation = self.build_moderation(if self.post_alerts {
            Some(Arc::clone(&chatbox))
        } else {
            None
        })?;
        let settings = MonitorSettings {
            listen_host: self.config.listen_host.clone(),
            listen_port: self.config.listen_port,
            subscribe: self.config.subscribe.clone(),
            poll_interval_secs: self.config.poll_interval_secs,
            announce_interval_secs: self.config.announce_interval_secs,
            log_file: self.log_file.clone(),
        };
        Ok(Monitor::new(
            settings,
            chatbox,
            moderation,
            self.build_announcer(),
            EventParser::new()?,
            self.notices.clone(),
            Arc::clone(&self.clock),
        ))
    }
}
