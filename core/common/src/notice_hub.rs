//! NoticeHub: 1 回の emit で全 sink へ NoticeRecord を配信する dispatcher
//!
//! sink 失敗時は他 sink への配信を継続し、警告を stderr に出す（best-effort）。

use crate::ports::outbound::{Clock, NoticeRecord, NoticeSink};
use std::sync::{Arc, Mutex};

/// 複数 sink へ順に配信する dispatcher
pub struct NoticeHub {
    clock: Arc<dyn Clock>,
    sinks: Vec<Box<dyn NoticeSink>>,
    seq: u64,
}

impl NoticeHub {
    pub fn new(clock: Arc<dyn Clock>, sinks: Vec<Box<dyn NoticeSink>>) -> Self {
        Self {
            clock,
            sinks,
            seq: 0,
        }
    }

    /// 1 件の通知を ts/seq 付きで全 sink へ配信する。
    /// sink 失敗時は他 sink は継続し、警告のみ eprintln する。
    pub fn emit(&mut self, kind: &str, message: impl Into<String>) {
        self.seq += 1;
        let rec = NoticeRecord {
            ts: self.clock.now_rfc3339(),
            seq: self.seq,
            kind: kind.to_string(),
            message: message.into(),
        };
        for (i, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = sink.emit(&rec) {
                eprintln!("[notice_hub] sink #{} emit failed: {}", i, e);
            }
        }
    }
}

/// 共有ハンドル（usecase・adapter・ワーカースレッドから emit しやすくする）
#[derive(Clone)]
pub struct NoticeHubHandle(Arc<Mutex<NoticeHub>>);

impl NoticeHubHandle {
    pub fn new(hub: NoticeHub) -> Self {
        Self(Arc::new(Mutex::new(hub)))
    }

    /// ロックして hub.emit を呼ぶ
    pub fn emit(&self, kind: &str, message: impl Into<String>) {
        if let Ok(mut hub) = self.0.lock() {
            hub.emit(kind, message);
        } else {
            eprintln!("[notice_hub] lock poisoned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now_ms(&self) -> u64 {
            1_000
        }
        fn now_rfc3339(&self) -> String {
            "2026-08-06T00:00:00+00:00".to_string()
        }
    }

    struct ChannelSink(mpsc::Sender<NoticeRecord>);

    impl NoticeSink for ChannelSink {
        fn emit(&mut self, rec: &NoticeRecord) -> anyhow::Result<()> {
            self.0.send(rec.clone())?;
            Ok(())
        }
    }

    struct FailingSink;

    impl NoticeSink for FailingSink {
        fn emit(&mut self, _rec: &NoticeRecord) -> anyhow::Result<()> {
            anyhow::bail!("broken sink")
        }
    }

    #[test]
    fn test_emit_increments_seq_and_fans_out() {
        let (tx, rx) = mpsc::channel();
        let mut hub = NoticeHub::new(Arc::new(FixedClock), vec![Box::new(ChannelSink(tx))]);
        hub.emit("osc", "first");
        hub.emit("osc", "second");
        let a = rx.recv().unwrap();
        let b = rx.recv().unwrap();
        assert_eq!(a.seq, 1);
        assert_eq!(b.seq, 2);
        assert_eq!(a.kind, "osc");
        assert_eq!(b.message, "second");
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let (tx, rx) = mpsc::channel();
        let mut hub = NoticeHub::new(
            Arc::new(FixedClock),
            vec![Box::new(FailingSink), Box::new(ChannelSink(tx))],
        );
        hub.emit("error", "still delivered");
        assert_eq!(rx.recv().unwrap().message, "still delivered");
    }

    #[test]
    fn test_handle_emit_from_clone() {
        let (tx, rx) = mpsc::channel();
        let handle = NoticeHubHandle::new(NoticeHub::new(
            Arc::new(FixedClock),
            vec![Box::new(ChannelSink(tx))],
        ));
        let cloned = handle.clone();
        cloned.emit("lifecycle", "from clone");
        assert_eq!(rx.recv().unwrap().kind, "lifecycle");
    }
}
