use chrono::{Datelike, Timelike};
use tracing::level_filters::LevelFilter;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, EnvFilter};

struct LogTimer;

impl fmt::time::FormatTime for LogTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        let cs = now.timestamp_subsec_millis() / 10;
        let s = format!(
            "{:04}-{:02}-{:02}:{:02}:{:02}:{:02}:{:02}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            cs
        );
        w.write_str(&s)
    }
}

/// 解析日志级别，无法识别时回退到 info / Parse the level, `info` when unrecognised
///
/// 不能直接交给 `EnvFilter`：未知单词会被当成 target 名称
/// Unknown words must not reach `EnvFilter`, which reads them as target names
fn parse_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::INFO)
}

fn build_filter(level: &str) -> EnvFilter {
    let level = parse_level(level).to_string().to_lowercase();
    EnvFilter::new(format!("{},sled=warn", level))
}

/// 安装全局日志订阅者，重复调用无副作用
/// Installs the global subscriber; repeated calls are no-ops
pub fn init_tracing(level: &str) {
    LogTracer::init().ok();
    fmt::SubscriberBuilder::default()
        .with_env_filter(build_filter(level))
        .with_timer(LogTimer)
        .compact()
        .with_target(false)
        .try_init()
        .ok();
}
