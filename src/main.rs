use anyhow::Result;
use clap::ArgMatches;
use std::io::Write;
use tracing::{debug, error};

use ghostgram::cli::CommandRegistry;
use ghostgram::comm::{init_tracing, GhostConfig};
use ghostgram::Ghostgram;

fn main() {
    if let Err(e) = run() {
        eprintln!("错误: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let registry = CommandRegistry::with_builtin();
    let matches = match registry.build_app().try_get_matches() {
        Ok(matches) => matches,
        // --help / --version
        Err(e) if !e.use_stderr() => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            e.print()?;
            std::process::exit(1);
        }
    };

    // 加载配置（默认文件 -> local.toml -> 环境变量 -> --config）
    let config = GhostConfig::load(matches.get_one::<String>("config").map(String::as_str))?;
    init_tracing(&config.logging.level);
    debug!("⚙️  配置已加载: {:?}", config);

    // 日志已就绪，之后的失败同时写入日志
    dispatch(&registry, &matches, &config)
        .inspect_err(|e| error!("❌ 命令执行失败: {:#}", e))
}

fn dispatch(registry: &CommandRegistry, matches: &ArgMatches, config: &GhostConfig) -> Result<()> {
    let app = Ghostgram::open(&config.storage)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    registry.handle(&app, matches, &mut out)?;
    out.flush()?;

    app.flush()?;
    Ok(())
}
