use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::io::Write;

use super::CommandModule;
use crate::context::Ghostgram;

/// 状态命令处理器
pub struct StatusCommands;

impl CommandModule for StatusCommands {
    fn module_name(&self) -> &'static str {
        "status"
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![Command::new("status").about("显示各功能区状态").arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("输出格式 (json|text)")
                .value_parser(["text", "json"])
                .default_value("text"),
        )]
    }

    fn handle_command(
        &self,
        app: &Ghostgram,
        command_name: &str,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<()> {
        if command_name != "status" {
            return Err(anyhow!("未知命令: {}", command_name));
        }

        let status = app.status();
        let format = matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text");
        if format == "json" {
            writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
            return Ok(());
        }

        let on_off = |b: bool| if b { "开启" } else { "关闭" };
        writeln!(
            out,
            "👻 隐身模式: {} ({}/{})",
            on_off(status.ghost_mode.enabled),
            status.ghost_mode.active_features,
            status.ghost_mode.total_features
        )?;
        writeln!(
            out,
            "🔓 杂项: {} ({}/{})",
            on_off(status.misc.enabled),
            status.misc.active_features,
            status.misc.total_features
        )?;
        writeln!(
            out,
            "📱 设备伪装: {} ({})",
            on_off(status.device_spoof_enabled),
            status.device_profile.unwrap_or("-")
        )?;
        writeln!(out, "🎙️ 变声: {}", status.voice_preset)?;
        writeln!(
            out,
            "🗑️ 防撤回: {} (归档 {} 条, 删除标记 {} 条)",
            on_off(status.anti_delete_enabled),
            status.archived_messages,
            status.deleted_markers
        )?;
        writeln!(out, "📝 编辑历史: {} 条消息", status.edited_messages)?;
        writeln!(out, "🗒️ 用户备注: {} 条", status.user_notes)?;
        Ok(())
    }
}
