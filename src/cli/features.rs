use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::io::Write;

use super::CommandModule;
use crate::context::Ghostgram;

/// 隐身模式与杂项开关命令处理器
pub struct FeatureCommands;

fn toggle_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .subcommand_required(true)
        .subcommand(Command::new("enable-all").about("开启全部功能"))
        .subcommand(Command::new("disable-all").about("关闭全部功能"))
}

impl CommandModule for FeatureCommands {
    fn module_name(&self) -> &'static str {
        "features"
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![
            toggle_command("ghost", "隐身模式批量开关"),
            toggle_command("misc", "杂项功能批量开关"),
        ]
    }

    fn handle_command(
        &self,
        app: &Ghostgram,
        command_name: &str,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<()> {
        let action = matches
            .subcommand_name()
            .ok_or_else(|| anyhow!("缺少子命令: {}", command_name))?;

        match (command_name, action) {
            ("ghost", "enable-all") => app.ghost_mode.enable_all(),
            ("ghost", "disable-all") => app.ghost_mode.disable_all(),
            ("misc", "enable-all") => app.misc.enable_all(),
            ("misc", "disable-all") => app.misc.disable_all(),
            _ => return Err(anyhow!("未知命令: {} {}", command_name, action)),
        }
        writeln!(out, "✅ {} {}", command_name, action)?;
        Ok(())
    }
}
