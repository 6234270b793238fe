//! # 管理命令行 / Admin CLI
//!
//! 每个功能区实现 `CommandModule` 注册自己的子命令，
//! 注册器由 `main` 显式构建
//! Each feature area implements `CommandModule` to register its subcommands; the
//! registry is built explicitly by `main`

mod archive;
mod features;
mod status;

pub use archive::{ArchiveCommands, EditCommands, NoteCommands};
pub use features::FeatureCommands;
pub use status::StatusCommands;

use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use std::io::Write;

use crate::context::Ghostgram;

/// 命令模块 trait，各功能区实现此 trait 来注册命令
pub trait CommandModule {
    /// 获取模块名称
    fn module_name(&self) -> &'static str;

    /// 注册模块的子命令
    fn register_commands(&self) -> Vec<Command>;

    /// 处理模块命令
    fn handle_command(
        &self,
        app: &Ghostgram,
        command_name: &str,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<()>;
}

/// 命令注册器
pub struct CommandRegistry {
    modules: Vec<Box<dyn CommandModule>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// 注册所有内置模块 / Register every built-in module
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_module(Box::new(StatusCommands));
        registry.register_module(Box::new(FeatureCommands));
        registry.register_module(Box::new(ArchiveCommands));
        registry.register_module(Box::new(EditCommands));
        registry.register_module(Box::new(NoteCommands));
        registry
    }

    /// 注册模块
    pub fn register_module(&mut self, module: Box<dyn CommandModule>) {
        self.modules.push(module);
    }

    /// 获取所有注册的模块名称
    pub fn registered_modules(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.module_name()).collect()
    }

    /// 构建完整的命令行应用
    pub fn build_app(&self) -> Command {
        let mut app = Command::new("ghostgram")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Ghostgram 本地设置与防撤回归档管理工具")
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("额外的配置文件")
                    .global(true),
            );

        for module in &self.modules {
            for command in module.register_commands() {
                app = app.subcommand(command);
            }
        }
        app
    }

    /// 处理命令
    pub fn handle(&self, app: &Ghostgram, matches: &ArgMatches, out: &mut dyn Write) -> Result<()> {
        let (command_name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| anyhow!("未知命令，请使用 --help 查看可用命令"))?;

        // 查找对应的模块来处理命令
        for module in &self.modules {
            if module
                .register_commands()
                .iter()
                .any(|c| c.get_name() == command_name)
            {
                return module.handle_command(app, command_name, sub_matches, out);
            }
        }
        Err(anyhow!("未找到处理命令 '{}' 的模块", command_name))
    }
}
