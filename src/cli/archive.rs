use anyhow::{anyhow, Result};
use chrono::DateTime;
use clap::{value_parser, Arg, ArgMatches, Command};
use std::io::Write;

use super::CommandModule;
use crate::context::Ghostgram;

fn peer_arg() -> Arg {
    Arg::new("peer")
        .value_name("PEER")
        .help("会话编号")
        .value_parser(value_parser!(i64))
        .allow_negative_numbers(true)
}

fn message_arg() -> Arg {
    Arg::new("message")
        .value_name("MSG")
        .help("消息编号")
        .value_parser(value_parser!(i32))
        .allow_negative_numbers(true)
}

fn format_secs(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn unknown(command_name: &str, matches: &ArgMatches) -> anyhow::Error {
    anyhow!(
        "未知命令: {} {}",
        command_name,
        matches.subcommand_name().unwrap_or("")
    )
}

// ============================================================================
// 归档 / Archive
// ============================================================================

/// 删除归档命令处理器
pub struct ArchiveCommands;

impl CommandModule for ArchiveCommands {
    fn module_name(&self) -> &'static str {
        "archive"
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![Command::new("archive")
            .about("查看或清理已删除消息归档")
            .subcommand_required(true)
            .subcommand(
                Command::new("list").about("列出归档").arg(
                    Arg::new("peer")
                        .long("peer")
                        .value_name("ID")
                        .help("只显示指定会话")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true),
                ),
            )
            .subcommand(
                Command::new("remove").about("删除一条归档").arg(
                    Arg::new("global_id")
                        .value_name("GLOBAL_ID")
                        .required(true)
                        .value_parser(value_parser!(i32)),
                ),
            )
            .subcommand(Command::new("clear").about("清空归档"))]
    }

    fn handle_command(
        &self,
        app: &Ghostgram,
        command_name: &str,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<()> {
        match matches.subcommand() {
            Some(("list", sub)) => {
                let messages = match sub.get_one::<i64>("peer") {
                    Some(peer_id) => app.archive.archived_for_peer(*peer_id),
                    None => app.archive.all_archived(),
                };
                if messages.is_empty() {
                    writeln!(out, "（空）")?;
                }
                for m in messages {
                    write!(
                        out,
                        "#{} {} 删除于 {}",
                        m.global_id,
                        m.key(),
                        format_secs(i64::from(m.deleted_at))
                    )?;
                    if let Some(author_id) = m.author_id {
                        write!(out, " 作者 {}", author_id)?;
                    }
                    if let Some(media) = &m.media_description {
                        write!(out, " [{}]", media)?;
                    }
                    writeln!(out, ": {}", m.text)?;
                }
            }
            Some(("remove", sub)) => {
                let global_id = *sub
                    .get_one::<i32>("global_id")
                    .ok_or_else(|| anyhow!("缺少 GLOBAL_ID"))?;
                if app.archive.remove(global_id) {
                    writeln!(out, "✅ 已删除 #{}", global_id)?;
                } else {
                    writeln!(out, "⚠️ 未找到 #{}", global_id)?;
                }
            }
            Some(("clear", _)) => {
                app.archive.clear();
                writeln!(out, "🧹 归档已清空")?;
            }
            _ => return Err(unknown(command_name, matches)),
        }
        Ok(())
    }
}

// ============================================================================
// 编辑历史 / Edit History
// ============================================================================

/// 编辑历史命令处理器
pub struct EditCommands;

impl CommandModule for EditCommands {
    fn module_name(&self) -> &'static str {
        "edits"
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![Command::new("edits")
            .about("查看或清理编辑历史")
            .subcommand_required(true)
            .subcommand(
                Command::new("show")
                    .about("显示一条消息的历史版本")
                    .arg(peer_arg().required(true))
                    .arg(message_arg().required(true)),
            )
            .subcommand(
                Command::new("clear")
                    .about("清除一条消息的历史，省略参数时清除全部")
                    .arg(peer_arg().requires("message"))
                    .arg(message_arg().requires("peer")),
            )]
    }

    fn handle_command(
        &self,
        app: &Ghostgram,
        command_name: &str,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<()> {
        match matches.subcommand() {
            Some(("show", sub)) => {
                let (peer_id, message_id) = target(sub)?;
                let history = app.edit_history.history(peer_id, message_id);
                if history.is_empty() {
                    writeln!(out, "（无历史）")?;
                }
                for (index, record) in history.iter().enumerate() {
                    writeln!(
                        out,
                        "{}. [{}] {}",
                        index + 1,
                        format_secs(i64::from(record.edit_date)),
                        record.text
                    )?;
                }
            }
            Some(("clear", sub)) => {
                if sub.contains_id("peer") {
                    let (peer_id, message_id) = target(sub)?;
                    app.edit_history.clear(peer_id, message_id);
                    writeln!(out, "🧹 已清除 {}_{} 的历史", peer_id, message_id)?;
                } else {
                    app.edit_history.clear_all();
                    writeln!(out, "🧹 已清除全部编辑历史")?;
                }
            }
            _ => return Err(unknown(command_name, matches)),
        }
        Ok(())
    }
}

fn target(matches: &ArgMatches) -> Result<(i64, i32)> {
    let peer_id = matches
        .get_one::<i64>("peer")
        .ok_or_else(|| anyhow!("缺少 PEER"))?;
    let message_id = matches
        .get_one::<i32>("message")
        .ok_or_else(|| anyhow!("缺少 MSG"))?;
    Ok((*peer_id, *message_id))
}

// ============================================================================
// 用户备注 / User Notes
// ============================================================================

/// 用户备注命令处理器
pub struct NoteCommands;

impl CommandModule for NoteCommands {
    fn module_name(&self) -> &'static str {
        "notes"
    }

    fn register_commands(&self) -> Vec<Command> {
        vec![Command::new("notes")
            .about("查看用户备注")
            .subcommand_required(true)
            .subcommand(Command::new("list").about("列出全部备注"))]
    }

    fn handle_command(
        &self,
        app: &Ghostgram,
        command_name: &str,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<()> {
        match matches.subcommand() {
            Some(("list", _)) => {
                let mut peers = app.user_notes.all_noted_peer_ids();
                peers.sort_unstable();
                if peers.is_empty() {
                    writeln!(out, "（空）")?;
                }
                for peer_id in peers {
                    let note = app.user_notes.note(peer_id).unwrap_or_default();
                    match app.user_notes.updated_at(peer_id) {
                        Some(at) => writeln!(
                            out,
                            "{} [{}]: {}",
                            peer_id,
                            at.format("%Y-%m-%d %H:%M:%S"),
                            note
                        )?,
                        None => writeln!(out, "{}: {}", peer_id, note)?,
                    }
                }
            }
            _ => return Err(unknown(command_name, matches)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antidelete::ArchivedMessage;
    use crate::cli::CommandRegistry;

    fn run(app: &Ghostgram, args: &[&str]) -> Result<String> {
        let registry = CommandRegistry::with_builtin();
        let matches = registry
            .build_app()
            .try_get_matches_from(std::iter::once("ghostgram").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        registry.handle(app, &matches, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn seeded() -> Ghostgram {
        let app = Ghostgram::in_memory();
        app.archive
            .archive(ArchivedMessage::captured_now(1, -100, 5, 10, "first").with_deleted_at(100));
        app.archive
            .archive(ArchivedMessage::captured_now(2, 200, 6, 10, "second").with_deleted_at(200));
        app
    }

    #[test]
    fn archive_list_filters_by_negative_peer() {
        let app = seeded();
        let all = run(&app, &["archive", "list"]).unwrap();
        assert!(all.find("#2").unwrap() < all.find("#1").unwrap());

        let peer = run(&app, &["archive", "list", "--peer", "-100"]).unwrap();
        assert!(peer.contains("-100_5"));
        assert!(!peer.contains("#2"));
    }

    #[test]
    fn archive_remove_and_clear() {
        let app = seeded();
        assert!(run(&app, &["archive", "remove", "1"]).unwrap().contains("✅"));
        assert!(run(&app, &["archive", "remove", "1"]).unwrap().contains("⚠️"));
        run(&app, &["archive", "clear"]).unwrap();
        assert_eq!(app.archive.count(), 0);
    }

    #[test]
    fn edits_show_and_clear() {
        let app = Ghostgram::in_memory();
        app.edit_history.record_original(-7, 3, "v1", 1);
        app.edit_history.record_original(-7, 3, "v2", 2);
        app.edit_history.record_original(8, 1, "x", 1);

        let shown = run(&app, &["edits", "show", "-7", "3"]).unwrap();
        assert!(shown.contains("1. ") && shown.contains("v1"));
        assert!(shown.contains("2. ") && shown.contains("v2"));

        run(&app, &["edits", "clear", "-7", "3"]).unwrap();
        assert!(!app.edit_history.has_history(-7, 3));
        assert!(app.edit_history.has_history(8, 1));

        run(&app, &["edits", "clear"]).unwrap();
        assert_eq!(app.edit_history.message_count(), 0);
    }

    #[test]
    fn edits_clear_needs_both_ids() {
        let app = Ghostgram::in_memory();
        assert!(run(&app, &["edits", "clear", "5"]).is_err());
    }

    #[test]
    fn notes_list() {
        let app = Ghostgram::in_memory();
        assert!(run(&app, &["notes", "list"]).unwrap().contains("（空）"));
        app.user_notes.set_note(42, Some("friend from school"));
        let listed = run(&app, &["notes", "list"]).unwrap();
        assert!(listed.contains("42"));
        assert!(listed.contains("friend from school"));
    }
}
