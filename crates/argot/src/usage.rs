//! Plain-text usage rendering from the application model.

use argot_model::{AppModel, ArgModel, CmdModel, FlagModel};

/// Full usage for the application: summary line, help, flags, args, commands.
pub fn app_usage(model: &AppModel) -> String {
    let mut line = vec![format_args_and_flags(&model.name, &model.flags, &model.args)];
    if !model.commands.is_empty() {
        line.extend(["<command>", "[<flags>]", "[<args> ...]"].map(String::from));
    }

    let mut out = format!("usage: {}\n", line.join(" "));
    if !model.help.trim().is_empty() {
        out.push_str(&format!("\n{}\n", model.help.trim()));
    }
    write_flags(&mut out, &model.flags);
    write_args(&mut out, &model.args);
    write_commands(&mut out, &model.commands);
    out
}

/// Usage for one command, addressed by a space-separated path.
///
/// Returns `None` when the path does not name a declared command.
pub fn command_usage(model: &AppModel, path: &str) -> Option<String> {
    let chain = model.find_command(path)?;
    let mut line = vec![format_args_and_flags(&model.name, &model.flags, &model.args)];
    for cmd in &chain {
        line.push(format_args_and_flags(&cmd.name, &cmd.flags, &cmd.args));
    }
    let cmd = chain.last()?;
    if !cmd.commands.is_empty() {
        line.push("<command> [<args> ...]".to_string());
    }

    let mut out = format!("usage: {}\n", line.join(" "));
    if !cmd.help.trim().is_empty() {
        out.push_str(&format!("\n{}\n", cmd.help.trim()));
    }
    write_flags(&mut out, &cmd.flags);
    write_args(&mut out, &cmd.args);
    write_commands(&mut out, &cmd.commands);
    Some(out)
}

/// `name --required=X [<flags>] <arg> [<opt>]`
pub fn format_args_and_flags(name: &str, flags: &[FlagModel], args: &[ArgModel]) -> String {
    let mut s = vec![name.to_string()];
    s.extend(flag_summary(flags));

    let mut depth = 0;
    for arg in args {
        let mut h = format!("<{}>", arg.name);
        if arg.variadic {
            h.push_str(" ...");
        }
        if !arg.required {
            h.insert(0, '[');
            depth += 1;
        }
        s.push(h);
    }
    if let Some(last) = s.last_mut() {
        last.push_str(&"]".repeat(depth));
    }
    s.join(" ")
}

fn flag_summary(flags: &[FlagModel]) -> Vec<String> {
    let mut out: Vec<String> = flags
        .iter()
        .filter(|f| f.required)
        .map(|f| {
            if f.boolean {
                format!("--{}", f.name)
            } else {
                format!("--{}={}", f.name, f.placeholder)
            }
        })
        .collect();
    if out.len() != flags.len() {
        out.push("[<flags>]".to_string());
    }
    out
}

fn write_rows(out: &mut String, title: &str, rows: Vec<(String, String)>) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {left}\n"));
        } else {
            out.push_str(&format!("  {left:width$}  {help}\n"));
        }
    }
}

fn write_flags(out: &mut String, flags: &[FlagModel]) {
    let rows = flags
        .iter()
        .map(|f| (f.display(), f.help.trim().to_string()))
        .collect();
    write_rows(out, "Flags", rows);
}

fn write_args(out: &mut String, args: &[ArgModel]) {
    let rows = args
        .iter()
        .map(|a| (a.display(), a.help.trim().to_string()))
        .collect();
    write_rows(out, "Args", rows);
}

fn write_commands(out: &mut String, commands: &[CmdModel]) {
    if commands.is_empty() {
        return;
    }
    out.push_str("\nCommands:\n");
    for cmd in commands {
        out.push_str(&format!(
            "  {}\n",
            format_args_and_flags(&cmd.name, &cmd.flags, &cmd.args)
        ));
        for line in cmd.help.trim().lines() {
            out.push_str(&format!("    {line}\n"));
        }
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(name: &str, required: bool, boolean: bool) -> FlagModel {
        FlagModel {
            name: name.to_string(),
            required,
            boolean,
            placeholder: name.to_ascii_uppercase(),
            ..Default::default()
        }
    }

    fn arg(name: &str, required: bool) -> ArgModel {
        ArgModel {
            name: name.to_string(),
            required,
            ..Default::default()
        }
    }

    #[test]
    fn summary_lists_required_flags_then_optional_marker() {
        let flags = vec![flag("name", true, false), flag("debug", false, true)];
        let args = vec![arg("nick", true)];
        assert_eq!(
            format_args_and_flags("register", &flags, &args),
            "register --name=NAME [<flags>] <nick>"
        );
    }

    #[test]
    fn optional_args_nest_brackets_at_the_end() {
        let args = vec![arg("src", true), arg("dst", false), arg("mode", false)];
        assert_eq!(
            format_args_and_flags("cp", &[], &args),
            "cp <src> [<dst> [<mode>]]"
        );
    }

    #[test]
    fn app_usage_lists_sections() {
        let model = AppModel {
            name: "chat".to_string(),
            help: "A chat client.".to_string(),
            flags: vec![flag("debug", false, true)],
            commands: vec![CmdModel {
                name: "post".to_string(),
                help: "Post a message.".to_string(),
                flags: vec![flag("channel", true, false)],
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = app_usage(&model);
        assert!(text.starts_with("usage: chat [<flags>] <command> [<flags>] [<args> ...]\n"));
        assert!(text.contains("\nA chat client.\n"));
        assert!(text.contains("Flags:\n  --debug\n"));
        assert!(text.contains("Commands:\n  post --channel=CHANNEL\n    Post a message.\n"));
    }

    #[test]
    fn command_usage_prefixes_application_line() {
        let model = AppModel {
            name: "chat".to_string(),
            commands: vec![CmdModel {
                name: "register".to_string(),
                help: "Register a new user.".to_string(),
                args: vec![ArgModel {
                    name: "nick".to_string(),
                    help: "Nickname for user.".to_string(),
                    required: true,
                    variadic: false,
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = command_usage(&model, "register").unwrap();
        assert!(text.starts_with("usage: chat register <nick>\n"));
        assert!(text.contains("Args:\n  <nick>  Nickname for user.\n"));
        assert!(command_usage(&model, "missing").is_none());
    }
}
