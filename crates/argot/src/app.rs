//! The root aggregate: top-level flags, arguments and commands.

use std::fmt;
use std::io::Write;

use argot_model::AppModel;

use crate::args::{ArgClause, ArgGroup};
use crate::cmds::{CmdClause, CmdGroup};
use crate::dispatch::{Context, Terminal};
use crate::error::{Error, Result};
use crate::flags::{FlagClause, FlagGroup};
use crate::lexer::{Cursor, tokenize};
use crate::usage;
use crate::value::{Binding, StringValue};

const HELP_COMMAND: &str = "help";

/// Definitions of flags, arguments and commands for one program.
///
/// Declare everything first, then call [`Application::parse`] once.
/// Initialization runs on the first parse (or an explicit [`Application::init`])
/// and validates the whole declaration tree. Declarations made after
/// initialization are rejected, and a second parse fails with
/// [`Error::AlreadyParsed`].
#[derive(Debug)]
pub struct Application {
    name: String,
    help: String,
    version: Option<String>,
    flags: FlagGroup,
    args: ArgGroup,
    commands: CmdGroup,
    initialized: bool,
    parsed: bool,
    late: Option<String>,
    model: AppModel,
    terminal: Terminal,
}

impl Application {
    /// Create an application with a pre-registered `--help` flag.
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        let mut app = Self {
            name: name.into(),
            help: help.into(),
            version: None,
            flags: FlagGroup::default(),
            args: ArgGroup::default(),
            commands: CmdGroup::default(),
            initialized: false,
            parsed: false,
            late: None,
            model: AppModel::default(),
            terminal: Terminal::default(),
        };
        app.flag("help", "Show help.")
            .dispatch(|ctx| {
                ctx.usage()?;
                ctx.terminate(0);
                Ok(())
            })
            .bool();
        app
    }

    /// Add a `--version` flag that prints `version` and terminates.
    pub fn version(&mut self, version: impl Into<String>) -> &mut Self {
        let version = version.into();
        self.version = Some(version.clone());
        self.flag("version", "Show application version.")
            .dispatch(move |ctx| {
                ctx.print(&format!("{version}\n"))?;
                ctx.terminate(0);
                Ok(())
            })
            .bool();
        self
    }

    /// Replace the output and error sinks (stdout and stderr by default).
    pub fn writers(&mut self, out: impl Write + 'static, err: impl Write + 'static) -> &mut Self {
        self.terminal.set_writers(Box::new(out), Box::new(err));
        self
    }

    /// Replace the termination function (`std::process::exit` by default).
    pub fn terminate(&mut self, exit: impl Fn(i32) + 'static) -> &mut Self {
        self.terminal.set_exit(Box::new(exit));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flag(&mut self, name: &str, help: &str) -> &mut FlagClause {
        self.declared(|| format!("flag '--{name}'"));
        self.flags.flag(name, help)
    }

    pub fn arg(&mut self, name: &str, help: &str) -> &mut ArgClause {
        self.declared(|| format!("argument '{name}'"));
        self.args.arg(name, help)
    }

    pub fn command(&mut self, name: &str, help: &str) -> &mut CmdClause {
        self.declared(|| format!("command '{name}'"));
        self.commands.command(name, help)
    }

    /// Remember the first clause declared once the tree is sealed.
    fn declared(&mut self, what: impl FnOnce() -> String) {
        if self.initialized && self.late.is_none() {
            self.late = Some(what());
        }
    }

    /// Validate the declaration tree. Runs once; later calls are no-ops
    /// unless something was declared in between.
    pub fn init(&mut self) -> Result<()> {
        if let Some(what) = &self.late {
            return Err(Error::invalid(format!(
                "{what} declared after initialization"
            )));
        }
        if self.initialized {
            return Ok(());
        }
        if self.commands.have() && self.args.have() {
            return Err(Error::ConflictingGrammar(format!(
                "application '{}'",
                self.name
            )));
        }

        if self.commands.have() {
            if !self.commands.contains(HELP_COMMAND) {
                self.add_help_command();
            }
            self.commands.move_to_front(HELP_COMMAND);
        }

        self.flags.init()?;
        self.commands.init()?;
        self.args.init()?;
        for cmd in self.commands.clauses_mut() {
            cmd.init("")?;
        }

        self.model = AppModel {
            name: self.name.clone(),
            help: self.help.clone(),
            version: self.version.clone(),
            flags: self.flags.model(),
            args: self.args.model(),
            commands: self.commands.model(),
        };
        self.initialized = true;
        tracing::debug!(app = %self.name, "initialized application");
        Ok(())
    }

    fn add_help_command(&mut self) {
        let target: Binding<Option<String>> = Binding::default();
        let bound = target.clone();
        self.commands
            .command(HELP_COMMAND, "Show help for a command.")
            .arg("command", "Command name.")
            .required()
            .dispatch(move |ctx| {
                let path = bound.get().unwrap_or_default();
                ctx.command_usage(&path)?;
                ctx.terminate(0);
                Ok(())
            })
            .value(StringValue(target));
    }

    /// The initialized metadata model.
    pub fn model(&mut self) -> Result<&AppModel> {
        self.init()?;
        Ok(&self.model)
    }

    /// Parse `args` (excluding the program name) against the process
    /// environment. Returns the selected command path, space separated, or an
    /// empty string when no commands are declared.
    pub fn parse<I, S>(&mut self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let env: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        self.parse_with_env(args, &env)
    }

    /// Parse `args` using `env` as the source for `envar`-backed flags.
    pub fn parse_with_env<I, S>(&mut self, args: I, env: &[(String, String)]) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.init()?;
        if self.parsed {
            return Err(Error::AlreadyParsed(self.name.clone()));
        }
        // Bindings are written as parsing goes, so even a failed parse counts.
        self.parsed = true;
        let tokens = tokenize(args);
        let ctx = Context {
            model: &self.model,
            terminal: &self.terminal,
            env,
        };

        let cursor = Cursor::new(&tokens);
        // `help` and `--help` both skip required-flag enforcement.
        let help = cursor.peek().text == HELP_COMMAND;
        let cursor = self.flags.parse(cursor, help, &ctx)?;

        let (selected, cursor) = if self.args.have() {
            (Vec::new(), self.args.parse(cursor, &ctx)?)
        } else if self.commands.have() {
            self.commands.parse(cursor, &ctx)?
        } else {
            (Vec::new(), cursor)
        };

        if !cursor.is_empty() {
            return Err(Error::TrailingArguments(cursor.remaining()));
        }
        let command = selected.join(" ");
        tracing::debug!(command = %command, "parsed command line");
        Ok(command)
    }

    /// Write application usage to the error sink.
    pub fn usage(&mut self) -> Result<()> {
        self.init()?;
        self.terminal.write_err(&usage::app_usage(&self.model))?;
        Ok(())
    }

    /// Write `<name>: error: <err>` to the error sink.
    pub fn error(&self, err: &dyn fmt::Display) {
        let _ = self
            .terminal
            .write_err(&format!("{}: error: {err}\n", self.name));
    }

    /// Write the error followed by usage, then terminate with status 1.
    pub fn usage_error(&mut self, err: &dyn fmt::Display) {
        self.error(err);
        if let Err(usage_err) = self.usage() {
            self.error(&usage_err);
        }
        self.terminal.exit(1);
    }

    /// Terminate with status 1 after writing the error if `result` failed.
    pub fn fatal_if_error<T, E: fmt::Display>(
        &self,
        result: std::result::Result<T, E>,
        prefix: &str,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                if prefix.is_empty() {
                    self.error(&err);
                } else {
                    self.error(&format!("{prefix}: {err}"));
                }
                self.terminal.exit(1);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClauseKind;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Capture(Rc<RefCell<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        out: Capture,
        err: Capture,
        exits: Rc<RefCell<Vec<i32>>>,
    }

    fn harness(app: &mut Application) -> Harness {
        let out = Capture::default();
        let err = Capture::default();
        let exits = Rc::new(RefCell::new(Vec::new()));
        let recorded = exits.clone();
        app.writers(out.clone(), err.clone())
            .terminate(move |code| recorded.borrow_mut().push(code));
        Harness { out, err, exits }
    }

    struct Chat {
        app: Application,
        name: Binding<Option<String>>,
        nick: Binding<Option<String>>,
        channel: Binding<Option<String>>,
    }

    fn chat() -> Chat {
        let mut app = Application::new("chat", "A command-line chat application.");
        app.flag("debug", "Enable debug mode.").bool();
        let register = app.command("register", "Register a new user.");
        let name = register.flag("name", "Name of user.").required().string();
        let nick = register.arg("nick", "Nickname for user.").required().string();
        let post = app.command("post", "Post a message to a channel.");
        let channel = post
            .flag("channel", "Channel to post to.")
            .short('a')
            .required()
            .string();
        post.flag("image", "Image to post.").string();
        Chat {
            app,
            name,
            nick,
            channel,
        }
    }

    #[test]
    fn required_flag_and_argument_bind() {
        let mut app = Application::new("greet", "");
        let name = app.flag("name", "").required().string();
        let nick = app.arg("nick", "").required().string();
        let command = app.parse_with_env(["--name", "Bob", "Alice"], &[]).unwrap();
        assert_eq!(command, "");
        assert_eq!(name.get().as_deref(), Some("Bob"));
        assert_eq!(nick.get().as_deref(), Some("Alice"));
    }

    #[test]
    fn missing_required_flag_is_reported() {
        let mut app = Application::new("greet", "");
        app.flag("name", "").required().string();
        app.arg("nick", "").required().string();
        let err = app.parse_with_env(["Alice"], &[]).unwrap_err();
        match err {
            Error::MissingRequired { kind, name } => {
                assert_eq!(kind, ClauseKind::Flag);
                assert_eq!(name, "--name");
            }
            other => panic!("expected MissingRequired, got: {other:?}"),
        }
    }

    #[test]
    fn command_without_args_rejects_trailing_tokens() {
        let mut chat = chat();
        let err = chat
            .app
            .parse_with_env(["post", "-a", "general", "hello"], &[])
            .unwrap_err();
        assert_eq!(chat.channel.get().as_deref(), Some("general"));
        match err {
            Error::TrailingArguments(rest) => assert_eq!(rest, ["hello"]),
            other => panic!("expected TrailingArguments, got: {other:?}"),
        }
    }

    #[test]
    fn help_command_renders_command_usage_and_terminates() {
        let mut chat = chat();
        let h = harness(&mut chat.app);
        let command = chat.app.parse_with_env(["help", "register"], &[]).unwrap();
        assert_eq!(command, "help");
        assert_eq!(*h.exits.borrow(), [0]);
        let text = h.err.text();
        assert!(
            text.starts_with("usage: chat [<flags>] register --name=NAME <nick>\n"),
            "unexpected usage:\n{text}"
        );
        assert!(text.contains("Register a new user."));
        assert_eq!(chat.nick.get(), None);
        assert_eq!(chat.name.get(), None);
    }

    #[test]
    fn help_command_with_unknown_target() {
        let mut chat = chat();
        let h = harness(&mut chat.app);
        let err = chat.app.parse_with_env(["help", "nope"], &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(ref c) if c == "nope"));
        assert!(h.exits.borrow().is_empty());
    }

    #[test]
    fn help_requested_skips_required_root_flags() {
        let deploy = || {
            let mut app = Application::new("deploy", "");
            app.flag("token", "").required().string();
            let env = app.command("env", "Manage environments.");
            env.arg("name", "").required().string();
            app
        };

        let mut app = deploy();
        let h = harness(&mut app);
        let command = app.parse_with_env(["help", "env"], &[]).unwrap();
        assert_eq!(command, "help");
        assert_eq!(*h.exits.borrow(), [0]);

        let err = deploy().parse_with_env(["env", "prod"], &[]).unwrap_err();
        assert_eq!(err.to_string(), "required flag '--token' not provided");
    }

    #[test]
    fn help_flag_renders_application_usage() {
        let mut chat = chat();
        let h = harness(&mut chat.app);
        // The terminate hook returns here, so parsing goes on to want a command.
        let result = chat.app.parse_with_env(["--help"], &[]);
        assert!(matches!(result, Err(Error::ExpectedCommand(_))));
        assert_eq!(*h.exits.borrow(), [0]);
        let text = h.err.text();
        assert!(text.starts_with("usage: chat [<flags>] <command> [<flags>] [<args> ...]\n"));
        let help_at = text.find("  help <command>").unwrap();
        let register_at = text.find("  register --name=NAME <nick>").unwrap();
        assert!(help_at < register_at, "help command should be listed first");
    }

    #[test]
    fn version_flag_prints_to_output() {
        let mut app = Application::new("chat", "");
        app.version("1.2.3");
        let h = harness(&mut app);
        app.parse_with_env(["--version"], &[]).unwrap();
        assert_eq!(h.out.text(), "1.2.3\n");
        assert_eq!(*h.exits.borrow(), [0]);
        assert_eq!(app.model().unwrap().version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn unknown_flag_is_named() {
        let mut chat = chat();
        let err = chat.app.parse_with_env(["-x"], &[]).unwrap_err();
        assert_eq!(err.to_string(), "unknown flag '-x'");
    }

    #[test]
    fn init_is_idempotent() {
        let mut chat = chat();
        chat.app.init().unwrap();
        chat.app.init().unwrap();
        let names: Vec<String> = chat
            .app
            .model()
            .unwrap()
            .commands
            .iter()
            .map(|c| c.name.clone())
            .collect();
        assert_eq!(names, ["help", "register", "post"]);

        let command = chat
            .app
            .parse_with_env(["register", "--name", "Bob", "bobby"], &[])
            .unwrap();
        assert_eq!(command, "register");
        assert_eq!(chat.nick.get().as_deref(), Some("bobby"));
    }

    #[test]
    fn arguments_and_commands_conflict_at_root() {
        let mut app = Application::new("mixed", "");
        app.arg("file", "").string();
        app.command("run", "");
        let err = app.init().unwrap_err();
        assert_eq!(
            err.to_string(),
            "application 'mixed' declares both positional arguments and commands"
        );
    }

    #[test]
    fn invalid_argument_order_fails_before_parsing() {
        let mut app = Application::new("cp", "");
        app.arg("dst", "").string();
        app.arg("src", "").required().string();
        assert!(matches!(app.init(), Err(Error::InvalidDeclaration(_))));

        let mut app = Application::new("cp", "");
        let run = app.command("run", "");
        run.arg("argv", "").strings();
        run.arg("extra", "").string();
        assert!(matches!(app.init(), Err(Error::InvalidDeclaration(_))));
    }

    #[test]
    fn defaults_round_trip_when_absent() {
        let mut app = Application::new("serve", "");
        let addr = app.flag("addr", "").default("0.0.0.0:8080").string();
        let verbose = app.flag("verbose", "").default("true").bool();
        app.parse_with_env(Vec::<String>::new(), &[]).unwrap();
        assert_eq!(addr.get().as_deref(), Some("0.0.0.0:8080"));
        assert!(verbose.get());
    }

    fn record(
        log: &Rc<RefCell<Vec<&'static str>>>,
        what: &'static str,
    ) -> impl FnMut(&Context<'_>) -> Result<()> + 'static {
        let log = log.clone();
        move |_| {
            log.borrow_mut().push(what);
            Ok(())
        }
    }

    #[test]
    fn hooks_fire_in_resolution_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut app = Application::new("ops", "");
        app.flag("verbose", "").dispatch(record(&log, "--verbose")).bool();
        let deploy = app.command("deploy", "");
        deploy.dispatch(record(&log, "deploy"));
        deploy.flag("force", "").dispatch(record(&log, "--force")).bool();
        deploy.arg("target", "").dispatch(record(&log, "<target>")).string();

        let command = app
            .parse_with_env(["--verbose", "deploy", "--force", "prod"], &[])
            .unwrap();
        assert_eq!(command, "deploy");
        assert_eq!(*log.borrow(), ["--verbose", "--force", "<target>", "deploy"]);
    }

    #[test]
    fn envar_flags_read_explicit_environment() {
        let mut app = Application::new("chat", "");
        let server = app
            .flag("server", "")
            .envar("CHAT_SERVER")
            .default("localhost")
            .string();
        let env = vec![("CHAT_SERVER".to_string(), "chat.example:4242".to_string())];
        app.parse_with_env(Vec::<String>::new(), &env).unwrap();
        assert_eq!(server.get().as_deref(), Some("chat.example:4242"));
    }

    #[test]
    fn usage_error_writes_message_usage_and_exits() {
        let mut chat = chat();
        let h = harness(&mut chat.app);
        let err = chat.app.parse_with_env(["-x"], &[]).unwrap_err();
        chat.app.usage_error(&err);
        let text = h.err.text();
        assert!(text.starts_with("chat: error: unknown flag '-x'\nusage: chat"));
        assert_eq!(*h.exits.borrow(), [1]);
    }

    #[test]
    fn fatal_if_error_passes_values_through() {
        let mut app = Application::new("tool", "");
        let h = harness(&mut app);
        assert_eq!(app.fatal_if_error(Ok::<_, Error>(7), "load"), Some(7));
        assert!(h.exits.borrow().is_empty());

        let failed: std::result::Result<(), String> = Err("disk full".to_string());
        assert_eq!(app.fatal_if_error(failed, "save"), None);
        assert_eq!(h.err.text(), "tool: error: save: disk full\n");
        assert_eq!(*h.exits.borrow(), [1]);
    }

    #[test]
    fn hook_error_stops_parsing() {
        let mut app = Application::new("tool", "");
        app.flag("boom", "")
            .dispatch(|_| Err(Error::hook("connection refused")))
            .bool();
        let after = app.flag("after", "").bool();
        let err = app.parse_with_env(["--boom", "--after"], &[]).unwrap_err();
        assert!(matches!(err, Error::Hook(_)), "got: {err:?}");
        assert_eq!(err.to_string(), "connection refused");
        assert!(!after.get());
    }

    #[test]
    fn second_parse_is_rejected() {
        let mut app = Application::new("tool", "");
        let tags = app.flag("tag", "").strings();
        let image = app.flag("image", "").string();
        app.parse_with_env(["--tag", "a", "--image", "x"], &[]).unwrap();

        let err = app.parse_with_env(["--tag", "b"], &[]).unwrap_err();
        assert!(matches!(err, Error::AlreadyParsed(ref name) if name == "tool"));
        assert_eq!(tags.get(), ["a"]);
        assert_eq!(image.get().as_deref(), Some("x"));
    }

    #[test]
    fn failed_parse_also_counts() {
        let mut app = Application::new("tool", "");
        app.flag("name", "").required().string();
        assert!(app.parse_with_env(Vec::<String>::new(), &[]).is_err());
        let err = app.parse_with_env(["--name", "x"], &[]).unwrap_err();
        assert!(matches!(err, Error::AlreadyParsed(_)));
    }

    #[test]
    fn declarations_after_init_are_rejected() {
        let mut app = Application::new("tool", "");
        app.flag("early", "").bool();
        app.init().unwrap();
        app.flag("late", "").bool();
        app.arg("file", "").string();

        let err = app.parse_with_env(["--late"], &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidDeclaration(_)), "got: {err:?}");
        assert_eq!(
            err.to_string(),
            "invalid declaration: flag '--late' declared after initialization"
        );
        assert!(app.model().is_err());
    }

    #[test]
    fn command_declared_after_init_is_rejected() {
        let mut chat = chat();
        chat.app.init().unwrap();
        chat.app.command("join", "Join a channel.");
        let err = chat.app.init().unwrap_err();
        assert!(err.to_string().contains("command 'join' declared after initialization"));
    }
}
