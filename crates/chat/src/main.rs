use std::fmt;

use anyhow::Result;
use argot::{Application, Binding, Error, Value};
use tracing_subscriber::{EnvFilter, fmt as log_fmt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        })
    }
}

struct PriorityValue(Binding<Priority>);

impl Value for PriorityValue {
    fn from_text(&mut self, raw: &str) -> std::result::Result<(), String> {
        let priority = match raw {
            "low" => Priority::Low,
            "normal" => Priority::Normal,
            "high" => Priority::High,
            _ => return Err("expected one of low, normal, high".to_string()),
        };
        self.0.set(priority);
        Ok(())
    }

    fn placeholder_text(&self) -> String {
        "low|normal|high".to_string()
    }
}

struct Chat {
    app: Application,
    debug: Binding<bool>,
    server: Binding<Option<String>>,
    name: Binding<Option<String>>,
    nick: Binding<Option<String>>,
    channel: Binding<Option<String>>,
    image: Binding<Option<String>>,
    priority: Binding<Priority>,
    text: Binding<Vec<String>>,
}

fn build() -> Chat {
    let mut app = Application::new("chat", "A command-line chat application.");
    app.version(env!("CARGO_PKG_VERSION"));

    let debug = app.flag("debug", "Enable debug mode.").bool();
    let server = app
        .flag("server", "Server address.")
        .envar("CHAT_SERVER")
        .default("127.0.0.1:6667")
        .placeholder("HOST:PORT")
        .string();
    app.flag("dump-model", "Print the command-line model as JSON.")
        .dispatch(|ctx| {
            let json = ctx.model().to_json_pretty().map_err(Error::hook)?;
            ctx.print(&format!("{json}\n"))?;
            ctx.terminate(0);
            Ok(())
        })
        .bool();

    let register = app.command("register", "Register a new user.");
    let name = register.flag("name", "Name of user.").required().string();
    let nick = register.arg("nick", "Nickname for user.").required().string();

    let post = app.command("post", "Post a message to a channel.");
    let channel = post
        .flag("channel", "Channel to post to.")
        .short('a')
        .required()
        .string();
    let image = post.flag("image", "Image to post.").string();
    let priority = Binding::default();
    post.flag("priority", "Message priority.")
        .value(PriorityValue(priority.clone()));
    let text = post.arg("text", "Text to post.").required().strings();

    Chat {
        app,
        debug,
        server,
        name,
        nick,
        channel,
        image,
        priority,
        text,
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut chat = build();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match chat.app.parse(&args) {
        Ok(command) => command,
        Err(err) => {
            chat.app.usage_error(&err);
            return Ok(());
        }
    };
    tracing::debug!(command = %command, "resolved command");

    if chat.debug.get() {
        let server = chat.server.get().unwrap_or_default();
        eprintln!("connecting to {server}");
    }

    match command.as_str() {
        "register" => {
            let name = chat.name.get().unwrap_or_default();
            let nick = chat.nick.get().unwrap_or_default();
            println!("registered {nick} ({name})");
        }
        "post" => {
            let channel = chat.channel.get().unwrap_or_default();
            let text = chat.text.get().join(" ");
            println!("[{channel}] ({}) {text}", chat.priority.get());
            if let Some(image) = chat.image.get() {
                println!("[{channel}] attached {image}");
            }
        }
        _ => {}
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    log_fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
