use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use askfast::config::Settings;
use askfast::consts::DEFAULT_LOG_FILTER;
use askfast::dialog::DialogState;
use askfast::fetch::{HttpClient, Method, parse_header};
use askfast::script::ScriptRegistry;
use askfast::server::{self, AppState};

#[derive(Parser)]
#[command(name = "askfast", version, about = "Ask one question, follow the answer.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Serve dialog scripts over HTTP (the default)
    Serve(ServeArgs),
    /// Send an HTTP request and print the response body
    Fetch {
        /// GET, POST, PUT, DELETE or POST-FORM
        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        url: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body for POST and PUT
        #[arg(short, long)]
        data: Option<String>,
    },
    /// Print the rendered payload of a script step without serving it
    Render {
        script: String,

        /// Step to render (defaults to the entry step)
        step: Option<String>,

        #[command(flatten)]
        settings: ServeArgs,
    },
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Public URL the dialog platform reaches this server on
    #[arg(long)]
    host: Option<String>,

    /// Address to listen on
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Directory of additional *.json dialog scripts
    #[arg(short, long)]
    scripts: Option<PathBuf>,
}

impl ServeArgs {
    fn settings(self) -> Result<Settings> {
        Ok(Settings::from_env()?.with_overrides(self.host, self.bind, self.scripts))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => {
            let settings = args.settings()?;
            let scripts = load_scripts(&settings)?;
            let bind = settings.bind;
            server::serve(AppState::new(scripts, settings), bind).await
        }
        Command::Fetch {
            method,
            url,
            headers,
            data,
        } => {
            let headers = headers
                .iter()
                .map(|line| parse_header(line))
                .collect::<Result<Vec<_>>>()?;
            let body = HttpClient::new()
                .fetch(method, &url, data.as_deref(), &headers)
                .await?;
            println!("{body}");
            Ok(())
        }
        Command::Render {
            script,
            step,
            settings,
        } => {
            let settings = settings.settings()?;
            let scripts = load_scripts(&settings)?;
            let script = scripts
                .get(&script)
                .with_context(|| format!("unknown dialog script: {script}"))?;

            let mut dialog = DialogState::new(settings.dialog_url(&script.name));
            let payload = match step {
                Some(step) => script.run(&step, &mut dialog)?,
                None => script.start(&mut dialog)?,
            };
            println!("{payload}");
            Ok(())
        }
    }
}

fn load_scripts(settings: &Settings) -> Result<ScriptRegistry> {
    let mut scripts = ScriptRegistry::with_builtin()?;
    if let Some(dir) = &settings.scripts_dir {
        scripts.load_dir(dir)?;
    }
    Ok(scripts)
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
