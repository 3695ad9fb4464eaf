//! Pitchcraft CLI
//!
//! Generates, browses and manages startup pitches from the terminal.

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use pitchcraft::{
    config::{self, Overrides},
    error::{AppError, Result},
    models::{BackendKind, Config, Pitch, PitchId},
    pipeline::{self, PitchGenerator, PitchQuery, SortOrder},
    services::{AuthClient, GeminiClient, SignUpOutcome},
    storage::{LocalStore, PitchStore, SupabaseStore},
    utils::{console, truncate},
};

/// Owner id used by the local backend, which has no accounts.
const LOCAL_USER: &str = "local";

/// Pitchcraft - AI startup pitch generator
#[derive(Parser, Debug)]
#[command(
    name = "pitchcraft",
    version,
    about = "Turn startup ideas into pitches and landing pages"
)]
struct Cli {
    /// Path to config file (default: {data_dir}/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the session, local pitches and previews
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account
    Signup {
        email: String,

        #[arg(long, env = "PITCHCRAFT_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Where the confirmation link should lead
        #[arg(long)]
        redirect_to: Option<String>,
    },

    /// Sign in with email and password
    Login {
        email: String,

        #[arg(long, env = "PITCHCRAFT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Generate a pitch (and landing page) from an idea and save it
    Generate {
        /// The startup idea, in plain words
        #[arg(required = true, num_args = 1..)]
        idea: Vec<String>,

        /// Skip landing page generation
        #[arg(long)]
        no_landing: bool,
    },

    /// List saved pitches
    List {
        /// Case-insensitive text to look for in name, tagline or industry
        #[arg(long)]
        search: Option<String>,

        /// Only this industry
        #[arg(long)]
        industry: Option<String>,

        /// newest, oldest or name
        #[arg(long, default_value_t = SortOrder::Newest)]
        sort: SortOrder,
    },

    /// List the industries of saved pitches
    Industries,

    /// Print one pitch in full
    Show { id: String },

    /// Write a pitch's landing page to an HTML file
    Preview {
        id: String,

        /// Output file (default: {data_dir}/previews/{id}.html)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete a pitch
    Delete {
        id: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },

    /// Validate configuration
    Validate,

    /// Check the API key and backend settings against the live services
    Doctor,
}

/// Initialize logging from the effective configuration.
fn init_logging(config: &Config, quiet: bool) {
    let filter = config::log_filter(config, quiet);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            console::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let base_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("storage"));
    let config_path = config::config_path(cli.config.as_deref(), &base_dir);
    let overrides = Overrides {
        data_dir: cli.data_dir.clone(),
        log_level: cli.verbose.then(|| "debug".to_string()),
    };
    let strict = matches!(cli.command, Command::Validate | Command::Doctor);

    // The logger needs the config, so a malformed file is reported after
    // falling back to defaults.
    let (config, load_error) = match config::load_effective(&config_path, &overrides, true) {
        Ok(config) => (config, None),
        Err(e) if !strict => (config::load_effective(&config_path, &overrides, false)?, Some(e)),
        Err(e) => return Err(e),
    };
    init_logging(&config, cli.quiet);
    console::init(&config.logging.level, cli.quiet);
    if let Some(e) = load_error {
        log::warn!(
            "Could not load {}: {}. Using defaults.",
            config_path.display(),
            e
        );
    }

    log::debug!(
        "Using {} (data dir {}, backend {:?})",
        config_path.display(),
        config.paths.data_dir.display(),
        config.backend.kind
    );

    match cli.command {
        Command::Signup {
            email,
            password,
            redirect_to,
        } => {
            let auth = auth_client(&config).await?;
            let password = password_or_prompt(password)?;
            match auth
                .sign_up(&email, &password, redirect_to.as_deref())
                .await?
            {
                SignUpOutcome::SignedIn(session) => {
                    console::success(&format!(
                        "Account created, signed in as {}",
                        email_of(&session.user.email, &email)
                    ));
                }
                SignUpOutcome::ConfirmationRequired { email } => {
                    console::success(&format!(
                        "Check {email} for a confirmation link, then run `pitchcraft login`"
                    ));
                }
            }
        }

        Command::Login { email, password } => {
            let auth = auth_client(&config).await?;
            let password = password_or_prompt(password)?;
            let session = auth.sign_in_with_password(&email, &password).await?;
            console::success(&format!(
                "Signed in as {} (session valid until {})",
                email_of(&session.user.email, &email),
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            ));
        }

        Command::Logout => {
            let auth = auth_client(&config).await?;
            if auth.session().is_none() {
                console::info("Not signed in.");
                return Ok(());
            }
            auth.sign_out().await?;
            console::success("Signed out");
        }

        Command::Whoami => {
            let auth = auth_client(&config).await?;
            let session = auth.require_session().await?;
            let user = auth.user(&session).await?;
            console::summary(
                "Signed-in user",
                &[
                    ("Email", user.email.unwrap_or_else(|| "-".into())),
                    ("User id", user.id),
                    (
                        "Session expires",
                        session.expires_at.format("%Y-%m-%d %H:%M UTC").to_string(),
                    ),
                ],
            );
        }

        Command::Generate { idea, no_landing } => {
            let idea = idea.join(" ");
            let (store, user_id) = open_store(&config).await?;
            let client = GeminiClient::new(&config)?;
            log::debug!("Generating with model {}", client.model());
            let generator = PitchGenerator::new(client);

            let pitch =
                pipeline::run_generate(&generator, store.as_ref(), &user_id, &idea, !no_landing)
                    .await?;
            print_pitch(&pitch);
            if pitch.landing_code.is_some() {
                console::info(&format!(
                    "Run `pitchcraft preview {}` to write the landing page",
                    pitch.id
                ));
            }
        }

        Command::List {
            search,
            industry,
            sort,
        } => {
            let (store, user_id) = open_store(&config).await?;
            let pitches = store.list(&user_id).await?;
            let query = PitchQuery {
                search,
                industry,
                sort,
            };
            let (shown, summary) = query.apply(&pitches);

            console::header("Saved Pitches");
            for pitch in &shown {
                console::sub_item(&format!(
                    "{}  {} - {} [{}] {}",
                    pitch.id,
                    pitch.display_name(),
                    truncate(&pitch.generated_data.tagline, 60),
                    pitch.industry_label(),
                    pitch.created_at.format("%Y-%m-%d")
                ));
            }
            console::separator();
            console::info(&summary.to_string());
        }

        Command::Industries => {
            let (store, user_id) = open_store(&config).await?;
            let pitches = store.list(&user_id).await?;
            let industries = pipeline::industries(&pitches);
            if industries.is_empty() {
                console::info("No industries yet.");
            }
            for industry in industries {
                console::sub_item(&industry);
            }
        }

        Command::Show { id } => {
            let (store, user_id) = open_store(&config).await?;
            let pitch = store.get(&user_id, &PitchId::from(id.as_str())).await?;
            print_pitch(&pitch);
        }

        Command::Preview { id, out } => {
            let (store, user_id) = open_store(&config).await?;
            let pitch = store.get(&user_id, &PitchId::from(id.as_str())).await?;

            let html = match pitch.landing_code.as_deref().filter(|h| !h.trim().is_empty()) {
                Some(html) => html.to_string(),
                None => {
                    console::warn("This pitch has no landing page; using the built-in template");
                    pipeline::fallback_template(&pitch.generated_data)
                }
            };

            let path = out.unwrap_or_else(|| {
                config
                    .paths
                    .previews_dir()
                    .join(format!("{}.html", file_stem(&pitch.id)))
            });
            write_file(&path, html.as_bytes()).await?;
            console::success(&format!("Landing page written to {}", path.display()));
        }

        Command::Delete { id, yes } => {
            let (store, user_id) = open_store(&config).await?;
            let id = PitchId::from(id.as_str());
            let pitch = store.get(&user_id, &id).await?;

            if !yes && !confirm(&format!("Delete '{}'? [y/N] ", pitch.display_name()))? {
                console::info("Cancelled.");
                return Ok(());
            }
            store.delete(&user_id, &id).await?;
            console::success(&format!("Deleted '{}'", pitch.display_name()));
        }

        Command::Validate => {
            console::info(&format!("Validating {}...", config_path.display()));
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            console::success("Config OK");
            if !cli.quiet {
                println!("{}", toml::to_string_pretty(&redacted(&config))?);
            }
        }

        Command::Doctor => doctor(&config).await?,
    }

    Ok(())
}

async fn auth_client(config: &Config) -> Result<AuthClient> {
    if config.backend.kind == BackendKind::Local {
        return Err(AppError::config(
            "the local backend has no accounts; set backend.kind = \"supabase\"",
        ));
    }
    AuthClient::new(config).await
}

/// The configured pitch store and the user id it is scoped to.
async fn open_store(config: &Config) -> Result<(Box<dyn PitchStore>, String)> {
    match config.backend.kind {
        BackendKind::Local => Ok((
            Box::new(LocalStore::new(&config.paths.data_dir)),
            LOCAL_USER.to_string(),
        )),
        BackendKind::Supabase => {
            let auth = AuthClient::new(config).await?;
            let session = auth.require_session().await?;
            let store = SupabaseStore::new(config, &session)?;
            Ok((Box::new(store), session.user_id().to_string()))
        }
    }
}

async fn doctor(config: &Config) -> Result<()> {
    console::header("Pitchcraft Doctor");

    let mut items = Vec::new();
    items.push((
        "Config",
        match config.validate() {
            Ok(()) => "ok".to_string(),
            Err(e) => e.to_string(),
        },
    ));
    items.push(("Model", config.gemini.model.clone()));

    match GeminiClient::new(config) {
        Ok(client) => {
            console::info("Sending a test prompt...");
            match client.check_key().await {
                Ok(report) => {
                    let verdict = match report.status {
                        _ if report.success => "working".to_string(),
                        403 => "key rejected (403)".to_string(),
                        429 => "rate limited (429)".to_string(),
                        status => format!("HTTP {status}"),
                    };
                    items.push(("API key", verdict));
                    console::sub_item(&format!("Response: {}", report.preview));
                }
                Err(e) => items.push(("API key", format!("request failed: {e}"))),
            }
        }
        Err(e) => items.push(("API key", e.to_string())),
    }

    items.push(("Backend", format!("{:?}", config.backend.kind).to_lowercase()));
    if config.backend.kind == BackendKind::Supabase {
        let status = match AuthClient::new(config).await {
            Ok(auth) => match auth.current_session().await? {
                Some(session) => format!("signed in ({})", session.user_id()),
                None => "not signed in".to_string(),
            },
            Err(e) => e.to_string(),
        };
        items.push(("Session", status));
    }

    console::summary("Diagnostics", &items);
    Ok(())
}

fn print_pitch(pitch: &Pitch) {
    let data = &pitch.generated_data;
    console::header(pitch.display_name());
    console::sub_item(&format!("Tagline: {}", data.tagline));
    console::sub_item(&format!("Industry: {}", pitch.industry_label()));
    if !data.elevator_pitch.is_empty() {
        console::sub_item(&format!("Pitch: {}", data.elevator_pitch));
    }
    if !data.problem.is_empty() {
        console::sub_item(&format!("Problem: {}", data.problem));
    }
    if !data.solution.is_empty() {
        console::sub_item(&format!("Solution: {}", data.solution));
    }
    if !data.target_audience.description.is_empty() {
        console::sub_item(&format!("Audience: {}", data.target_audience.description));
    }
    if !data.target_audience.segments.is_empty() {
        console::sub_item(&format!("Segments: {}", data.target_audience.segments.join(", ")));
    }
    if !data.unique_value_proposition.is_empty() {
        console::sub_item(&format!("Why us: {}", data.unique_value_proposition));
    }
    console::sub_item(&format!(
        "Colors: {} / {} / {} / {}",
        data.colors.primary, data.colors.secondary, data.colors.accent, data.colors.neutral
    ));
    if !data.logo_ideas.is_empty() {
        console::sub_item(&format!("Logo ideas: {}", data.logo_ideas.join("; ")));
    }
    console::summary(
        "Record",
        &[
            ("Id", pitch.id.to_string()),
            ("Created", pitch.created_at.format("%Y-%m-%d %H:%M UTC").to_string()),
            (
                "Landing page",
                if pitch.landing_code.is_some() { "yes" } else { "no" }.to_string(),
            ),
        ],
    );
}

fn email_of<'a>(reported: &'a Option<String>, typed: &'a str) -> &'a str {
    reported.as_deref().unwrap_or(typed)
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let line = prompt_hidden("Password: ")?;
    if line.is_empty() {
        return Err(AppError::validation("password must not be empty"));
    }
    Ok(line)
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(question)?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(question: &str) -> Result<String> {
    let mut stderr = io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read a line without echoing it when stdin is a terminal.
fn prompt_hidden(question: &str) -> Result<String> {
    if !io::stdin().is_terminal() {
        return prompt(question);
    }
    let mut stderr = io::stderr();
    stderr.write_all(question.as_bytes())?;
    stderr.flush()?;

    terminal::enable_raw_mode()?;
    let entered = read_hidden_line();
    terminal::disable_raw_mode()?;
    stderr.write_all(b"\n")?;
    entered
}

fn read_hidden_line() -> Result<String> {
    let mut buffer = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match apply_key(&mut buffer, key) {
                KeyOutcome::Pending => {}
                KeyOutcome::Submitted => return Ok(buffer),
                KeyOutcome::Cancelled => {
                    return Err(AppError::validation("password entry cancelled"));
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Pending,
    Submitted,
    Cancelled,
}

/// Raw mode delivers Ctrl-C as a key, so it cancels here.
fn apply_key(buffer: &mut String, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Pending;
    }
    match key.code {
        KeyCode::Enter => KeyOutcome::Submitted,
        KeyCode::Esc => KeyOutcome::Cancelled,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyOutcome::Cancelled
        }
        KeyCode::Backspace => {
            buffer.pop();
            KeyOutcome::Pending
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            KeyOutcome::Pending
        }
        _ => KeyOutcome::Pending,
    }
}

/// Ids can be anything the backend hands out; keep file names tame.
fn file_stem(id: &PitchId) -> String {
    id.0
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.gemini.api_key.is_some() {
        config.gemini.api_key = Some("REDACTED".into());
    }
    if config.backend.anon_key.is_some() {
        config.backend.anon_key = Some("REDACTED".into());
    }
    config
}
