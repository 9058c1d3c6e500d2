use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chat::api::PortalApi;
use chat::api::http::PortalClient;
use chat::config::{
    DEFAULT_API_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_UPLOAD_FILES, DEFAULT_PLAYBOOK_QUESTION,
    DEFAULT_REQUEST_TIMEOUT_SECS, PortalTimeouts,
};
use chat::preview::{NEW_CHAT_LABEL, format_chat_preview};
use chat::types::{ChatId, ChatMessage, FileId, ProjectId, Role, UploadFile, User};
use chat::{ChatError, ConfigError, MemoryStore, PortalConfig, Registry, Router};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing user email; pass --email or set PORTAL_USER_EMAIL")]
    MissingEmail,
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("cannot write {path}: {source}")]
    WriteFile { path: PathBuf, source: std::io::Error },
    #[error("stdin read failed: {0}")]
    Stdin(std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "portal-chat", about = "Project portal assistant from the terminal")]
struct Cli {
    #[arg(long, env = "PORTAL_API_URL", default_value = DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = "PORTAL_USER_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "PORTAL_USER_NAME", default_value = "")]
    name: String,

    #[arg(long, env = "PORTAL_MAX_UPLOAD_FILES", default_value_t = DEFAULT_MAX_UPLOAD_FILES)]
    max_upload_files: usize,

    #[arg(long, env = "PORTAL_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    #[arg(long, env = "PORTAL_CONNECT_TIMEOUT_SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    connect_timeout_secs: u64,

    #[arg(long, env = "PORTAL_PLAYBOOK_QUESTION", default_value = DEFAULT_PLAYBOOK_QUESTION)]
    playbook_question: String,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn portal_config(&self) -> Result<PortalConfig, ConfigError> {
        let mut config = PortalConfig::default().with_base_url(&self.base_url)?;
        config.max_upload_files = self.max_upload_files;
        config.timeouts = PortalTimeouts {
            request_secs: self.request_timeout_secs,
            connect_secs: self.connect_timeout_secs,
        };
        self.playbook_question.clone_into(&mut config.playbook_question);
        Ok(config)
    }

    fn user(&self) -> Result<User, CliError> {
        let email = self
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(CliError::MissingEmail)?;
        Ok(User { id: 0, email: email.to_owned(), name: self.name.clone() })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask one question and print the reply.
    Ask(AskArgs),
    /// Interactive conversation on stdin.
    Chat(ChatArgs),
    /// List recent chats.
    Sessions,
    /// Print the stored messages of a chat.
    History { chat_id: String },
    /// Ask the playbook question against the knowledge-base files.
    StartProject,
    Project(ProjectCommand),
    File(FileCommand),
}

#[derive(Args, Debug)]
struct AskArgs {
    /// Continue this chat instead of starting a new one.
    #[arg(long)]
    chat: Option<String>,

    /// Upload and use this file as context; repeatable.
    #[arg(long = "file")]
    files: Vec<PathBuf>,

    #[arg(required = true, num_args = 1..)]
    question: Vec<String>,
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long)]
    chat: Option<String>,
}

#[derive(Args, Debug)]
struct ProjectCommand {
    #[command(subcommand)]
    command: ProjectSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProjectSubcommand {
    List,
    Create { name: String },
    Delete { project_id: String },
}

#[derive(Args, Debug)]
struct FileCommand {
    #[command(subcommand)]
    command: FileSubcommand,
}

#[derive(Subcommand, Debug)]
enum FileSubcommand {
    List,
    /// Toggle the knowledge-base mark on a reference file.
    Mark { file_id: i64 },
    Delete { file_id: i64 },
    Download {
        file_id: i64,
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.portal_config()?;
    let client = PortalClient::new(config.clone())?;
    let api: Rc<dyn PortalApi> = Rc::new(client);
    let registry = Registry::new(api, Rc::new(MemoryStore::new()), config);
    let router = Router::new(registry);

    match &cli.command {
        Command::Ask(args) => run_ask(&cli, &router, args).await,
        Command::Chat(args) => run_chat(&cli, &router, args).await,
        Command::Sessions => run_sessions(&cli, &router).await,
        Command::History { chat_id } => run_history(&cli, &router, chat_id).await,
        Command::StartProject => run_start_project(&cli, &router).await,
        Command::Project(project) => run_project(&cli, &router, &project.command).await,
        Command::File(file) => run_file(&cli, &router, &file.command).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// Sign in and optionally switch to an existing chat.
async fn open_session(cli: &Cli, router: &Router, chat: Option<&str>) -> Result<(), CliError> {
    let registry = router.registry();
    registry.init(cli.user()?).await;
    if let Some(chat_id) = chat {
        registry.load_history(&ChatId::from(chat_id)).await?;
    }
    Ok(())
}

async fn run_ask(cli: &Cli, router: &Router, args: &AskArgs) -> Result<(), CliError> {
    open_session(cli, router, args.chat.as_deref()).await?;
    let seen = router.registry().messages().len();

    if !args.files.is_empty() {
        upload_paths(router, &args.files).await?;
    }
    router.ask(&args.question.join(" ")).await;

    print_messages(&router.registry().messages()[seen..]);
    if let Some(chat_id) = router.registry().active_chat_id() {
        eprintln!("chat: {chat_id}");
    }
    Ok(())
}

async fn run_chat(cli: &Cli, router: &Router, args: &ChatArgs) -> Result<(), CliError> {
    open_session(cli, router, args.chat.as_deref()).await?;
    let registry = router.registry();
    print_messages(&registry.messages());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let Some(line) = lines.next_line().await.map_err(CliError::Stdin)? else {
            break;
        };

        let seen = registry.messages().len();
        match parse_repl_line(&line) {
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
            ReplInput::NewChat => {
                let chat_id = registry.start_new_chat().await;
                eprintln!("new chat: {chat_id}");
                continue;
            }
            ReplInput::Upload(paths) => {
                if let Err(e) = upload_paths(router, &paths).await {
                    eprintln!("{e}");
                }
            }
            ReplInput::StartProject => {
                router.start_project().await;
            }
            ReplInput::Ask(question) => {
                router.ask(&question).await;
            }
        }
        let messages = registry.messages();
        print_messages(&messages[seen.min(messages.len())..]);
    }

    // Flush the transcript of the chat being left.
    let chat_id = registry.ensure_active_chat();
    registry.save_transcript(&chat_id).await;
    Ok(())
}

async fn run_start_project(cli: &Cli, router: &Router) -> Result<(), CliError> {
    open_session(cli, router, None).await?;
    let seen = router.registry().messages().len();
    router.start_project().await;
    print_messages(&router.registry().messages()[seen..]);
    Ok(())
}

/// Read, select and upload local files. Selection failures have already been
/// appended to the timeline; they are printed and reported as an error.
async fn upload_paths(router: &Router, paths: &[PathBuf]) -> Result<Vec<FileId>, CliError> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(read_upload(path).await?);
    }
    tracing::debug!(count = files.len(), "selecting local files");
    let seen = router.registry().messages().len();
    if let Err(e) = router.select_files(files) {
        print_messages(&router.registry().messages()[seen..]);
        return Err(e.into());
    }
    Ok(router.upload_selected().await)
}

async fn read_upload(path: &Path) -> Result<UploadFile, CliError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CliError::ReadFile { path: path.to_owned(), source })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(UploadFile { name, bytes, mime: None })
}

#[derive(Debug, PartialEq, Eq)]
enum ReplInput {
    Empty,
    Quit,
    NewChat,
    StartProject,
    Upload(Vec<PathBuf>),
    Ask(String),
}

fn parse_repl_line(line: &str) -> ReplInput {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    let mut words = line.split_whitespace();
    match words.next() {
        Some("/quit" | "/exit") => ReplInput::Quit,
        Some("/new") => ReplInput::NewChat,
        Some("/start") => ReplInput::StartProject,
        Some("/upload") => {
            let paths: Vec<PathBuf> = words.map(PathBuf::from).collect();
            if paths.is_empty() { ReplInput::Empty } else { ReplInput::Upload(paths) }
        }
        _ => ReplInput::Ask(line.to_owned()),
    }
}

// =============================================================================
// LISTINGS
// =============================================================================

async fn run_sessions(cli: &Cli, router: &Router) -> Result<(), CliError> {
    let user = cli.user()?;
    let sessions = router.registry().api().list_sessions(&user.email).await?;
    for session in sessions {
        println!(
            "{}  {}  {}",
            session.chat_id,
            session.updated_at.as_deref().unwrap_or("-"),
            format_chat_preview(&session.preview, NEW_CHAT_LABEL)
        );
    }
    Ok(())
}

async fn run_history(cli: &Cli, router: &Router, chat_id: &str) -> Result<(), CliError> {
    let user = cli.user()?;
    let history = router.registry().api().fetch_messages(&ChatId::from(chat_id), &user.email).await?;
    if let Some(project) = &history.project {
        println!("project: {} ({})", project.name, project.id);
    }
    for message in history.messages {
        let text = match message.role {
            Role::Assistant => markup::strip_code_fences(&message.message),
            Role::User => message.message,
        };
        println!("{}: {}", role_label(message.role), text);
    }
    Ok(())
}

async fn run_project(cli: &Cli, router: &Router, command: &ProjectSubcommand) -> Result<(), CliError> {
    let user = cli.user()?;
    let registry = router.registry();
    match command {
        ProjectSubcommand::List => {
            for project in registry.api().list_projects(&user.email).await? {
                println!("{}  {}", project.id, project.name);
                for conversation in project.conversations {
                    let label = if conversation.title.trim().is_empty() {
                        format_chat_preview(&conversation.preview, NEW_CHAT_LABEL)
                    } else {
                        conversation.title
                    };
                    println!("    #{}  {}  {}", conversation.id, conversation.chat_id, label);
                }
            }
        }
        ProjectSubcommand::Create { name } => {
            registry.init(user).await;
            let project_id = registry.create_project(name).await?;
            println!("{project_id}");
        }
        ProjectSubcommand::Delete { project_id } => {
            registry.api().delete_project(&ProjectId(project_id.clone()), &user.email).await?;
            println!("deleted {project_id}");
        }
    }
    Ok(())
}

async fn run_file(cli: &Cli, router: &Router, command: &FileSubcommand) -> Result<(), CliError> {
    let user = cli.user()?;
    let registry = router.registry();
    match command {
        FileSubcommand::List => {
            let marked = registry.api().knowledge_base(&user.email).await?;
            for file in registry.api().list_reference_files(false).await? {
                let mark = if marked.contains(&file.id) { "*" } else { " " };
                let state = if file.is_active { "active" } else { "inactive" };
                let size = file.file_size.map_or_else(|| "-".to_owned(), |s| s.to_string());
                println!("{mark} {}  {state:<8}  {size:>10}  {}", file.id, file.file_name);
            }
        }
        FileSubcommand::Mark { file_id } => {
            registry.init(user).await;
            let marked = registry.toggle_knowledge_base(FileId(*file_id)).await?;
            println!("{} {file_id}", if marked { "marked" } else { "unmarked" });
        }
        FileSubcommand::Delete { file_id } => {
            registry.api().delete_reference_file(FileId(*file_id)).await?;
            println!("deleted {file_id}");
        }
        FileSubcommand::Download { file_id, out } => {
            let bytes = registry.api().download_reference_file(FileId(*file_id)).await?;
            tokio::fs::write(out, &bytes)
                .await
                .map_err(|source| CliError::WriteFile { path: out.clone(), source })?;
            println!("wrote {} bytes to {}", bytes.len(), out.display());
        }
    }
    Ok(())
}

// =============================================================================
// OUTPUT
// =============================================================================

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "assistant",
    }
}

/// Assistant markup for a terminal: line-break tokens become newlines.
fn terminal_text(text: &str) -> String {
    text.replace(markup::LINE_BREAK, "\n")
}

fn print_messages(messages: &[ChatMessage]) {
    for message in messages {
        println!("{}: {}", role_label(message.role), terminal_text(&message.text));
    }
}
