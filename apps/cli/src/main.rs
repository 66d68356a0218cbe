use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sitestudio_highlight::{parse_highlight_palette, HighlightPalette, HighlightSpan};
use sitestudio_runexec::{BuildState, OutputSink, RunSpec};
use sitestudio_session::{PreviewHistory, Project, ProjectNode, Session};

mod logging;

#[derive(Parser)]
#[command(
    name = "sitestudio",
    about = "Command-line front end for Basic Website Studio projects",
    author,
    version
)]
struct Cli {
    /// 顯示除錯日誌。 / Raise log verbosity to debug (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 建立新專案。 / Create a project from the starter scaffold.
    New(NewArgs),
    /// 開啟專案並列出檔案樹。 / Open a project and print its file tree.
    Open(OpenArgs),
    /// 列出檔案的上色區段。 / Print highlight spans for a file.
    Highlight(HighlightArgs),
    /// 執行專案建置。 / Run the project build and stream its console.
    Build(BuildArgs),
    /// 顯示預覽頁面。 / Print the page the preview would render.
    Preview(PreviewArgs),
}

#[derive(Args)]
struct NewArgs {
    /// 專案名稱。 / Project name; also the directory name.
    name: String,

    /// 上層資料夾；預設為目前目錄。 / Parent directory (defaults to current directory).
    #[arg(long, value_name = "DIR", default_value = ".")]
    location: PathBuf,
}

#[derive(Args)]
struct OpenArgs {
    /// 專案資料夾。 / Project directory containing project.bws.
    dir: PathBuf,

    /// 以 JSON 輸出。 / Emit the tree as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HighlightArgs {
    file: PathBuf,

    /// 以 JSON 輸出。 / Emit spans as JSON.
    #[arg(long)]
    json: bool,

    /// 輸出不重疊的著色區段。 / Print flattened runs with their colours instead of raw spans.
    #[arg(long)]
    styled: bool,

    /// 自訂色盤 JSON。 / Palette overrides, e.g. {"tag": {"foreground": "#FF0000"}}.
    #[arg(long, value_name = "FILE", requires = "styled")]
    palette: Option<PathBuf>,
}

#[derive(Args)]
struct BuildArgs {
    dir: PathBuf,

    /// 建置程式；預設為 `npm run build`。 / Build program (defaults to `npm run build`).
    #[arg(long, value_name = "PROGRAM")]
    program: Option<String>,

    /// 傳給建置程式的參數，可重複。 / Argument for the build program; repeatable.
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Args)]
struct PreviewArgs {
    dir: PathBuf,
}

/// Writes console lines straight to stdout as they are applied.
#[derive(Default)]
struct StdoutConsole;

impl OutputSink for StdoutConsole {
    fn clear(&mut self) {}

    fn append_line(&mut self, line: &str) {
        println!("{line}");
    }
}

type CliSession = Session<StdoutConsole, PreviewHistory>;

fn session(build: RunSpec) -> CliSession {
    Session::with_parts(build, StdoutConsole, PreviewHistory::default())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::New(args) => execute_new(args),
        Commands::Open(args) => execute_open(args),
        Commands::Highlight(args) => execute_highlight(args),
        Commands::Build(args) => execute_build(args),
        Commands::Preview(args) => execute_preview(args),
    }
}

fn execute_new(args: NewArgs) -> Result<ExitCode> {
    let mut session = session(RunSpec::default());
    let project = session
        .create_project(&args.name, &args.location)
        .with_context(|| format!("creating project '{}'", args.name))?;
    tracing::debug!(files = project.tree().root.children.len(), "starter scaffold written");
    println!("{}", project.root().display());
    Ok(ExitCode::SUCCESS)
}

fn execute_open(args: OpenArgs) -> Result<ExitCode> {
    let mut session = session(RunSpec::default());
    let project = open_project(&mut session, &args.dir)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(project.tree())?);
    } else {
        print_tree(&project.tree().root, 0);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_tree(node: &ProjectNode, depth: usize) {
    let suffix = if node.is_folder() { "/" } else { "" };
    println!("{:indent$}{}{suffix}", "", node.name, indent = depth * 2);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

#[derive(Serialize)]
struct SpanRecord<'a> {
    start: usize,
    end: usize,
    category: &'static str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
}

fn execute_highlight(args: HighlightArgs) -> Result<ExitCode> {
    let palette = match &args.palette {
        Some(path) => load_palette(path)?,
        None => HighlightPalette::default_dark(),
    };
    let mut session = session(RunSpec::default()).with_palette(palette);
    let handle = session
        .open_document(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?
        .with_context(|| format!("{} is a directory", args.file.display()))?;
    let text = handle.content().to_string();

    let records: Vec<SpanRecord<'_>> = if args.styled {
        session
            .highlighter()
            .styled(&text)
            .into_iter()
            .map(|run| {
                let color = run.style.map(|style| style.foreground.to_hex());
                span_record(&text, &run.span, color)
            })
            .collect()
    } else {
        session
            .highlight_active()
            .iter()
            .map(|span| span_record(&text, span, None))
            .collect()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            match &record.color {
                Some(color) => println!(
                    "{} {} {} {} {}",
                    record.start, record.end, record.category, color, record.text
                ),
                None => println!(
                    "{} {} {} {}",
                    record.start, record.end, record.category, record.text
                ),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn span_record<'a>(text: &'a str, span: &HighlightSpan, color: Option<String>) -> SpanRecord<'a> {
    SpanRecord {
        start: span.start(),
        end: span.end(),
        category: span.kind.as_str(),
        text: span.text(text).unwrap_or_default(),
        color,
    }
}

fn load_palette(path: &Path) -> Result<HighlightPalette> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading palette {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("parsing palette {}", path.display()))?;
    parse_highlight_palette(&value).with_context(|| format!("invalid palette {}", path.display()))
}

fn execute_build(args: BuildArgs) -> Result<ExitCode> {
    let spec = match args.program {
        Some(program) => RunSpec::new(program).with_args(args.args),
        None => RunSpec::npm_build().with_args(args.args),
    };
    let command = spec.display_command();
    let mut session = session(spec);
    let root = open_project(&mut session, &args.dir)?.root().to_path_buf();
    tracing::info!(%command, cwd = %root.display(), "running build");
    session.build()?;
    let state = session.wait_for_build();
    tracing::debug!(?state, exit_code = ?session.build_job().exit_code(), "build finished");
    Ok(match state {
        BuildState::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

fn execute_preview(args: PreviewArgs) -> Result<ExitCode> {
    let mut session = session(RunSpec::default());
    open_project(&mut session, &args.dir)?;
    // Loading already played the project; a missing page was printed as a console line.
    Ok(match session.preview().last() {
        Some(page) => {
            println!("{}", page.display());
            ExitCode::SUCCESS
        }
        None => ExitCode::FAILURE,
    })
}

fn open_project<'s>(
    session: &'s mut CliSession,
    dir: &Path,
) -> Result<&'s Project> {
    session
        .open_project(dir)
        .with_context(|| format!("opening project {}", dir.display()))
}
