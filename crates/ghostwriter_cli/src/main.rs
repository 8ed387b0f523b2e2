//! Command-line editor for Ghostwriter notes.
//!
//! # Responsibility
//! - Map subcommands onto `EditorService` and `NoteStore` calls.
//! - Keep stdout machine-friendly: one record per line, tab separated.

use clap::{Parser, Subcommand};
use ghostwriter_core::{
    init_logging, new_note_id, BlobStorage, CoreConfig, EditorError, EditorService,
    EnhanceOutcome, GeminiRewriter, Note, NoteStore, OutputLanguage, RewriteStyle, SaveResult,
    StorageBackend, StoreError,
};
use log::info;
use std::error::Error;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

const PREVIEW_CHARS: usize = 60;

type Editor = EditorService<Box<dyn BlobStorage + Send>, GeminiRewriter>;

#[derive(Parser)]
#[command(name = "ghostwriter")]
#[command(author, version, about = "Versioned notes with AI rewriting")]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding notes and logs (default: ~/.ghostwriter)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Storage backend: sqlite or file
    #[arg(long, global = true)]
    backend: Option<StorageBackend>,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List notes, newest created first
    List,

    /// Print the current content of a note
    Show {
        id: String,
    },

    /// List the superseded versions of a note, newest first
    History {
        id: String,
    },

    /// Create a note and print its id
    New {
        #[arg(short, long, default_value = "")]
        title: String,

        /// Content; read from stdin when omitted
        text: Option<String>,
    },

    /// Manually save new content for a note
    Save {
        id: String,

        /// Title; keeps the stored title when omitted
        #[arg(short, long)]
        title: Option<String>,

        /// Content; read from stdin when omitted
        text: Option<String>,
    },

    /// Rewrite a note with AI and save the result
    Enhance {
        id: String,

        #[arg(short, long, default_value = "Professional")]
        style: RewriteStyle,

        #[arg(short, long = "lang", default_value = "English")]
        language: OutputLanguage,

        /// Text to rewrite instead of the stored content
        #[arg(long)]
        text: Option<String>,
    },

    /// Make an older version current again (saved as a manual save)
    Restore {
        id: String,

        /// Position in `history`, 0 being the most recent
        index: usize,
    },

    /// List the available styles and languages
    Styles,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) if is_conflict(e.as_ref()) => {
            eprintln!("Error: {}", e);
            eprintln!("the note changed while you were editing; nothing was saved");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = CoreConfig::from_env()?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    if let Commands::Styles = cli.command {
        cmd_styles();
        return Ok(ExitCode::SUCCESS);
    }

    start_logging(&config);
    let mut editor = open_editor(&config)?;

    match cli.command {
        Commands::List => cmd_list(&editor),
        Commands::Show { id } => cmd_show(&editor, &id)?,
        Commands::History { id } => cmd_history(&editor, &id)?,
        Commands::New { title, text } => cmd_new(&mut editor, &title, text)?,
        Commands::Save { id, title, text } => cmd_save(&mut editor, &id, title, text)?,
        Commands::Enhance {
            id,
            style,
            language,
            text,
        } => return cmd_enhance(&mut editor, &id, style, language, text).await,
        Commands::Restore { id, index } => cmd_restore(&mut editor, &id, index)?,
        Commands::Styles => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn is_conflict(err: &(dyn Error + 'static)) -> bool {
    matches!(
        err.downcast_ref::<EditorError>(),
        Some(EditorError::Store(StoreError::Conflict { .. }))
    )
}

fn start_logging(config: &CoreConfig) {
    let log_dir = match std::path::absolute(config.log_dir()) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            return;
        }
    };
    // Logging is best effort; the command still runs without it.
    if let Err(e) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
        eprintln!("warning: logging disabled: {}", e);
    }
}

fn open_editor(config: &CoreConfig) -> Result<Editor, Box<dyn Error>> {
    let storage = config.open_storage()?;
    let store = NoteStore::with_key(storage, config.storage_key.clone());
    let rewriter = GeminiRewriter::new(config.rewrite.clone())?;
    info!(
        "event=cli_start module=cli backend={} data_dir={}",
        store.storage().backend_name(),
        config.data_dir.display()
    );
    Ok(EditorService::new(store, rewriter))
}

fn load_note(editor: &Editor, id: &str) -> Result<Note, EditorError> {
    editor
        .store()
        .get_by_id(id)
        .ok_or_else(|| EditorError::NoteNotFound(id.to_string()))
}

fn text_or_stdin(text: Option<String>) -> Result<String, Box<dyn Error>> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn label_text(note: &Note) -> String {
    note.last_label
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn print_saved(result: &SaveResult) {
    println!(
        "{}\t{}\t{} version(s)",
        result.note.id,
        result.outcome.as_str(),
        result.note.history.len()
    );
}

fn cmd_list(editor: &Editor) {
    for note in editor.store().list_all() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            note.id,
            note.title,
            note.updated_at,
            label_text(&note),
            note.history.len()
        );
    }
}

fn cmd_show(editor: &Editor, id: &str) -> Result<(), Box<dyn Error>> {
    let note = load_note(editor, id)?;
    println!("# {}\t{}", note.title, label_text(&note));
    println!("{}", note.current_content);
    Ok(())
}

fn cmd_history(editor: &Editor, id: &str) -> Result<(), Box<dyn Error>> {
    let note = load_note(editor, id)?;
    for (index, record) in note.history.iter().enumerate() {
        println!(
            "{}\t{}\t{}\t{}",
            index,
            record.label(),
            record.timestamp(),
            preview(record.content())
        );
    }
    Ok(())
}

fn preview(content: &str) -> String {
    let flattened = content.replace(['\n', '\r'], " ");
    let mut line: String = flattened.chars().take(PREVIEW_CHARS).collect();
    if flattened.chars().count() > PREVIEW_CHARS {
        line.push_str("...");
    }
    line
}

fn cmd_new(editor: &mut Editor, title: &str, text: Option<String>) -> Result<(), Box<dyn Error>> {
    let mut draft = editor.open(&new_note_id());
    draft.title = title.to_string();
    draft.text = text_or_stdin(text)?;
    let result = editor.manual_save(&mut draft)?;
    print_saved(&result);
    Ok(())
}

fn cmd_save(
    editor: &mut Editor,
    id: &str,
    title: Option<String>,
    text: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut draft = editor.open(id);
    if let Some(title) = title {
        draft.title = title;
    }
    draft.text = text_or_stdin(text)?;
    let result = editor.manual_save(&mut draft)?;
    print_saved(&result);
    Ok(())
}

async fn cmd_enhance(
    editor: &mut Editor,
    id: &str,
    style: RewriteStyle,
    language: OutputLanguage,
    text: Option<String>,
) -> Result<ExitCode, Box<dyn Error>> {
    let mut draft = editor.open(id);
    if let Some(text) = text {
        draft.text = text;
    }

    match editor.enhance(&mut draft, style, language).await? {
        EnhanceOutcome::Saved(result) => {
            print_saved(&result);
            println!("{}", result.note.current_content);
            Ok(ExitCode::SUCCESS)
        }
        EnhanceOutcome::Unavailable(reason) => {
            eprintln!("AI is offline ({}); note left unchanged", reason);
            Ok(ExitCode::FAILURE)
        }
        EnhanceOutcome::NothingToRewrite => {
            eprintln!("nothing to rewrite: note `{}` has no text", id);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_restore(editor: &mut Editor, id: &str, index: usize) -> Result<(), Box<dyn Error>> {
    let mut draft = editor.open(id);
    draft.text = editor.restore(id, index)?;
    let result = editor.manual_save(&mut draft)?;
    print_saved(&result);
    Ok(())
}

fn cmd_styles() {
    for style in RewriteStyle::ALL {
        println!("style\t{}\t{}", style, style.instruction());
    }
    for language in OutputLanguage::ALL {
        println!("language\t{}\t{}", language, language.instruction());
    }
}
