//! `docent` - explain code from a workspace's own documentation.
//!
//! Indexes `README.md` and `docs/**.md`, then answers explanation requests
//! for a line range of a source file. Results are printed as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use docent_retrieval::{
    ContextBuilder, DocentConfig, ExplanationEngine, HealthStatus, Selection, TextDocument,
    WorkspaceIndexer, language_for_file,
};

/// Config file looked up inside the index directory when `--config` is absent.
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Parser)]
#[command(name = "docent", about = "Explain code strictly from project documentation", version)]
struct Cli {
    /// Workspace root
    #[arg(long, short, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file (defaults to <workspace>/.docent/config.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "docent=info,warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index README.md and the docs directory
    Index,

    /// Explain a line range of a source file
    Explain {
        /// Source file, relative to the workspace or absolute
        #[arg(long)]
        file: PathBuf,

        /// First line of the selection (1-based)
        #[arg(long)]
        start_line: usize,

        /// Last line of the selection (1-based, inclusive)
        #[arg(long)]
        end_line: usize,

        /// Override the detected enclosing function
        #[arg(long)]
        function: Option<String>,
    },

    /// Report index and engine health
    Health,

    /// Remove every indexed chunk
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!("workspace {} does not exist", cli.workspace.display())
    })?;
    let config = load_config(&workspace, cli.config.as_deref())?;
    let engine = ExplanationEngine::open(&workspace, config)
        .await
        .context("failed to open documentation index")?;

    match cli.command {
        Command::Index => {
            let report = WorkspaceIndexer::new(engine, &workspace)
                .index_workspace()
                .await?;
            print_json(&report)
        }
        Command::Explain {
            file,
            start_line,
            end_line,
            function,
        } => {
            explain(&engine, &workspace, &file, start_line, end_line, function).await
        }
        Command::Health => {
            let report = engine.health_check().await;
            print_json(&report)?;
            if report.status == HealthStatus::Unhealthy {
                bail!("documentation index is unhealthy");
            }
            Ok(())
        }
        Command::Clear => {
            engine.store().clear_index().await?;
            info!("Cleared index for {}", workspace.display());
            Ok(())
        }
    }
}

fn load_config(workspace: &Path, explicit: Option<&Path>) -> Result<DocentConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => DocentConfig::default()
            .index_dir(workspace)
            .join(CONFIG_FILE_NAME),
    };
    if explicit.is_some() && !path.exists() {
        bail!("config file {} does not exist", path.display());
    }

    Ok(DocentConfig::load(&path)?)
}

async fn explain(
    engine: &ExplanationEngine,
    workspace: &Path,
    file: &Path,
    start_line: usize,
    end_line: usize,
    function: Option<String>,
) -> Result<()> {
    if start_line == 0 || end_line == 0 {
        bail!("line numbers start at 1");
    }

    let path = if file.is_absolute() {
        file.to_path_buf()
    } else {
        workspace.join(file)
    };
    let text = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let file_name = file.to_string_lossy().replace('\\', "/");
    let document = TextDocument::new(file_name.as_str(), language_for_file(&file_name), text);
    let mut context = ContextBuilder::new()
        .extract(&document, Selection::lines(start_line - 1, end_line - 1));
    if let Some(function) = function {
        context.function_name = Some(function);
    }

    let result = engine.explain_code(&context).await?;
    print_json(&result)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_explain() {
        let cli = Cli::parse_from([
            "docent",
            "--workspace",
            "/tmp/project",
            "explain",
            "--file",
            "src/math.js",
            "--start-line",
            "3",
            "--end-line",
            "5",
            "--function",
            "calculateSum",
        ]);
        assert_eq!(cli.workspace, PathBuf::from("/tmp/project"));
        match cli.command {
            Command::Explain {
                file,
                start_line,
                end_line,
                function,
            } => {
                assert_eq!(file, PathBuf::from("src/math.js"));
                assert_eq!((start_line, end_line), (3, 5));
                assert_eq!(function.as_deref(), Some("calculateSum"));
            }
            _ => panic!("expected explain"),
        }
    }

    #[test]
    fn test_load_config() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_config(dir.path(), None).unwrap(), DocentConfig::default());

        let missing = dir.path().join("missing.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());

        let index_dir = dir.path().join(".docent");
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(index_dir.join(CONFIG_FILE_NAME), "[retrieval]\ntop_k = 3\n").unwrap();
        assert_eq!(load_config(dir.path(), None).unwrap().retrieval.top_k, 3);
    }
}
