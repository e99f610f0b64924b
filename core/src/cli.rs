use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::executor::{ExecutionContext, ParamKind, Registry};
use crate::parser;
use crate::store::{MemoryStore, VariableStore};

#[derive(Parser)]
#[command(name = "charm")]
#[command(about = "Charm - evaluate $macro[...] expressions", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Ambient binding visible as $$key (value parsed as JSON when possible)
    #[arg(long = "var", value_name = "KEY=VALUE", global = true)]
    pub vars: Vec<String>,

    /// JSON object used to seed the variable store
    #[arg(long = "vars", value_name = "FILE", global = true)]
    pub vars_file: Option<PathBuf>,

    /// Abort evaluation after this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate text given on the command line
    Eval {
        /// Source text, e.g. '$random[1, 6]'
        text: String,
    },

    /// Evaluate the contents of a file
    Run {
        /// Source file
        file: PathBuf,
    },

    /// List the invocations found in a file without evaluating them
    Check {
        /// Source file
        file: PathBuf,
    },

    /// List built-in macros with their tiers and parameters
    Macros,

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    // Load configuration before executing any command so config errors show first
    let config = Config::builder().config_path(cli.config.clone()).build()?;
    init_logging(&config.logging.level);

    match &cli.command {
        Commands::Eval { text } => {
            let session = Session::from_cli(&cli, config)?;
            println!("{}", session.render(text).await?);
        }

        Commands::Run { file } => {
            let source = read_source(file)?;
            let session = Session::from_cli(&cli, config)?;
            println!("{}", session.render(&source).await?);
        }

        Commands::Check { file } => {
            let source = read_source(file)?;
            let invocations = parser::find_all(&source)
                .map_err(|err| anyhow::anyhow!("[{}] {err}", err.kind()))?;

            if invocations.is_empty() {
                println!("No invocations found");
                return Ok(());
            }

            println!("Found {} top-level invocation(s):\n", invocations.len());
            for invocation in invocations {
                println!(
                    "  {:>6} | ${} | {}",
                    invocation.span.start,
                    invocation.name,
                    parser::classify(&invocation.raw_args)
                );
            }
        }

        Commands::Macros => {
            print!("{}", describe_macros(&Registry::with_stdlib()));
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read source file {}", path.display()))
}

/* ===================== Session ===================== */

/// Everything one CLI evaluation needs: registry, store, limits, bindings
pub struct Session {
    registry: Arc<Registry>,
    store: Arc<dyn VariableStore>,
    config: Config,
    bindings: Vec<(String, Value)>,
    timeout: Option<Duration>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            registry: Arc::new(Registry::with_stdlib()),
            store: Arc::new(MemoryStore::new()),
            config,
            bindings: Vec::new(),
            timeout: None,
        }
    }

    fn from_cli(cli: &Cli, config: Config) -> Result<Self> {
        let mut session = Self::new(config);
        if let Some(path) = &cli.vars_file {
            session.store = Arc::new(MemoryStore::from_file(path)?);
        }
        for binding in &cli.vars {
            let (key, value) = parse_binding(binding)?;
            session.bindings.push((key, value));
        }
        session.timeout = cli.timeout_ms.map(Duration::from_millis);
        Ok(session)
    }

    pub fn with_binding(mut self, key: impl Into<String>, value: Value) -> Self {
        self.bindings.push((key.into(), value));
        self
    }

    pub fn store(&self) -> &Arc<dyn VariableStore> {
        &self.store
    }

    /// Evaluate `source` in a fresh execution context
    pub async fn evaluate(&self, source: &str) -> Result<Value> {
        let mut ctx = ExecutionContext::new(Arc::clone(&self.registry), Arc::clone(&self.store))
            .with_limits(self.config.engine.clone());
        for (key, value) in &self.bindings {
            ctx = ctx.with_binding(key.clone(), value.clone());
        }

        let evaluation = ctx.evaluate(source);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, evaluation).await {
                Ok(result) => result,
                Err(_) => bail!("evaluation timed out after {} ms", limit.as_millis()),
            },
            None => evaluation.await,
        };

        result.map_err(|err| anyhow::anyhow!("[{}] {err}", err.kind()))
    }

    /// Evaluate and stringify for output
    pub async fn render(&self, source: &str) -> Result<String> {
        let value = self.evaluate(source).await?;
        Ok(crate::executor::types::stringify(&value))
    }
}

/// Parse a `--var key=value` argument
pub fn parse_binding(binding: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = binding.split_once('=') else {
        bail!("invalid --var '{binding}', expected KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("invalid --var '{binding}', key must not be empty");
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// One line per registered macro
pub fn describe_macros(registry: &Registry) -> String {
    let mut out = String::new();
    for name in registry.names() {
        let Some(handler) = registry.get(name) else {
            continue;
        };
        let signature = handler.signature();

        let tiers: Vec<String> = signature
            .tiers()
            .iter()
            .map(|tier| tier.number().to_string())
            .collect();
        let params: Vec<String> = signature
            .params()
            .iter()
            .map(|param| match param.kind {
                ParamKind::Code => format!("{} (code)", param.name),
                ParamKind::Value => param.name.to_string(),
            })
            .collect();

        out.push_str(&format!(
            "${:<8} tiers {:<6} [{}]  {}\n",
            name,
            tiers.join(","),
            params.join(", "),
            handler.summary()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_binding_reads_json_then_falls_back_to_text() {
        assert_eq!(parse_binding("count=3").unwrap(), ("count".to_string(), json!(3)));
        assert_eq!(
            parse_binding("user={\"name\":\"Ada\"}").unwrap(),
            ("user".to_string(), json!({"name": "Ada"}))
        );
        assert_eq!(
            parse_binding("greeting=hello world").unwrap(),
            ("greeting".to_string(), json!("hello world"))
        );
        assert!(parse_binding("novalue").is_err());
        assert!(parse_binding("=1").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "charm",
            "eval",
            "--var",
            "x=1",
            "--var",
            "y=two",
            "--timeout-ms",
            "250",
            "$$x",
        ])
        .unwrap();

        assert_eq!(cli.vars, vec!["x=1", "y=two"]);
        assert_eq!(cli.timeout_ms, Some(250));
        assert!(matches!(cli.command, Commands::Eval { ref text } if text == "$$x"));
    }

    #[tokio::test]
    async fn test_session_evaluates_with_bindings() {
        let session = Session::new(Config::default()).with_binding("name", json!("Ada"));
        assert_eq!(session.render("hello $$name").await.unwrap(), "hello Ada");
    }

    #[tokio::test]
    async fn test_session_reports_error_kind() {
        let session = Session::new(Config::default());
        let err = session.evaluate("$nope[]").await.unwrap_err();
        assert!(err.to_string().starts_with("[UnknownMacroError]"));
    }

    #[test]
    fn test_describe_macros_lists_builtins() {
        let listing = describe_macros(&Registry::with_stdlib());
        assert!(listing.contains("$if"));
        assert!(listing.contains("then (code)"));
        assert!(listing.contains("$foreach"));
    }
}
