//! Formula CLI - install virtualenv-packaged applications from Rhai formulas
//!
//! Usage:
//!   formula install <name>         Install a formula
//!   formula fetch <name>           Download and verify every archive
//!   formula test <name>            Run the formula's test() block
//!   formula remove <name>          Remove an installed formula
//!   formula info <name>            Show formula metadata
//!   formula audit <name>           Check a formula for common problems
//!   formula list                   List installed formulas
//!   formula hash <file>            Print the sha256 of a local file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use venv_formula::formula::{self, audit};
use venv_formula::{Config, FormulaEngine, Receipt, helpers, output};

#[derive(Parser)]
#[command(name = "formula")]
#[command(about = "Install terminal applications from virtualenv formulas")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding <name>.rhai formulas
    #[arg(short = 'f', long, global = true, env = "FORMULA_PATH")]
    formula_dir: Option<PathBuf>,

    /// Installation prefix
    #[arg(short, long, global = true, env = "FORMULA_PREFIX")]
    prefix: Option<PathBuf>,

    /// Download cache directory
    #[arg(long, global = true, env = "FORMULA_CACHE")]
    cache_dir: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a formula
    Install {
        /// Formula name or path to a formula file
        formula: String,

        /// Reinstall even if this version is already installed
        #[arg(long)]
        force: bool,
    },

    /// Download and verify every archive without installing
    Fetch {
        /// Formula name or path to a formula file
        formula: String,

        /// Ignore the cache and download every archive again
        #[arg(long)]
        force: bool,
    },

    /// Run the formula's test() against the installed keg
    Test {
        /// Formula name or path to a formula file
        formula: String,
    },

    /// Remove an installed formula
    Remove {
        /// Formula name
        name: String,
    },

    /// Show formula information
    Info {
        /// Formula name or path to a formula file
        formula: String,
    },

    /// Check a formula for common problems
    Audit {
        /// Formula name or path to a formula file
        formula: String,
    },

    /// List installed formulas
    List,

    /// Print the sha256 of a local file
    Hash {
        file: PathBuf,
    },
}

fn main() {
    if let Err(e) = run() {
        output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    output::set_verbose(cli.verbose);

    let mut config = Config::load()?;
    if let Some(prefix) = cli.prefix {
        config.prefix = prefix;
    }
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    if let Some(formula_dir) = cli.formula_dir {
        config.formula_dir = formula_dir;
    }
    output::debug(&format!("{:?}", config));

    let formula_dir = config.formula_dir.clone();
    let engine = FormulaEngine::new(config);

    match cli.command {
        Commands::Install { formula, force } => {
            let path = resolve_formula(&formula, &formula_dir)?;
            engine.install(&path, force)?;
        }

        Commands::Fetch { formula, force } => {
            let path = resolve_formula(&formula, &formula_dir)?;
            engine.fetch(&path, force)?;
        }

        Commands::Test { formula } => {
            let path = resolve_formula(&formula, &formula_dir)?;
            engine.test(&path)?;
        }

        Commands::Remove { name } => {
            validate_formula_name(&name)?;
            engine.remove(&name)?;
        }

        Commands::Info { formula } => {
            let path = resolve_formula(&formula, &formula_dir)?;
            show_info(&engine, &path)?;
        }

        Commands::Audit { formula } => {
            let path = resolve_formula(&formula, &formula_dir)?;
            let loaded = engine.inspect(&path)?;
            let problems = audit::audit(&loaded.formula);
            if problems.is_empty() {
                output::success(&format!("{}: no problems", loaded.formula.name));
            } else {
                for problem in &problems {
                    output::warning(&problem.to_string());
                }
                anyhow::bail!("{} problem(s) in {}", problems.len(), loaded.formula.name);
            }
        }

        Commands::List => {
            let receipts = engine.installed()?;
            if receipts.is_empty() {
                output::info("Nothing installed");
            }
            for receipt in receipts {
                output::list_item(&receipt.name, &format!("[{}]", receipt.version), true);
            }
        }

        Commands::Hash { file } => {
            let digest = helpers::hash::sha256_file(&file)
                .with_context(|| format!("Failed to hash {}", file.display()))?;
            println!("{}  {}", digest, file.display());
        }
    }

    Ok(())
}

fn show_info(engine: &FormulaEngine, path: &Path) -> Result<()> {
    let loaded = engine.load(path)?;
    let f = &loaded.formula;

    println!("{} {}", f.name.bold(), f.version);
    if !f.desc.is_empty() {
        println!("{}", f.desc);
    }
    if !f.homepage.is_empty() {
        println!("{}", f.homepage.cyan());
    }
    if !f.license.is_empty() {
        println!("License: {}", f.license);
    }
    println!("From: {}", path.display());

    let deps: Vec<_> = f.depends_on.iter().map(|d| d.to_string()).collect();
    let build_deps: Vec<_> = f.build_depends_on.iter().map(|d| d.to_string()).collect();
    if !build_deps.is_empty() {
        println!("Build: {}", build_deps.join(", "));
    }
    if !deps.is_empty() {
        println!("Required: {}", deps.join(", "));
    }
    println!("Resources: {}", f.resources.len());

    let installed: Vec<Receipt> = engine
        .installed()?
        .into_iter()
        .filter(|r| r.name == f.name)
        .collect();
    if installed.is_empty() {
        println!("{}", "Not installed".dimmed());
    }
    for r in installed {
        println!("{} {}", "Installed:".green(), r.version);
    }
    Ok(())
}

/// Validate a formula name to prevent path traversal
fn validate_formula_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("Formula name cannot be empty");
    }
    if !formula::is_path_component(name) {
        anyhow::bail!(
            "Invalid formula name '{}': only letters, digits, '.', '_', '+' and '-' are allowed, without '..'",
            name
        );
    }
    Ok(())
}

/// Resolve a formula name to a formula path
fn resolve_formula(formula: &str, formula_dir: &Path) -> Result<PathBuf> {
    let is_explicit_path =
        formula.contains('/') || formula.contains('\\') || formula.ends_with(".rhai");

    if is_explicit_path {
        let as_path = PathBuf::from(formula);
        if as_path.exists() {
            return Ok(as_path);
        }
        anyhow::bail!("Formula file not found: {}", formula);
    }

    validate_formula_name(formula)?;

    let formula_file = formula_dir.join(format!("{}.rhai", formula));
    if formula_file.exists() {
        return Ok(formula_file);
    }

    anyhow::bail!(
        "Formula not found: {}\nSearched in: {}",
        formula,
        formula_dir.display()
    )
}
