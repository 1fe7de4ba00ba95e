use apidoc_hook::{config, logging, output, prebuild};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apidoc-hook")]
#[command(about = "Documentation pre-build hook for Python projects")]
#[command(long_about = "\
Documentation pre-build hook for Python projects

Run before every docs build. Reads the package's source (never imports it),
writes one API page per public submodule, fills the module index table in the
API reference page and, when enabled, renders the example gallery.

Project layout (defaults):

  project/
  ├── apidoc-hook.toml             # Optional config (see gen-config)
  ├── pyproject.toml               # [project].name → package name
  ├── src/sample/                  # Package; modules starting with _ are private
  ├── examples/                    # Scripts with __gallery__ = {...} become cards
  └── docs/
      ├── api-submodule.html       # Page template
      └── pages/
          ├── api-reference.md     # Contains <!-- API_TABLE -->
          ├── examples.md          # Contains <!-- GALLERY -->
          └── api/                 # Generated, git-ignored, pruned

Set MKDOCS_SKIP_NOTEBOOKS=1 (or pass --fast) to skip the gallery while editing.

Run 'apidoc-hook gen-config' to generate a documented apidoc-hook.toml.")]
#[command(version)]
struct Cli {
    /// Project root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/apidoc-hook.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the gallery, as if the fast-build variable were set
    #[arg(long, global = true)]
    fast: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate API pages, the index table and the gallery
    Build,
    /// Validate config, template and markers without writing
    Check,
    /// Print discovered modules and members as JSON
    Inspect,
    /// Print a stock apidoc-hook.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Command::Build => {
            let (hook_config, options) = load(&cli)?;
            let report = prebuild::run(&cli.root, &hook_config, &options)?;
            output::print_build_report(&report);
        }
        Command::Check => {
            let (hook_config, options) = load(&cli)?;
            let plan = prebuild::plan(&cli.root, &hook_config, &options)?;
            output::print_check(&plan);
        }
        Command::Inspect => {
            let (hook_config, _) = load(&cli)?;
            let inspection = prebuild::inspect(&cli.root, &hook_config)?;
            output::print_inspection(&inspection)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the hook config and decide whether this is a fast build.
fn load(cli: &Cli) -> Result<(config::HookConfig, prebuild::BuildOptions), config::ConfigError> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(config::CONFIG_FILE));
    let hook_config = config::load_config_file(&path)?;
    let options = prebuild::BuildOptions {
        fast: cli.fast || config::fast_build_requested(&hook_config.gallery.skip_env),
    };
    Ok((hook_config, options))
}
