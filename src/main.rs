use clap::{ArgAction, Parser, Subcommand};
use docmirror::remote::{GhCliSource, LocalMirrorSource, RemoteSource};
use docmirror::{assets, config, logging, navigation, output, render, sync, validate};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "docmirror")]
#[command(version)]
#[command(about = "Mirror product documentation from GitHub into a local content store")]
#[command(long_about = "\
Mirror product documentation from GitHub into a local content store

Each configured product's docs directory is fetched through the GitHub CLI,
relative markdown links are rewritten to canonical site URLs, and the result
replaces <content_root>/<product>/ in one step.

Content store layout:

  src/content/
  └── moat/                          # product id
      ├── .sync-manifest.json        # hashes from the last successful sync
      ├── getting-started/           # category
      │   ├── 01-introduction.md     # → /moat/getting-started/introduction
      │   └── 02-installation.md     # → /moat/getting-started/installation
      └── concepts/
          └── 01-sandboxing.md       # → /moat/concepts/sandboxing

Link rewriting (inside getting-started/01-introduction.md):
  ./02-installation.md           → /moat/getting-started/installation
  ../concepts/01-sandboxing.md   → /moat/concepts/sandboxing
  guides/05-multi-agent.md       → /moat/guides/multi-agent

If a sync fails and an earlier mirror exists, the earlier mirror is kept.

Run 'docmirror gen-config' to generate a documented docmirror.toml.")]
struct Cli {
    /// Project root containing docmirror.toml and the content store
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch docs for one product, or every configured product
    Sync {
        /// Product id; all products when omitted
        product: Option<String>,
        /// Read from a local checkout instead of GitHub
        #[arg(long)]
        mirror: Option<PathBuf>,
    },
    /// Check internal links across the synced content store
    Validate,
    /// Verify required static assets exist
    CheckAssets,
    /// Print sidebar navigation as JSON
    Nav {
        /// Product id; all products when omitted
        product: Option<String>,
    },
    /// Render a markdown document to HTML with links rewritten
    Render {
        file: PathBuf,
        /// Product whose URL namespace links resolve into
        #[arg(long)]
        product: Option<String>,
    },
    /// Print a stock docmirror.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let message = e.to_string();
            if message.starts_with('\u{2717}') {
                eprintln!("{message}");
            } else {
                eprintln!("\u{2717} {message}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Run a command. `Ok(false)` means it completed but found problems.
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let root = cli.root;

    match cli.command {
        Command::Sync { product, mirror } => {
            let config = config::load_config(&root)?;
            let source: Box<dyn RemoteSource> = match mirror {
                Some(dir) => Box::new(LocalMirrorSource::new(dir)),
                None => Box::new(GhCliSource::new(
                    config.remote.gh_binary.clone(),
                    Duration::from_secs(config.remote.timeout_secs),
                )),
            };
            let outcomes = sync::sync_products(source.as_ref(), &config, &root, product.as_deref())?;
            for outcome in &outcomes {
                let id = match outcome {
                    sync::SyncOutcome::Synced(report) => &report.product,
                    sync::SyncOutcome::Stale { product, .. } => product,
                };
                let label = config.content_root.join(id).display().to_string();
                output::print_sync_outcome(outcome, &label);
            }
            Ok(true)
        }
        Command::Validate => {
            let config = config::load_config(&root)?;
            println!("Validating internal markdown links...\n");
            let reports = validate::validate_store(&config, &root)?;
            let mut clean = true;
            for report in &reports {
                output::print_validation_report(report, &root);
                clean &= report.is_clean();
            }
            Ok(clean)
        }
        Command::CheckAssets => {
            let config = config::load_config(&root)?;
            println!("Checking required assets...\n");
            let report = assets::check_assets(&root, &config.assets.required);
            output::print_asset_report(&report, &config.assets.required);
            Ok(report.is_complete())
        }
        Command::Nav { product } => {
            let config = config::load_config(&root)?;
            let content_root = config.content_dir(&root);
            let json = match product {
                Some(id) => {
                    let product = config.product(&id)?;
                    let store = sync::store_dir(&content_root, &product.id);
                    serde_json::to_string_pretty(&navigation::build_navigation(&store, &product.id)?)?
                }
                None => {
                    let mut all = BTreeMap::new();
                    for id in config.product_ids() {
                        let store = sync::store_dir(&content_root, id);
                        all.insert(id, navigation::build_navigation(&store, id)?);
                    }
                    serde_json::to_string_pretty(&all)?
                }
            };
            println!("{json}");
            Ok(true)
        }
        Command::Render { file, product } => {
            let config = config::load_config(&root)?;
            let product_id = match product {
                Some(id) => config.product(&id)?.id.clone(),
                None => infer_product(&config, &file).ok_or_else(|| {
                    format!(
                        "Cannot tell which product {} belongs to; pass --product",
                        file.display()
                    )
                })?,
            };
            let text = std::fs::read_to_string(&file)?;
            let doc_path = path_within_product(&file, &product_id);
            print!("{}", render::render_document(&text, &doc_path, &product_id));
            Ok(true)
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(true)
        }
    }
}

/// `file` relative to its closest ancestor named `product_id`, so a document at
/// the store root has no category.
fn path_within_product(file: &Path, product_id: &str) -> String {
    let names: Vec<String> = file
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    let Some((_, dirs)) = names.split_last() else {
        return file.to_string_lossy().to_string();
    };
    match dirs.iter().rposition(|name| name == product_id) {
        Some(index) => names[index + 1..].join("/"),
        None => file.to_string_lossy().to_string(),
    }
}

/// The configured product whose id appears as a directory in `file`'s path.
fn infer_product(config: &config::SiteConfig, file: &Path) -> Option<String> {
    let parent = file.parent()?;
    parent
        .components()
        .rev()
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .find(|name| config.products.contains_key(*name))
        .map(str::to_string)
}
