use clap::{Parser, Subcommand};
use simple_bistro::{auth, config, content::ContentService, media, output, store, web};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "simple-bistro")]
#[command(about = "Restaurant website with a menu, a blog, and an admin panel")]
#[command(long_about = "\
Restaurant website with a menu, a blog, and an admin panel

Visitors browse the menu (filterable by category) and the blog (searchable
by title). The admin logs in to add, edit, and delete dishes and posts, and
to add menu categories. Images go to the media host; records go to the
content store.

Backends:

  store.backend = \"memory\"      in-process, lost on restart (default)
  store.backend = \"firestore\"   Firestore REST API
  media.backend = \"memory\"      placeholder image URLs (default)
  media.backend = \"cloudinary\"  Cloudinary unsigned uploads

Credentials can come from the environment instead of config.toml:
  STORE_API_KEY, STORE_ACCESS_TOKEN, MEDIA_UPLOAD_PRESET, MEDIA_API_KEY,
  MEDIA_API_SECRET, ADMIN_PASSWORD_SHA256

Run 'simple-bistro gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server
    Serve,
    /// Validate config, connect to the store, and list its content
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Read a password from stdin and print its hash for admin.password_sha256
    HashPassword,
}

fn init_tracing() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => {
            init_tracing();
            let site_config = config::load_config(&cli.config)?;
            web::serve(&site_config).await?;
        }
        Command::Check => {
            let site_config = config::load_config(&cli.config)?;
            println!("==> Checking {}", cli.config.display());
            output::print_config_summary(&site_config);
            println!();

            let content = ContentService::new(
                store::connect(&site_config.store)?,
                media::connect(&site_config.media)?,
                site_config.media.max_upload_bytes,
            );
            let dishes = content.list_dishes().await?;
            let posts = content.list_posts().await?;
            let categories = content.list_categories().await?;
            output::print_inventory(&dishes, &posts, &categories, &site_config.site.currency);
            println!("==> Config and content store are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::HashPassword => {
            let mut password = String::new();
            std::io::stdin().read_to_string(&mut password)?;
            let password = password.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                return Err("no password given on stdin".into());
            }
            println!("{}", auth::hash_password(password));
        }
    }

    Ok(())
}
