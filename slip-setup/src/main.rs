use anyhow::Result;
use clap::Parser;
use libslipstream::config::{resolve_config_path, resolve_db_path, Config};
use libslipstream::{SqliteStorage, StorageBackend};
use std::io::{self, Write};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "slip-setup")]
#[command(about = "Interactive setup wizard for Slipstream", long_about = None)]
struct Cli {
    /// Skip interactive prompts and use defaults where possible
    #[arg(long)]
    non_interactive: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Slipstream setup wizard");

    // Run the setup wizard
    if let Err(e) = run_setup(&cli).await {
        error!("Setup failed: {}", e);
        eprintln!("\n❌ Setup failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run_setup(cli: &Cli) -> Result<()> {
    println!("\n🌟 Welcome to Slipstream Setup!\n");
    println!("This wizard will configure the local database that keeps your");
    println!("social actions safe while the network is away.\n");

    // Load or create configuration
    let mut config = match Config::load() {
        Ok(config) => {
            println!("✓ Found existing configuration\n");
            config
        }
        Err(_) => {
            println!("Creating new configuration...\n");
            Config::default_config()
        }
    };

    // Step 1: Database location
    configure_database(&mut config, cli.non_interactive)?;

    // Step 2: Queue namespace
    configure_namespace(&mut config, cli.non_interactive)?;

    // Step 3: Save configuration
    config.save()?;
    let config_path = resolve_config_path()?;
    println!("\n✓ Configuration saved to {}", config_path.display());

    // Step 4: Initialize the database
    initialize_database(&config).await?;

    // Step 5: Display completion message
    display_completion();

    Ok(())
}

fn configure_database(config: &mut Config, non_interactive: bool) -> Result<()> {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Step 1: Database Location");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Queued actions are persisted in a local SQLite database so they");
    println!("survive restarts. The default location follows the XDG spec.\n");

    if non_interactive {
        println!("Using database path: {}\n", config.database.path);
        return Ok(());
    }

    let path = prompt_with_default("Database path", &config.database.path)?;
    config.database.path = path;
    println!("✓ Database path set to: {}\n", config.database.path);

    Ok(())
}

fn configure_namespace(config: &mut Config, non_interactive: bool) -> Result<()> {
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Step 2: Queue Namespace");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Storage keys are prefixed with a namespace so several accounts");
    println!("can share one database. Keep the default unless you switch");
    println!("between accounts on this machine.\n");

    if non_interactive {
        println!("Using namespace: {}\n", config.queue.namespace);
        return Ok(());
    }

    let namespace = prompt_with_default("Namespace", &config.queue.namespace)?;
    config.queue.namespace = namespace;
    println!("✓ Namespace set to: {}\n", config.queue.namespace);

    Ok(())
}

async fn initialize_database(config: &Config) -> Result<()> {
    let db_path = resolve_db_path(Some(&config.database.path))?;
    let db_path = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Database path is not valid UTF-8"))?
        .to_string();

    println!("Initializing database...");
    let storage = SqliteStorage::new(&db_path).await?;
    storage.close().await;
    println!("✓ Database initialized at {}", db_path);

    Ok(())
}

fn prompt_with_default(prompt: &str, default: &str) -> Result<String> {
    print!("{} [{}]: ", prompt, default);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(if input.is_empty() {
        default.to_string()
    } else {
        input.to_string()
    })
}

fn display_completion() {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 Setup Complete!");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    println!("Next steps:\n");
    println!("  1. Enqueue a test action:");
    println!("     echo '{{\"thread_id\": \"demo\"}}' | slip-queue add like\n");
    println!("  2. Inspect the queue:");
    println!("     slip-queue list\n");
    println!("  3. Replay it through your backend:");
    println!("     slip-queue drain --exec '<your replay command>'\n");

    println!("For more information:");
    println!("  - Run 'slip-queue --help' for queue management options");
    println!("  - Visit https://github.com/slipstream-tools/slipstream\n");
}
