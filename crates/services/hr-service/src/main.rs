//! HR Service - employee and user management.

use clap::{Parser, Subcommand};

use hr_service_lib::config::HrServiceConfig;

#[derive(Parser)]
#[command(name = "hr-service")]
#[command(about = "Employee management service")]
struct Cli {
    /// Log at debug level regardless of LOG_LEVEL
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service with in-memory storage
    Run,
    /// Print an argon2 hash for seeding external stores
    HashPassword {
        /// Plain-text password; must meet the strength rules
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = HrServiceConfig::from_env();
    if cli.verbose {
        config.service.log_level = "debug".to_string();
    }

    match cli.command {
        Commands::Run => {
            common::init_tracing(&config.service)?;
            hr_service_lib::run(config).await?;
        }
        Commands::HashPassword { password } => {
            let hash = hr_service_lib::hash_password(&password)?;
            println!("{hash}");
        }
    }

    Ok(())
}
