//! KycFlow CLI - Main entry point

use clap::{Parser, Subcommand};
use kycflow_cli::{commands, context, AppContext};
use kycflow_core::DeclaredProfile;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kycflow")]
#[command(about = "KycFlow - KYC maker/checker case workflow", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Service configuration (JSON, with a nested `scoring` section)
    #[arg(short, long, env = "KYCFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Acting user ID
    #[arg(long, env = "KYCFLOW_USER_ID", default_value = "maker-1")]
    user_id: String,

    /// Acting user display name (defaults to the ID)
    #[arg(long, env = "KYCFLOW_USER_NAME")]
    user_name: Option<String>,

    /// Acting user role: MAKER or CHECKER
    #[arg(long, env = "KYCFLOW_ROLE", default_value = "MAKER")]
    role: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new DRAFT case from the declared profile
    Create {
        #[arg(long)]
        name: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        dob: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Upload a document extraction (JSON) to a case
    Upload {
        case_id: String,
        /// tax_id, national_id or passport
        document_type: String,
        file: PathBuf,
    },

    /// Submit a DRAFT case for review
    Submit {
        case_id: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Approve a reviewed case (CHECKER)
    Approve {
        case_id: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Reject a reviewed case (CHECKER)
    Reject {
        case_id: String,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Show a case as JSON
    Show { case_id: String },

    /// List visible cases
    List {
        /// Filter by status (e.g. AI_REVIEWED)
        #[arg(long)]
        status: Option<String>,
    },

    /// Print the validation report of a case
    Validation { case_id: String },

    /// Print the audit trail of a case
    Audit { case_id: String },

    /// Validate the configuration and print the effective weights
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::CheckConfig = cli.command {
        let config = context::load_config(cli.config.as_deref())?;
        return commands::check_config(&config);
    }

    let actor = context::actor(&cli.user_id, cli.user_name.as_deref(), &cli.role)?;
    let ctx = AppContext::new(&cli.data, cli.config.as_deref()).await?;

    match cli.command {
        Commands::Create {
            name,
            dob,
            address,
            email,
            phone,
        } => {
            let mut profile = DeclaredProfile::new(name, dob, address);
            if let Some(email) = email {
                profile = profile.with_email(email);
            }
            if let Some(phone) = phone {
                profile = profile.with_phone(phone);
            }
            commands::create(&ctx, &actor, profile).await?;
        }

        Commands::Upload {
            case_id,
            document_type,
            file,
        } => {
            commands::upload(&ctx, &actor, &case_id, &document_type, &file).await?;
        }

        Commands::Submit { case_id, comment } => {
            commands::submit(&ctx, &actor, &case_id, comment.as_deref()).await?;
        }

        Commands::Approve { case_id, comment } => {
            commands::approve(&ctx, &actor, &case_id, comment.as_deref()).await?;
        }

        Commands::Reject { case_id, comment } => {
            commands::reject(&ctx, &actor, &case_id, comment.as_deref()).await?;
        }

        Commands::Show { case_id } => {
            commands::show(&ctx, &actor, &case_id).await?;
        }

        Commands::List { status } => {
            commands::list(&ctx, &actor, status.as_deref()).await?;
        }

        Commands::Validation { case_id } => {
            commands::validation(&ctx, &actor, &case_id).await?;
        }

        Commands::Audit { case_id } => {
            commands::audit(&ctx, &actor, &case_id).await?;
        }

        Commands::CheckConfig => {
            commands::check_config(ctx.service.config())?;
        }
    }

    Ok(())
}
