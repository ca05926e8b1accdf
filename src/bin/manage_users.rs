use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use film_catalog_backend::entities::users::Role;
use film_catalog_backend::infrastructure::database;
use film_catalog_backend::services::account_service::{AccountService, NewUser};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Account administration without going through the HTTP API.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account with the given role
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "user", value_parser = parse_role)]
        role: Role,
    },
    /// Change the role of an existing account
    SetRole {
        #[arg(long)]
        username: String,
        #[arg(long, value_parser = parse_role)]
        role: Role,
    },
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manage_users=info,film_catalog_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("🔌 Connecting to database...");
    let db = database::setup_database().await?;

    match cli.command {
        Command::CreateUser {
            username,
            email,
            password,
            role,
        } => {
            let user = AccountService::create_user(
                &db,
                NewUser {
                    username: &username,
                    email: &email,
                    password: &password,
                    role,
                },
            )
            .await?;
            info!("✅ Created {} (id {}) as {}", user.username, user.id, user.role);
        }
        Command::SetRole { username, role } => {
            let Some(user) = AccountService::find_by_username(&db, &username).await? else {
                error!("❌ No user named {}", username);
                std::process::exit(1);
            };
            let user = AccountService::set_role(&db, user, role).await?;
            info!("✅ {} is now {}", user.username, user.role);
        }
    }

    Ok(())
}
