use clap::{Parser, Subcommand};
use serde::Serialize;

use msufood::auth::dto::{CreateUserParams, SignInParams, UpdateUserParams};
use msufood::menu::dto::GetMenuParams;
use msufood::menu::services::{get_categories, get_menu};
use msufood::session::services::{save_profile, sign_in_and_refresh, sign_out_and_clear, sign_up};
use msufood::{storage, AppState, SessionStore};

/// Each run is its own process and the session cookie lives only in memory,
/// so a command that needs a signed-in user signs in first from
/// `--email`/`--password` (or `MSUFOOD_EMAIL`/`MSUFOOD_PASSWORD`).
#[derive(Parser)]
#[command(name = "msufood", about = "Drive the MSU food app backend from the terminal")]
struct Cli {
    /// Sign in with these credentials before running the command.
    #[arg(long, env = "MSUFOOD_EMAIL", global = true)]
    email: Option<String>,
    #[arg(long, env = "MSUFOOD_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and its profile (uses --email/--password).
    SignUp {
        #[arg(long)]
        name: String,
    },
    /// Sign in with --email/--password and print the reconciled session.
    SignIn,
    /// Print the reconciled session. Signed out unless credentials are given.
    Whoami,
    UpdateProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        new_email: String,
    },
    SignOut,
    Menu {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    Categories,
    FileUrl {
        file_id: String,
    },
}

fn prints_session(command: &Command) -> bool {
    matches!(
        command,
        Command::SignUp { .. }
            | Command::SignIn
            | Command::Whoami
            | Command::UpdateProfile { .. }
            | Command::SignOut
    )
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, st: &AppState, store: &SessionStore) -> anyhow::Result<()> {
    let email = cli.email.unwrap_or_default();
    let password = cli.password.unwrap_or_default();

    match &cli.command {
        Command::SignUp { name } => {
            let params = CreateUserParams {
                email,
                password,
                name: name.clone(),
            };
            sign_up(st, store, params).await?;
            return Ok(());
        }
        Command::SignIn => {
            sign_in_and_refresh(st, store, SignInParams { email, password }).await?;
            return Ok(());
        }
        _ if !email.is_empty() && !password.is_empty() => {
            sign_in_and_refresh(st, store, SignInParams { email, password }).await?;
        }
        _ => store.fetch_authenticated_user(st).await,
    }

    match cli.command {
        Command::SignUp { .. } | Command::SignIn | Command::Whoami => {}
        Command::UpdateProfile { name, new_email } => {
            save_profile(
                st,
                store,
                UpdateUserParams {
                    name,
                    email: new_email,
                },
            )
            .await?;
        }
        Command::SignOut => sign_out_and_clear(st, store).await?,
        Command::Menu { category, query } => {
            let items = get_menu(st, GetMenuParams { category, query }).await?;
            return print_json(&items);
        }
        Command::Categories => {
            let categories = get_categories(st).await?;
            return print_json(&categories);
        }
        Command::FileUrl { file_id } => {
            println!("{}", storage::file_view_url(st, &file_id));
            return Ok(());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "msufood=debug".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let st = AppState::init()?;
    let store = SessionStore::new();

    let prints_session = prints_session(&cli.command);
    if let Err(e) = run(cli, &st, &store).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if prints_session {
        print_json(&store.snapshot())?;
    }
    Ok(())
}
