use std::fs::File;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use readpick::api::{ApiClient, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, list_position};
use readpick::core::auth::{AuthRepository, GetUserInfoUseCase, LogoutUseCase};
use readpick::core::config::{self, CliOverrides};
use readpick::net::{HttpLogger, LogLevel, Pipeline, ReqwestTransport};
use readpick::store::{FileTokenStore, TokenStore};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "readpick", about = "ReadPick book recommendation client")]
struct Args {
    /// Backend base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// HTTP exchange logging written to readpick.log
    #[arg(long, value_enum, global = true)]
    http_log: Option<LogLevel>,

    /// Debug-level file logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exchange a Google ID token for a ReadPick session
    Login { id_token: String },
    /// End the current session
    Logout {
        /// Also tell the server to end the session
        #[arg(long)]
        remote: bool,
    },
    /// Show the signed-in user
    Whoami {
        /// Ask the server instead of the local store
        #[arg(long)]
        remote: bool,
    },
    /// Show one book by ISBN-13
    Book { isbn13: String },
    /// List bestsellers
    Bestsellers {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
        #[arg(long)]
        category: Option<i64>,
    },
    /// Save a book to the library
    Save { isbn13: String },
    /// Report whether a credential is stored
    Token,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to readpick.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    if let Ok(log_file) = File::create("readpick.log") {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        eprintln!("{e}, falling back to defaults");
        config::ReadPickConfig::default()
    });
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url.as_deref(),
            http_log: args.http_log,
        },
    );
    log::info!("ReadPick starting up against {}", resolved.base_url);

    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(resolved.token_path.clone()));
    let transport = ReqwestTransport::new(
        Duration::from_secs(resolved.connect_timeout_secs),
        Duration::from_secs(resolved.request_timeout_secs),
    )
    .map_err(io::Error::other)?;
    let logger = HttpLogger::new(resolved.http_log).redacting(resolved.redact_headers.clone());
    let pipeline = Pipeline::authenticated(Arc::new(transport), store.clone(), logger);

    let api = ApiClient::new(resolved.base_url.clone(), pipeline);
    let repository = Arc::new(AuthRepository::new(api.clone(), store.clone()));

    match args.command {
        Command::Login { id_token } => {
            let profile = repository
                .login_with_google(&id_token)
                .await
                .map_err(io::Error::other)?;
            println!("Signed in as {} <{}> ({})", profile.name, profile.email, profile.role);
        }
        Command::Logout { remote } => {
            if remote {
                repository.logout().await.map_err(io::Error::other)?;
            } else {
                LogoutUseCase::new(store.clone()).execute().map_err(io::Error::other)?;
            }
            println!("Signed out");
        }
        Command::Whoami { remote } => {
            let info = if remote {
                Some(repository.fetch_user_profile().await.map_err(io::Error::other)?)
            } else {
                GetUserInfoUseCase::new(repository).invoke()
            };
            match info {
                Some(info) => println!("{} <{}>", info.name, info.email),
                None => println!("Not signed in"),
            }
        }
        Command::Book { isbn13 } => {
            let book = api
                .book_detail(&isbn13)
                .await
                .and_then(|r| r.into_data())
                .map_err(io::Error::other)?;
            println!("{} - {}\n{}", book.title, book.author, book.description);
        }
        Command::Bestsellers { page, size, category } => {
            let books = api
                .bestsellers(page, size, category)
                .await
                .and_then(|r| r.into_data())
                .map_err(io::Error::other)?;
            for (rank, book) in books.iter().enumerate() {
                let position = list_position(page, size, rank);
                println!("{:>3}. {} - {} [{}]", position, book.title, book.author, book.isbn13);
            }
        }
        Command::Save { isbn13 } => {
            let resp = api.save_book(&isbn13).await.map_err(io::Error::other)?;
            if resp.success {
                println!("Saved {isbn13}");
            } else {
                let message = resp.message.unwrap_or_else(|| "Unknown error".to_string());
                return Err(io::Error::other(message));
            }
        }
        Command::Token => {
            if store.is_logged_in() {
                println!("Credential stored at {}", resolved.token_path.display());
            } else {
                println!("No credential stored");
            }
        }
    }

    Ok(())
}
