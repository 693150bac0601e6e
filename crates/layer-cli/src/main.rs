//! Layer developer CLI: drives the SDK from the command line.
//!
//! Configuration comes from the `LAYER_*` environment variables documented
//! on [`LayerConfig::from_env`].

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use layer_models::{MessageBody, MessageQuery};
use layer_sdk::{LayerClient, LayerConfig, SocketEvent};
use tracing::info;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "layer-cli")]
#[command(author, version, about = "Layer messaging developer CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Negotiate a session and print its token and expiry
    Token {
        /// User to authenticate as
        #[arg(long)]
        user: String,
    },
    /// Send a plain-text message to a conversation
    Send(SendArgs),
    /// List the messages of a conversation
    List {
        /// Conversation id (UUID or layer:/// URL)
        #[arg(long)]
        conversation: String,
        /// List as seen by this user (per-user unread state)
        #[arg(long)]
        user: Option<String>,
        /// Maximum number of messages
        #[arg(long)]
        page_size: Option<u32>,
        /// Only messages older than this message id
        #[arg(long)]
        from_id: Option<String>,
    },
    /// Mark a message as read
    Read {
        #[arg(long)]
        user: String,
        #[arg(long)]
        message: String,
    },
    /// Mark a message as delivered
    Delivered {
        #[arg(long)]
        user: String,
        #[arg(long)]
        message: String,
    },
    /// Print the unread counters of a user
    Badge {
        #[arg(long)]
        user: String,
    },
    /// Open the websocket and print incoming packets
    Listen {
        #[arg(long)]
        user: String,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false, id = "sender")]
struct SenderArgs {
    /// Send on behalf of this user
    #[arg(long)]
    from_user: Option<String>,
    /// Send under this system name
    #[arg(long)]
    from_name: Option<String>,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Conversation id (UUID or layer:/// URL)
    #[arg(long)]
    conversation: String,
    #[command(flatten)]
    sender: SenderArgs,
    /// Message text
    #[arg(long)]
    text: String,
    /// Push notification text
    #[arg(long)]
    notification: Option<String>,
    /// Dedupe UUID; the platform drops a second send with the same id
    #[arg(long)]
    dedupe: Option<String>,
}

impl SendArgs {
    fn body(&self) -> anyhow::Result<MessageBody> {
        let body = match (&self.sender.from_user, &self.sender.from_name) {
            (Some(user), _) => MessageBody::text_from_user(user, &self.text)?,
            (None, Some(name)) => MessageBody::text_from_name(name, &self.text)?,
            (None, None) => anyhow::bail!("either --from-user or --from-name is required"),
        };
        Ok(match &self.notification {
            Some(text) => body.with_notification(text),
            None => body,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging (controlled via RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = LayerConfig::from_env().context("loading LAYER_* configuration")?;
    let client = LayerClient::new(config)?;

    match cli.command {
        Commands::Token { user } => {
            let credential = client.session_credential(&user).await?;
            println!("{}", credential.token());
            info!(expires_at = %credential.expires_at(), "session negotiated");
        }
        Commands::Send(args) => {
            let body = args.body()?;
            let messages = client.messages();
            let message = match &args.dedupe {
                Some(dedupe) => messages.send_dedupe(dedupe, &args.conversation, &body).await?,
                None => messages.send(&args.conversation, &body).await?,
            };
            println!("{}", serde_json::to_string_pretty(&message)?);
        }
        Commands::List {
            conversation,
            user,
            page_size,
            from_id,
        } => {
            let query = MessageQuery { page_size, from_id };
            let messages = match user {
                Some(user) => {
                    client
                        .messages()
                        .list_from_user(&user, &conversation, &query)
                        .await?
                }
                None => client.messages().list(&conversation, &query).await?,
            };
            println!("{}", serde_json::to_string_pretty(&messages)?);
        }
        Commands::Read { user, message } => {
            client.messages().set_read(&user, &message).await?;
            println!("marked {message} as read for {user}");
        }
        Commands::Delivered { user, message } => {
            client.messages().set_delivered(&user, &message).await?;
            println!("marked {message} as delivered to {user}");
        }
        Commands::Badge { user } => {
            let badge = client.unread_badge(&user).await?;
            println!("{}", serde_json::to_string_pretty(&badge)?);
        }
        Commands::Listen { user } => listen(&client, &user).await?,
    }

    Ok(())
}

/// Print socket events until the connection closes or Ctrl-C.
async fn listen(client: &LayerClient, user: &str) -> anyhow::Result<()> {
    let socket = client.connect(user).await?;
    let mut events = socket
        .take_events()
        .context("websocket event stream already taken")?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SocketEvent::Opened) => println!("connected as {user}"),
                Some(SocketEvent::Message(packet)) => println!("{packet}"),
                Some(SocketEvent::Error(e)) => eprintln!("websocket error: {e}"),
                Some(SocketEvent::Closed) | None => {
                    println!("connection closed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                client.disconnect();
                break;
            }
        }
    }
    Ok(())
}
