//! socialnet client - command-line entry point
//!
//! ```text
//! socialnet-client chats
//! socialnet-client chat <chat_id> <sender_id>
//! socialnet-client notifications
//! ```
//!
//! `--api-url` and `--session-cookie` fall back to `SOCIALNET_API_URL` and
//! `SOCIALNET_SESSION_COOKIE`.

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("socialnet_client=info")),
        )
        .init();

    cli::run(cli::Cli::parse()).await
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use anyhow::{bail, Context};
    use clap::{Parser, Subcommand};
    use socialnet_client::config::DEFAULT_API_URL;
    use socialnet_client::{ApiClient, ChannelEvent, ChatSession, ClientConfig, NotificationFeed};
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[derive(Parser)]
    #[command(name = "socialnet-client", about = "Chat and notifications from the terminal")]
    pub struct Cli {
        /// Base URL of the backend API
        #[arg(long, env = "SOCIALNET_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Cookie header value issued at login, e.g. `session_token=...`
        #[arg(long, env = "SOCIALNET_SESSION_COOKIE")]
        session_cookie: Option<String>,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Subcommand)]
    enum Command {
        /// List the chats you take part in
        Chats,
        /// Follow a chat and send each stdin line to it
        Chat { chat_id: i64, sender_id: i64 },
        /// Stream notifications; answer with `accept <id>` or `reject <id>`
        Notifications,
    }

    pub async fn run(cli: Cli) -> anyhow::Result<()> {
        let mut config = ClientConfig::new(cli.api_url);
        if let Some(cookie) = cli.session_cookie.filter(|c| !c.trim().is_empty()) {
            config = config.with_session_cookie(cookie);
        }
        let api = ApiClient::from_config(&config);

        let authenticated = api
            .auth_status()
            .await
            .with_context(|| format!("checking session against {}", config.api_url))?;
        if !authenticated {
            bail!("not authenticated: pass --session-cookie or set SOCIALNET_SESSION_COOKIE");
        }

        match cli.command {
            Command::Chats => list_chats(&api).await,
            Command::Chat { chat_id, sender_id } => chat(&config, chat_id, sender_id).await,
            Command::Notifications => notifications(&config).await,
        }
    }

    async fn list_chats(api: &ApiClient) -> anyhow::Result<()> {
        let chats = api.get_chats().await.context("loading chats")?;
        if chats.is_empty() {
            println!("no chats");
        }
        for chat in chats {
            println!("{:>6}  {}", chat.chat_id, chat.full_name);
        }
        Ok(())
    }

    async fn chat(config: &ClientConfig, chat_id: i64, sender_id: i64) -> anyhow::Result<()> {
        let mut session = ChatSession::new(config);
        for message in session.open(chat_id).await {
            println!("[{}] {}: {}", message.created_at, message.sender_id, message.content);
        }
        if let Some(error) = session.error() {
            eprintln!("history unavailable: {}", error);
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line.context("reading stdin")? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => {
                        if let Err(e) = session.send(sender_id, line) {
                            eprintln!("not sent: {}", e);
                        }
                    }
                    None => break,
                },
                event = session.next_event() => match event {
                    Some(ChannelEvent::Message(message)) => {
                        println!("[{}] {}: {}", message.created_at, message.sender_id, message.content);
                    }
                    Some(ChannelEvent::Opened) => eprintln!("connected to chat {}", chat_id),
                    Some(ChannelEvent::Closed { reason }) => {
                        eprintln!("connection closed{}", reason.map(|r| format!(": {r}")).unwrap_or_default());
                        break;
                    }
                    Some(ChannelEvent::Errored(reason)) => bail!("connection failed: {}", reason),
                    None => break,
                },
            }
        }
        session.close();
        Ok(())
    }

    async fn notifications(config: &ClientConfig) -> anyhow::Result<()> {
        let mut feed = NotificationFeed::connect(config);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        eprintln!("answer with `accept <id>` or `reject <id>`");

        loop {
            tokio::select! {
                line = lines.next_line() => match line.context("reading stdin")? {
                    Some(line) => {
                        let mut words = line.split_whitespace();
                        let accepted = match words.next() {
                            Some("accept") => true,
                            Some("reject") => false,
                            _ => continue,
                        };
                        match words.next().map(str::parse::<i64>) {
                            Some(Ok(id)) => {
                                if let Err(e) = feed.respond(id, accepted) {
                                    eprintln!("response not delivered: {}", e);
                                }
                            }
                            _ => eprintln!("expected a notification id"),
                        }
                    }
                    None => break,
                },
                event = feed.next_event() => match event {
                    Some(ChannelEvent::Message(batch)) => {
                        for n in batch {
                            println!("#{} [{}] {}", n.notification_id, n.kind, n.message);
                        }
                    }
                    Some(ChannelEvent::Opened) => eprintln!("listening for notifications"),
                    Some(ChannelEvent::Closed { .. }) | None => break,
                    Some(ChannelEvent::Errored(reason)) => bail!("connection failed: {}", reason),
                },
            }
        }
        feed.close();
        Ok(())
    }
}
