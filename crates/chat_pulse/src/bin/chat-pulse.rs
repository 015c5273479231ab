use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use chat_datastore::FsDataStore;
use clap::{Parser, Subcommand};
use chat_pulse::{
    tracing::init_tracing_subscriber, twitch::helix::HelixClient, AutoChatRecorderBuilder,
    ChatCaptureSession, DatasetExtractor, Lifecycle, SessionConfig, StatusProber,
};

#[derive(Parser)]
#[command(name = "chat-pulse", about = "Twitch chat recorder and dataset builder")]
struct Cli {
    /// Channel to watch
    #[arg(long, env = "CHANNEL")]
    channel: Option<String>,

    /// Twitch application client id
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    /// Twitch application client secret, used to request an access token
    #[arg(long, env = "CLIENT_SECRET")]
    client_secret: Option<String>,

    /// Pre-issued app access token
    #[arg(long, env = "ACCESS_TOKEN")]
    access_token: Option<String>,

    /// Chat websocket endpoint
    #[arg(long, env = "TWITCH_IRC_URL", default_value = "wss://irc-ws.chat.twitch.tv:443")]
    irc_url: String,

    /// Directory holding status, capture and dataset files
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Accepted messages between two saves of a capture file
    #[arg(long, env = "BATCH_SIZE", default_value = "250")]
    batch_size: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record chat whenever the channel is live, until interrupted
    Watch {
        /// Seconds between two status checks
        #[arg(long, env = "CHECK_INTERVAL", default_value = "600")]
        check_interval: u64,
    },
    /// Record chat right away, until interrupted
    Capture,
    /// Build the dataset from the recorded chat logs
    Format,
    /// Print the channel's live status once
    Status,
}

struct Config {
    channel: String,
    client_id: String,
    client_secret: Option<String>,
    access_token: Option<String>,
    session: SessionConfig,
    store: FsDataStore,
}

impl Config {
    fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        Ok(Config {
            channel: cli.channel.clone().context("CHANNEL not set")?,
            client_id: cli.client_id.clone().context("CLIENT_ID not set")?,
            client_secret: cli.client_secret.clone(),
            access_token: cli.access_token.clone(),
            session: SessionConfig {
                irc_url: cli.irc_url.clone(),
                batch_size: cli.batch_size,
                ..Default::default()
            },
            store: FsDataStore::new(&cli.data_dir),
        })
    }

    fn helix_client(&self) -> HelixClient {
        let mut client = HelixClient::new(&self.client_id);
        if let Some(secret) = &self.client_secret {
            client = client.with_client_secret(secret);
        }
        if let Some(token) = &self.access_token {
            client = client.with_access_token(token);
        }
        client
    }

    fn extractor(&self) -> DatasetExtractor {
        DatasetExtractor::new(self.store.capture_dir(), self.store.dataset_path())
    }
}

async fn watch(config: Config, check_interval: u64) -> anyhow::Result<()> {
    let recorder = AutoChatRecorderBuilder::new(&config.channel)
        .status_source(config.helix_client())
        .store(config.store.clone())
        .check_interval(Duration::from_secs(check_interval))
        .irc_url(&config.session.irc_url)
        .batch_size(config.session.batch_size)
        .extractor(config.extractor())
        .build();

    let run = recorder.start();
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => {
            result?;
            recorder.stop().await;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Keyboard interrupt received. Stopping auto chat recorder.");
        }
    }

    // keep driving the loop so an in-flight transition completes before stop returns
    let (result, ()) = tokio::join!(run, recorder.stop());
    result?;

    Ok(())
}

async fn capture(config: Config) -> anyhow::Result<()> {
    let prober = StatusProber::new(config.helix_client());
    match prober.probe(&config.channel).await {
        Ok(info) if info.is_live => tracing::info!(
            channel = %config.channel,
            title = info.title.as_deref().unwrap_or("No title"),
            "Channel is live"
        ),
        Ok(_) => tracing::warn!(channel = %config.channel, "Channel is not live. Reading chat anyway."),
        Err(e) => tracing::warn!(error = %e, "Could not check channel status. Reading chat anyway."),
    }

    let session =
        ChatCaptureSession::open(&config.channel, config.store.clone(), config.session.clone())
            .await;

    tokio::select! {
        result = session.start() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Keyboard interrupt received. Stopping chat reader.");
        }
    }
    session.stop().await;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    match cli.command {
        Command::Watch { check_interval } => watch(Config::from_cli(&cli)?, check_interval).await?,
        Command::Capture => capture(Config::from_cli(&cli)?).await?,
        Command::Format => {
            let store = FsDataStore::new(&cli.data_dir);
            let dataset = DatasetExtractor::new(store.capture_dir(), store.dataset_path()).run()?;
            tracing::info!(messages = dataset.len(), "Dataset formatting complete");
        }
        Command::Status => {
            let config = Config::from_cli(&cli)?;
            let info = StatusProber::new(config.helix_client())
                .probe(&config.channel)
                .await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
