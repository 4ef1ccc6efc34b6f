use anyhow::Context;
use clap::Parser;
use stockmind_core::assistant::{gather, ChatAssistant};
use stockmind_core::domain::chat::ChatRequest;
use stockmind_core::prompt::build_prompt;
use stockmind_core::providers::news::NewsChain;
use stockmind_core::providers::quote::QuoteChain;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stockmind_cli", about = "Run one chat message through the StockMind pipeline")]
struct Args {
    /// The user message, e.g. "TCS stock price".
    #[arg(long)]
    message: String,

    /// Optional page or conversation context.
    #[arg(long, default_value = "")]
    context: String,

    /// Gather data and print the prompt without calling the model.
    #[arg(long, conflicts_with = "plain")]
    dry_run: bool,

    /// Use the plain assistant (no market data).
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockmind_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let req = ChatRequest {
        message: args.message,
        context: args.context,
    };

    if args.dry_run {
        let quotes = QuoteChain::from_settings(&settings)?;
        let news = NewsChain::from_settings(&settings)?;
        let data = gather(&quotes, &news, &req.message, chrono::Utc::now()).await;
        let prompt = build_prompt(&data.prompt_input(&req));

        let summary = serde_json::json!({
            "stockSymbol": data.symbol,
            "marketSession": data.session,
            "quoteAttempts": data.quote.as_ref().map(|l| &l.attempts),
            "newsAttempts": &data.news.attempts,
            "newsFallback": data.news.result.fallback,
            "webDataUsed": data.web_data_used(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        println!("\n----- prompt ({} chars) -----\n{prompt}", prompt.len());
        tracing::info!(dry_run = true, "prompt assembled; model not called");
        return Ok(());
    }

    let assistant = ChatAssistant::from_settings(&settings)?;

    let out = if args.plain {
        let res = assistant.plain_chat(&req).await;
        res.map(|r| serde_json::to_string_pretty(&r))
    } else {
        let res = assistant.respond(&req).await;
        res.map(|r| serde_json::to_string_pretty(&r))
    };

    match out {
        Ok(json) => {
            println!("{}", json.context("failed to serialize response")?);
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "chat run failed");
            Err(err)
        }
    }
}

fn init_sentry(settings: &stockmind_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
