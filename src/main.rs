/// gistd - mirrors GitHub gists and serves them as embeddable pages
use gist_exposed::{config::ServerConfig, context::AppContext, error::GistResult, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> GistResult<()> {
    // Load configuration (also reads .env)
    let config = ServerConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    print_banner();

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
       _     _
  __ _(_)___| |_ __| |
 / _` | / __| __/ _` |
| (_| | \__ \ || (_| |
 \__, |_|___/\__\__,_|
 |___/
        gist mirror v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
