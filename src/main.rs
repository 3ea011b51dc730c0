use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    flowsmith_cli::cli::app::run().await
}
