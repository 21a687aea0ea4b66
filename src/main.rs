use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    fullshot_cli::run().await
}
