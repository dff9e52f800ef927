#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = examhub_api::run().await {
        eprintln!("examhub-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
