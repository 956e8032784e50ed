#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = veritas_api::run().await {
        eprintln!("veritas-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
