#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = acadex_rust::run().await {
        eprintln!("acadex-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
