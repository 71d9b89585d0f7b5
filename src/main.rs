#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dojo_arena::run().await {
        eprintln!("dojo-arena fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
