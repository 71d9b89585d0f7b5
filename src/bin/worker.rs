use std::io::BufRead;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("--hash-password") {
        // Read from stdin so the password stays out of the process list.
        let mut password = String::new();
        std::io::stdin().lock().read_line(&mut password)?;
        println!("{}", dojo_arena::hash_operator_password(&password)?);
        return Ok(());
    }

    if let Err(e) = dojo_arena::run_worker().await {
        eprintln!("dojo-arena-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
