use taskdeck::config::Config;
use taskdeck::{init_tracing, start_server_with_config};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load()?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let mut server_task = tokio::spawn(start_server_with_config(config, shutdown_rx));

    tokio::select! {
        // Server exited on its own (bind failure etc.)
        res = &mut server_task => return res?,
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!("shutdown requested, stopping server...");
    let _ = shutdown_tx.send(());
    server_task.await??;

    info!("server stopped");
    Ok(())
}
