//! Probe for a terminal on the local network without starting a payment

use pepterm::{Error, SessionConfig, TerminalSession};

#[tokio::main]
async fn main() -> pepterm::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let tid = std::env::var("TERMINAL_TID").unwrap_or_else(|_| "12345678".to_string());

    let (session, _events) = TerminalSession::connect(SessionConfig::from_env()).await?;

    println!("Probing for terminal {}...", tid);
    match session.bind_terminal(&tid).await {
        Ok(outcome) if outcome.fallback => {
            println!("✗ No answer, fallback address {} configured", outcome.ip);
        }
        Ok(outcome) => {
            println!("✓ Terminal {} answered from {}", outcome.tid, outcome.ip);
        }
        Err(Error::BindTimeout(timeout)) => {
            println!("✗ No terminal answered within {:?}", timeout);
        }
        Err(e) => return Err(e),
    }

    session.shutdown();
    Ok(())
}
