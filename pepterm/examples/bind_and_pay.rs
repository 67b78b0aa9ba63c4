//! Bind a terminal and run one card payment end to end

use pepterm::{EventDetail, PaymentRequest, SessionConfig, TerminalSession};

#[tokio::main]
async fn main() -> pepterm::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Change to your terminal identifier
    let tid = std::env::var("TERMINAL_TID").unwrap_or_else(|_| "12345678".to_string());
    let amount: f64 = std::env::var("AMOUNT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(10.50);

    let (session, mut events) = TerminalSession::connect(SessionConfig::from_env()).await?;

    println!("Binding terminal {}...", tid);
    let binding = session.bind_terminal(&tid).await?;
    if binding.fallback {
        println!("✓ No answer, assuming terminal at configured {}", binding.ip);
    } else {
        println!("✓ Terminal answered from {}", binding.ip);
    }

    let order = format!("DEMO-{}", chrono::Utc::now().timestamp());
    let started = session
        .send_payment(PaymentRequest::new(amount, order).with_description("Demo order"))
        .await?;
    println!("✓ Payment request sent (transaction {})", started.transaction_id);

    while let Some(event) = events.recv().await {
        match event.detail {
            EventDetail::Progress { status, code } => {
                println!("  progress: {} (code {})", status, code);
            }
            EventDetail::Result {
                success,
                code,
                message,
            } => {
                if success {
                    println!("✓ Payment approved");
                    let fields = event.transaction.fields;
                    if let Some(number) = fields.transaction_number {
                        println!("  transaction number: {}", number);
                    }
                    if let Some(pan) = fields.masked_pan {
                        println!("  card: {}", pan);
                    }
                } else {
                    println!("✗ Payment failed ({}): {}", code, message.unwrap_or_default());
                }
                break;
            }
            EventDetail::Cancelled => {
                println!("✗ Payment cancelled");
                break;
            }
        }
    }

    session.shutdown();
    Ok(())
}
