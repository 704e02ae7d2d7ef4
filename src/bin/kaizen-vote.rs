use std::sync::Arc;

use kaizen_backend::{
    client::{CounterClient, CounterDisplay, FileReceiptStore, VoteOutcome, VoteState},
    config::Config,
    store,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn render(client: &CounterClient) {
    if let Some(warning) = client.warning() {
        println!("! {}", warning);
    }

    match client.display() {
        CounterDisplay::Loading => println!("KAIZEN 2026 | counting..."),
        CounterDisplay::Value(count) => {
            println!("KAIZEN 2026 | {} staying back for creating impact", count)
        }
    }

    match client.state() {
        VoteState::Voted if client.show_success() => {
            println!("You're in. See you March 6 - 8, 2026!")
        }
        VoteState::Voting => println!("Recording your vote..."),
        _ if client.can_vote() => {
            println!("Are you going to stay back for creating impact? [Enter = yes, q = quit]")
        }
        _ => println!("Voting unavailable. [q = quit]"),
    }
}

#[tokio::main]
async fn main() {
    // 日志写到 stderr，避免打乱界面输出
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let receipts = Arc::new(FileReceiptStore::new(&config.receipt_dir));
    let mut client = CounterClient::new(store::connect(&config), receipts).with_celebration(
        Arc::new(|count: u64| println!("*** Thank you! You are supporter #{} ***", count)),
    );

    client.mount().await;
    render(&client);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = client.next_update(), if client.is_subscribed() => {
                if event.is_some() {
                    render(&client);
                }
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(input)) => match input.trim() {
                        "q" | "quit" => break,
                        "" | "y" | "yes" => {
                            if client.vote().await == VoteOutcome::Failed {
                                tracing::info!("Vote failed, ready to retry");
                            }
                            render(&client);
                        }
                        _ => println!("Press Enter to vote, q to quit."),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
        }
    }

    client.unmount();
}
