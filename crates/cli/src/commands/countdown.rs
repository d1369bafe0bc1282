use std::sync::Arc;

use formkit_countdown::{CountdownConfig, CountdownTimer, Preconditions, TokioScheduler};

/// Start a countdown and print every message until it returns to idle.
/// Ctrl-C resets it early.
pub async fn countdown(config: CountdownConfig) -> anyhow::Result<()> {
    let timer = CountdownTimer::new(
        config,
        Preconditions::default(),
        Arc::new(TokioScheduler::current()),
    );
    let mut rx = timer.subscribe();

    println!("{}", timer.state().message);
    timer.send().await?;

    loop {
        {
            let state = rx.borrow_and_update();
            println!("{}", state.message);
            if !state.disabled {
                break;
            }
        }

        tokio::select! {
            changed = rx.changed() => changed?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, resetting countdown");
                timer.reset();
            }
        }
    }

    Ok(())
}
