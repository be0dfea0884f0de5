use std::sync::Arc;

use anyhow::Result;
use log::info;

use green_loop::{
    config::Env,
    gateway::eth::EthersGateway,
    notice::LogNotices,
    sync::Synchronizer,
    units::format_amount,
    utils::setup_logger,
    wallet,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_logger()?;

    let env = Env::new()?;
    env.validate_all()?;

    let gateway = Arc::new(EthersGateway::new(&env)?);
    let sync = Arc::new(Synchronizer::new(gateway, Arc::new(LogNotices)));

    sync.establish_session().await;

    let state = sync.snapshot().await;
    match state.account {
        Some(account) => {
            info!(
                "session {:?} ({}) | GRN {} | RWD {} | allowance {} | rate {} RWD/GRN | {} past swaps",
                account,
                if state.is_owner { "owner" } else { "user" },
                format_amount(state.grn_balance),
                format_amount(state.rwd_balance),
                format_amount(state.allowance),
                format_amount(state.swap_rate),
                state.history.len(),
            );
        }
        None => info!("no authorized account; connect a wallet to begin"),
    }

    // Service account-change notifications until the producer side goes away.
    let (notifier, events) = wallet::channel(16);
    let _notifier = notifier;
    events.run(sync).await;

    Ok(())
}
