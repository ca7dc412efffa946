use embassy_net::Stack;
use embassy_time::{Duration as EmbassyDuration, Timer, WithTimeout};
use esp_radio::wifi::WifiController;
use letrero_hal_esp32s3::network::{SignLink, retry_backoff_secs};
use log::{info, warn};

const LINK_POLL_INTERVAL_MS: u64 = 500;
const DHCP_TIMEOUT_SECS: u64 = 15;

/// Keeps the sign joined and leased, publishing the form address on `link`.
pub async fn connection_loop(
    wifi_controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    link: &'static SignLink,
) -> ! {
    let mut consecutive_failures = 0u32;

    loop {
        if join(wifi_controller, link).await && lease(stack, link).await {
            consecutive_failures = 0;
            watch(wifi_controller, stack, link).await;
        }

        if link.mark_offline() {
            warn!("wifi: form unreachable, message stays on the display");
        }
        let _ = wifi_controller.disconnect_async().await;

        let delay_secs = retry_backoff_secs(consecutive_failures);
        consecutive_failures = consecutive_failures.saturating_add(1);
        info!("wifi: rejoining in {}s (attempt {})", delay_secs, consecutive_failures);
        Timer::after_secs(delay_secs).await;
    }
}

async fn join(wifi_controller: &mut WifiController<'_>, link: &SignLink) -> bool {
    link.mark_joining();

    if !wifi_controller.is_started().unwrap_or(false)
        && let Err(err) = wifi_controller.start_async().await
    {
        warn!("wifi: radio start failed: {:?}", err);
        return false;
    }

    match wifi_controller.connect_async().await {
        Ok(()) => true,
        Err(err) => {
            warn!("wifi: join failed: {:?}", err);
            false
        }
    }
}

async fn lease(stack: Stack<'_>, link: &SignLink) -> bool {
    link.mark_awaiting_lease();

    let up = stack
        .wait_config_up()
        .with_timeout(EmbassyDuration::from_secs(DHCP_TIMEOUT_SECS))
        .await;
    match (up, stack.config_v4()) {
        (Ok(()), Some(config)) => {
            publish(link, config.address.address());
            true
        }
        _ => {
            warn!("wifi: no DHCP lease within {}s", DHCP_TIMEOUT_SECS);
            false
        }
    }
}

/// Returns once the association or the lease is gone.
async fn watch(wifi_controller: &mut WifiController<'_>, stack: Stack<'_>, link: &SignLink) {
    loop {
        Timer::after_millis(LINK_POLL_INTERVAL_MS).await;

        let joined = matches!(wifi_controller.is_connected(), Ok(true));
        let lease = stack.config_v4().filter(|_| stack.is_link_up());
        match (joined, lease) {
            (true, Some(config)) => publish(link, config.address.address()),
            _ => {
                info!("wifi: link lost (joined={} leased={})", joined, lease.is_some());
                return;
            }
        }
    }
}

fn publish(link: &SignLink, address: core::net::Ipv4Addr) {
    if link.mark_serving(address) {
        info!("wifi: form at http://{}/", address);
    }
}
