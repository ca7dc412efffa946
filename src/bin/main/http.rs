use core::{convert::Infallible, net::Ipv4Addr};

use embassy_net::{
    IpListenEndpoint, Stack,
    tcp::{AcceptError, Error as TcpError, TcpSocket},
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use embedded_io_async::Write as _;
use letrero_core::{
    page,
    request::{self, REQUEST_BUFFER_BYTES},
    store::{MessageStore, SubmitOutcome},
};
use letrero_hal_esp32s3::network::SignLink;
use log::{debug, info, warn};

const SOCKET_RX_BYTES: usize = 1536;
const SOCKET_TX_BYTES: usize = 4096;
const CLOSE_SETTLE_MS: u64 = 50;
const LINK_WAIT_MS: u64 = 500;

#[derive(Debug)]
pub enum ServeError {
    Accept(AcceptError),
    Read(TcpError),
}

/// Serves the form one connection at a time until accept or read fails.
///
/// A connection is only accepted while `link` publishes a form address.
pub async fn serve(
    stack: Stack<'_>,
    store: &MessageStore<CriticalSectionRawMutex>,
    link: &SignLink,
    port: u16,
) -> Result<Infallible, ServeError> {
    let mut rx_buffer = [0u8; SOCKET_RX_BYTES];
    let mut tx_buffer = [0u8; SOCKET_TX_BYTES];

    loop {
        let address = wait_for_form_address(link).await;
        debug!("http: accepting on {}:{}", address, port);

        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        if let Err(err) = socket.accept(IpListenEndpoint { addr: None, port }).await {
            warn!("http: accept failed: {:?} (link={:?})", err, link.phase());
            return Err(ServeError::Accept(err));
        }

        let handled = handle_connection(&mut socket, store).await;
        close_socket(&mut socket).await;
        handled?;
    }
}

async fn wait_for_form_address(link: &SignLink) -> Ipv4Addr {
    loop {
        if let Some(address) = link.form_address() {
            return address;
        }
        Timer::after(Duration::from_millis(LINK_WAIT_MS)).await;
    }
}

async fn handle_connection(
    socket: &mut TcpSocket<'_>,
    store: &MessageStore<CriticalSectionRawMutex>,
) -> Result<(), ServeError> {
    if let Some(remote) = socket.remote_endpoint() {
        info!("http: connection from {}", remote);
    }

    let mut buffer = [0u8; REQUEST_BUFFER_BYTES];
    let len = socket.read(&mut buffer).await.map_err(ServeError::Read)?;
    let raw = request::request_text(&buffer[..len]);
    debug!("http: request {}", raw);

    if request::is_form_submission(raw) {
        submit_form(store, raw).await;
    } else {
        debug!("http: page fetch");
    }

    let current = store.current().await;
    debug!("http: response {} bytes", page::response_len(current.text()));
    for chunk in page::response_chunks(current.text()) {
        if let Err(err) = socket.write_all(chunk).await {
            warn!("http: response write failed: {:?}", err);
            return Ok(());
        }
    }
    if let Err(err) = socket.flush().await {
        warn!("http: response flush failed: {:?}", err);
    }

    Ok(())
}

async fn submit_form(store: &MessageStore<CriticalSectionRawMutex>, raw: &str) {
    let text = match request::extract_message(raw) {
        Ok(Some(text)) => text,
        Ok(None) => return,
        Err(err) => {
            warn!("http: message rejected: {:?}", err);
            return;
        }
    };

    match store.submit(&text).await {
        Ok(SubmitOutcome::Replaced) => info!("http: message replaced: {}", text),
        Ok(SubmitOutcome::Unchanged) => debug!("http: message unchanged"),
        Err(err) => warn!("http: message rejected: {:?}", err),
    }
}

async fn close_socket(socket: &mut TcpSocket<'_>) {
    socket.close();
    Timer::after(Duration::from_millis(CLOSE_SETTLE_MS)).await;
    socket.abort();
}
