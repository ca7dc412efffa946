#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use embassy_executor::Spawner;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Delay as EmbassyDelay, Timer};
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::{
    clock::CpuClock,
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    spi::master::Spi,
    time::Rate,
    timer::timg::TimerGroup,
};
use esp_radio::wifi::{ClientConfig, ModeConfig};
use letrero_core::{
    display::TextSurface,
    message::DisplayMessage,
    scroll::{self, ScrollConfig},
    store::MessageStore,
};
use letrero_hal_esp32s3::{
    network::{SignLink, WifiConfig},
    platform::display::MatrixDisplay,
};
use log::{LevelFilter, info, warn};
use max7219::Orientation;
use static_cell::StaticCell;

#[path = "main/http.rs"]
mod http;
#[path = "main/wifi.rs"]
mod wifi;

const DISPLAY_SPI_HZ: u32 = 10_000_000;
const DISPLAY_INTENSITY: u8 = 1;
const PLACEHOLDER_TEXT: &str = "Inicializando...";
const HTTP_PORT: u16 = 80;
const SCROLL_CONFIG: ScrollConfig = ScrollConfig::new();

const WIFI_SSID: &str = env!(
    "LETRERO_WIFI_SSID",
    "Set LETRERO_WIFI_SSID in your environment before building/flashing."
);
const WIFI_PASSWORD: &str = env!(
    "LETRERO_WIFI_PASSWORD",
    "Set LETRERO_WIFI_PASSWORD in your environment before building/flashing."
);
const WIFI_CONFIG: WifiConfig = WifiConfig::new(WIFI_SSID, WIFI_PASSWORD);

type SignStore = MessageStore<CriticalSectionRawMutex>;

static LINK: SignLink = SignLink::new();
static NET_RESOURCES: StaticCell<embassy_net::StackResources<3>> = StaticCell::new();
static STORE: StaticCell<SignStore> = StaticCell::new();

#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    loop {}
}

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Consumes launch requests from the store for the life of the firmware.
async fn scroll_loop<S>(store: &SignStore, display: &mut S) -> !
where
    S: TextSurface,
{
    let mut delay = EmbassyDelay;
    loop {
        store.serve_one(display, &mut delay, SCROLL_CONFIG).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(_spawner: Spawner) -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);
    esp_println::println!("boot: letrero starting");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // esp-radio requires an allocator.
    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 65536);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Wiring used by this sign:
    // CLK=GPIO4, DIN=GPIO2, CS=GPIO15
    let cs = Output::new(peripherals.GPIO15, Level::High, OutputConfig::default());

    let spi_config = esp_hal::spi::master::Config::default()
        .with_frequency(Rate::from_hz(DISPLAY_SPI_HZ))
        // MAX7219 chain is wired for CPOL=1, CPHA=0.
        .with_mode(esp_hal::spi::Mode::_2);

    let spi = Spi::new(peripherals.SPI2, spi_config)
        .unwrap()
        .with_sck(peripherals.GPIO4)
        .with_mosi(peripherals.GPIO2);
    let spi_device = ExclusiveDevice::new(spi, cs, Delay::new()).unwrap();

    let display_config = max7219::Config::default()
        .with_spi_hz(DISPLAY_SPI_HZ)
        .with_intensity(DISPLAY_INTENSITY)
        .with_orientation(Orientation::Rotated);
    let mut display = MatrixDisplay::new(spi_device, display_config);

    esp_println::println!("display: init begin (CLK=4 DIN=2 CS=15)");
    if let Err(err) = display.initialize() {
        esp_println::println!("display: initialize failed");
        warn!("display initialize failed: {:?}", err);
    } else {
        esp_println::println!("display: initialize ok");
    }

    // Placeholder goes up before the network is touched.
    if let Err(err) = scroll::render_frame(&mut display, PLACEHOLDER_TEXT, 0) {
        warn!("display placeholder flush failed: {:?}", err);
    }

    let initial = DisplayMessage::try_from_str(PLACEHOLDER_TEXT).unwrap_or_default();
    let store: &'static SignStore = STORE.init(MessageStore::new(initial));
    store.start().await;

    info!(
        "Sign started: spi_hz={} intensity={} start_column={} frame_ms={}",
        DISPLAY_SPI_HZ,
        DISPLAY_INTENSITY,
        SCROLL_CONFIG.start_column,
        SCROLL_CONFIG.frame_interval_ms
    );

    let radio = match esp_radio::init() {
        Ok(radio) => radio,
        Err(err) => {
            warn!("esp-radio init failed: {:?}; scrolling without network", err);
            scroll_loop(store, &mut display).await
        }
    };

    let (mut wifi_controller, interfaces) =
        match esp_radio::wifi::new(&radio, peripherals.WIFI, esp_radio::wifi::Config::default()) {
            Ok(parts) => parts,
            Err(err) => {
                warn!("wifi peripheral init failed: {:?}; scrolling without network", err);
                scroll_loop(store, &mut display).await
            }
        };

    let client_config = ClientConfig::default()
        .with_ssid(WIFI_CONFIG.ssid.into())
        .with_password(WIFI_CONFIG.password.into());
    if let Err(err) = wifi_controller.set_config(&ModeConfig::Client(client_config)) {
        warn!("wifi mode config failed: {:?}; scrolling without network", err);
        scroll_loop(store, &mut display).await
    }

    let stack_config = embassy_net::Config::dhcpv4(Default::default());
    let (stack, mut net_runner) = embassy_net::new(
        interfaces.sta,
        stack_config,
        NET_RESOURCES.init(embassy_net::StackResources::<3>::new()),
        0x1E7E_7019_A5C1_1D42,
    );

    info!("Wi-Fi bootstrap configured from env; ssid={}", WIFI_CONFIG.ssid);

    let net_future = net_runner.run();
    let wifi_future = wifi::connection_loop(&mut wifi_controller, stack, &LINK);
    let http_future = async {
        if let Err(err) = http::serve(stack, store, &LINK, HTTP_PORT).await {
            warn!("http: server stopped: {:?}", err);
        }
        loop {
            Timer::after_secs(3600).await;
        }
    };
    let scroll_future = scroll_loop(store, &mut display);

    let _ = embassy_futures::join::join4(net_future, wifi_future, http_future, scroll_future).await;
    unreachable!()
}
