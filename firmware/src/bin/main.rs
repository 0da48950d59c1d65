#![no_std]
#![no_main]

use beacon_relay::{
    scan_task, Relay, RelayError, ScanFailed, SerialSink, SoftdeviceScanner, Uptime,
};
use defmt::{error, info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::bind_interrupts;
use embassy_nrf::gpio::{Input, Pull};
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::peripherals::UARTE0;
use embassy_nrf::uarte::{self, UarteTx};
use embassy_time::Delay;
use nrf_softdevice::{raw, Softdevice};
use relay_core::config::INPUT_LINE_COUNT;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<UARTE0>;
});

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("beacon relay starting...");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);
    interrupt::UARTE0_UART0.set_priority(Priority::P3);

    // --- SoftDevice Setup ---
    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        ..Default::default()
    };
    let sd: &'static Softdevice = Softdevice::enable(&sd_config);

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(scan_task(sd)));

    // --- UART Setup ---
    let mut uart_config = uarte::Config::default();
    uart_config.parity = uarte::Parity::EXCLUDED;
    uart_config.baudrate = uarte::Baudrate::BAUD115200;
    let tx = UarteTx::new(p.UARTE0, Irqs, p.P0_06, uart_config);
    let serial = SerialSink::new(tx);

    // --- Input lines, bit i = line i ---
    let lines: [Input<'static>; INPUT_LINE_COUNT] = [
        Input::new(p.P0_03, Pull::Down),
        Input::new(p.P0_04, Pull::Down),
        Input::new(p.P0_28, Pull::Down),
        Input::new(p.P0_29, Pull::Down),
        Input::new(p.P0_30, Pull::Down),
        Input::new(p.P0_31, Pull::Down),
        Input::new(p.P1_01, Pull::Down),
        Input::new(p.P1_02, Pull::Down),
    ];

    let mut relay = Relay::new(Uptime, SoftdeviceScanner::new(), lines, Delay, serial);

    if let Err(e) = relay.start() {
        halt(e);
    }
    // Let the scan task make its first attempt so a refusal is caught here.
    embassy_futures::yield_now().await;
    if let Err(e) = relay.scanner_mut().take_error() {
        halt(RelayError::ScanStart(e));
    }

    info!("beacon relay running");
    loop {
        relay.tick();
        embassy_futures::yield_now().await;
    }
}

/// Fail-stop: without a scanner there is nothing to relay.
fn halt(e: RelayError<ScanFailed>) -> ! {
    error!("BLE failed to start: {}", e);
    loop {
        cortex_m::asm::nop();
    }
}

/// SoftDevice event task.
#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
