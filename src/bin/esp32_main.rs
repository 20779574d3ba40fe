//! ESP32 model railway layout controller.
//!
//! This is the main entry point for the physical hardware controller.
//! It runs a 50Hz driver loop that:
//! - Shifts desired point positions out to the DPR relay boards
//! - Samples the TOTI occupancy detectors
//! - Redrives the destination indicators every half second
//! - Ticks the timer bank once per second
//!
//! Point positions and state machine states are restored from NVS at boot.
//! Holding the BOOT button (GPIO0) for two seconds while powering up wipes
//! them instead; the next power-up without the button restores as usual.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! ```

use esp_idf_hal::delay::Delay;
use esp_idf_hal::gpio::{IOPin, OutputPin};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use rs_layout::hal::esp32::{Esp32Clock, Esp32Eeprom, Esp32Lines};
use rs_layout::traits::Clock;
use rs_layout::{Config, Layout};
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// NVS namespace holding the layout storage map.
const NVS_NAMESPACE: &str = "layout";

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .without_time()
        .init();

    println!();
    println!("================================");
    println!("  rs-layout Controller");
    println!("================================");
    println!();

    let config = Config::default();
    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Bind Lines (see hal::esp32::pins)
    // =========================================================================
    let scan = &config.scan;
    let ind = &config.indicators;
    let pins = peripherals.pins;
    let lines = Esp32Lines::new()
        .with_output(scan.strobe_line, pins.gpio16.downgrade_output())?
        .with_output(scan.clock_line, pins.gpio17.downgrade_output())?
        .with_output(scan.data_out_line, pins.gpio18.downgrade_output())?
        .with_input(scan.data_in_line, pins.gpio19.downgrade())?
        .with_input(config.driver.reset_line, pins.gpio0.downgrade())?
        .with_output(scan.direct_lines[0], pins.gpio21.downgrade_output())?
        .with_output(scan.direct_lines[1], pins.gpio22.downgrade_output())?
        .with_output(scan.direct_lines[2], pins.gpio23.downgrade_output())?
        .with_output(scan.direct_lines[3], pins.gpio25.downgrade_output())?
        .with_output(scan.direct_lines[4], pins.gpio26.downgrade_output())?
        .with_output(ind.line(0), pins.gpio27.downgrade_output())?
        .with_output(ind.line(1), pins.gpio32.downgrade_output())?
        .with_output(ind.line(2), pins.gpio33.downgrade_output())?
        .with_output(ind.line(3), pins.gpio13.downgrade_output())?;
    println!("[OK] Lines bound (bus GPIO16-19, points GPIO21-26, panel GPIO27/32/33/13, reset GPIO0)");

    // =========================================================================
    // Open Storage (NVS)
    // =========================================================================
    let nvs = EspDefaultNvsPartition::take()?;
    let eeprom = Esp32Eeprom::new(nvs, NVS_NAMESPACE)?;
    println!("[OK] Storage opened (nvs namespace '{}')", NVS_NAMESPACE);

    // =========================================================================
    // Initialize Layout
    // =========================================================================
    let tick_ms = u64::from(config.driver.tick_ms);
    let second_ms = u64::from(config.driver.timer_tick_ms);
    let mut layout = Layout::new(lines, eeprom, Delay::new_default(), config);
    if layout.boot() {
        println!("[OK] Factory reset: points and machine states wiped");
    }
    println!("[OK] Layout initialized");

    println!();
    println!("Starting driver loop ({}ms tick)...", tick_ms);
    println!();

    // =========================================================================
    // Driver Loop
    // =========================================================================
    let clock = Esp32Clock::new();
    let mut next_second = clock.now_ms() + second_ms;

    loop {
        let start = clock.now_ms();

        layout.tick();

        if start >= next_second {
            layout.second_tick();
            next_second += second_ms;
        }

        let elapsed = clock.now_ms().saturating_sub(start);
        if elapsed > tick_ms {
            tracing::warn!(elapsed_ms = elapsed, "driver tick overran");
        }
        thread::sleep(Duration::from_millis(tick_ms.saturating_sub(elapsed)));
    }
}
