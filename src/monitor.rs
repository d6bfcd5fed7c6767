//! Measurement task

use core::convert::Infallible;

use defmt::*;
use embedded_hal::digital::v2::OutputPin;
use onewire_thermo::{
    ds18b20::CONVERSION_TIME,
    onewire::Error,
    thermometer::{Reading, Unit},
};
use rtic_monotonics::{
    stm32::{Tim2 as Mono, *},
    Monotonic,
};
use stm32f0xx_hal::gpio::{Output, Pin, PushPull};

/// Time between the starts of two measurements
const PERIOD_MS: u64 = 1_000;

/// Status LED flashes: one for a sensor that answered, three for silence
const FLASH_PRESENT: u8 = 1;
const FLASH_ABSENT: u8 = 3;
const FLASH_MS: u64 = 5;

pub async fn monitor(mut cx: crate::app::monitor::Context<'_>) {
    flash(cx.local.led, FLASH_ABSENT).await;

    let mut now = Mono::now();

    loop {
        trace!("monitor");

        match measure(&mut cx).await {
            Ok(reading) => {
                if cx.local.tx.try_send(reading).is_err() {
                    warn!("Display busy, dropping reading");
                }
            }
            Err(e) => {
                error!("Bus error: {}", e);
            }
        }

        now += PERIOD_MS.millis();
        Mono::delay_until(now).await;
    }
}

async fn measure(cx: &mut crate::app::monitor::Context<'_>) -> Result<Reading, Error<Infallible>> {
    let present = cx.local.sensor.start_measurement(cx.local.delay)?;

    if present {
        flash(cx.local.led, FLASH_PRESENT).await;
    } else {
        // Carry on anyway, the reading will come back as all ones
        warn!("No presence pulse");
        flash(cx.local.led, FLASH_ABSENT).await;
    }

    Mono::delay(u64::from(CONVERSION_TIME.to_millis()).millis()).await;

    let reading = cx.local.sensor.read_data(cx.local.delay)?;

    debug!(
        "Raw: {=i16}, Celsius: {}, Fahrenheit: {}",
        reading.0,
        reading.tenths(Unit::Celsius),
        reading.tenths(Unit::Fahrenheit)
    );

    Ok(reading)
}

async fn flash(led: &mut Pin<Output<PushPull>>, times: u8) {
    for _ in 0..times {
        unwrap!(led.set_high());
        Mono::delay(FLASH_MS.millis()).await;
        unwrap!(led.set_low());
        Mono::delay(FLASH_MS.millis()).await;
    }
}
