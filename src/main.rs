#![no_std]
#![no_main]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::wildcard_imports)]

mod monitor;

use defmt_rtt as _;
use panic_probe as _;

/// Digits after the decimal point, tenths of a degree
const DECIMALS: u8 = 1;

/// Display brightness, 0-7
const BRIGHTNESS: u8 = 0;

#[rtic::app(device = stm32f0xx_hal::pac, dispatchers = [USART1, TIM14])]
mod app {
    use defmt::{panic, unreachable, *};
    use embedded_hal::spi::MODE_3;
    use onewire_thermo::{
        display::{show_reading, tm1638::Tm1638},
        ds18b20::Ds18b20,
        onewire::{OneWire, OpenDrainPin},
        thermometer::Reading,
    };
    use rtic_monotonics::{
        stm32::{Tim2 as Mono, *},
        Monotonic,
    };
    use rtic_sync::{
        channel::{ReceiveError, Receiver, Sender},
        make_channel,
    };
    use stm32f0xx_hal::{
        delay::Delay,
        gpio::{
            gpioa::{PA5, PA6, PA7},
            Alternate, OpenDrain, Output, Pin, PushPull, AF0,
        },
        pac::{IWDG, SPI1},
        prelude::*,
        spi::{EightBit, Spi},
        watchdog::Watchdog,
    };

    use crate::{BRIGHTNESS, DECIMALS};

    type Display = Tm1638<
        Spi<SPI1, PA5<Alternate<AF0>>, PA6<Alternate<AF0>>, PA7<Alternate<AF0>>, EightBit>,
        Pin<Output<PushPull>>,
        Delay,
    >;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        sensor: Ds18b20<OpenDrainPin<Pin<Output<OpenDrain>>>>,
        delay: Delay,
        led: Pin<Output<PushPull>>,
        tx: Sender<'static, Reading, 1>,
        display: Display,
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        // Set system clock to 24 MHz
        let mut rcc = cx
            .device
            .RCC
            .configure()
            .hsi48()
            .sysclk(24.mhz())
            .pclk(24.mhz())
            .hclk(24.mhz())
            .freeze(&mut cx.device.FLASH);

        trace!("sysclk: {}", rcc.clocks.sysclk().0);

        // Enable tim2 monotonic
        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Mono::start(24_000_000, token);

        // SysTick delay, shared by the 1-Wire bus and the display. Both run at priority 1.
        let delay = Delay::new(cx.core.SYST, &rcc);

        // Setup GPIO
        let gpioa = cx.device.GPIOA.split(&mut rcc);
        let gpiob = cx.device.GPIOB.split(&mut rcc);
        let led = gpiob.pb3.into_push_pull_output(&cx.cs).downgrade();

        let _ = watchdog::spawn(cx.device.IWDG);

        // Setup DS18B20. The pull-up is external.
        let pa12 = gpioa.pa12.into_open_drain_output(&cx.cs);
        let line = unwrap!(OpenDrainPin::new(pa12.downgrade()));
        let sensor = Ds18b20::new(OneWire::new(line));

        // Setup TM1638 on SPI1, PA4 strobe
        let spi = Spi::spi1(
            cx.device.SPI1,
            (
                gpioa.pa5.into_alternate_af0(&cx.cs),
                gpioa.pa6.into_alternate_af0(&cx.cs),
                gpioa.pa7.into_alternate_af0(&cx.cs),
            ),
            MODE_3,
            1.mhz(),
            &mut rcc,
        );
        let stb = gpioa.pa4.into_push_pull_output(&cx.cs).downgrade();

        let mut display = Tm1638::new(spi, stb, delay.clone())
            .unwrap_or_else(|e| panic!("Display init failed: {=str}", e.as_str()));
        if let Err(e) = display.clear().and_then(|()| display.set_brightness(BRIGHTNESS)) {
            error!("Display setup failed: {=str}", e.as_str());
        }

        // Setup channels
        let (tx, rx) = make_channel!(Reading, 1);

        // Launch tasks
        let _ = render::spawn(rx);
        let _ = monitor::spawn();

        (
            Shared {},
            Local {
                sensor,
                delay,
                led,
                tx,
                display,
            },
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    #[task(priority = 1)]
    async fn watchdog(_: watchdog::Context, wdg: IWDG) {
        let mut wdg = Watchdog::new(wdg);
        wdg.start(1.hz());

        loop {
            wdg.feed();
            Mono::delay(100.millis()).await;
        }
    }

    #[task(priority = 1, local = [sensor, delay, led, tx])]
    async fn monitor(cx: monitor::Context) {
        crate::monitor::monitor(cx).await;
    }

    #[task(priority = 1, local = [display])]
    async fn render(cx: render::Context, mut rx: Receiver<'static, Reading, 1>) {
        loop {
            let reading = match rx.recv().await {
                Ok(reading) => reading,
                Err(ReceiveError::Empty) => continue,
                Err(ReceiveError::NoSender) => unreachable!("Sender dropped"),
            };

            if let Err(e) = show_reading(cx.local.display, reading, DECIMALS) {
                error!("Display error: {=str}", e.as_str());
            }
        }
    }

    timestamp!("{=u64:us}", {
        Mono::now().duration_since_epoch().to_micros()
    });
}
