//! Simulated bus for tests: a virtual microsecond clock shared by a fake line, a fake delay, and a
//! model of a single device.

use core::convert::Infallible;
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use embedded_hal::blocking::delay::DelayUs;

use super::{commands, BusLine, OneWire};

/// Master low pulses shorter than this start a read slot, longer ones are writes
const READ_PULSE_MAX_US: u32 = 5;
/// Point in a write slot where the device samples the line
const DEVICE_SAMPLE_US: u32 = 30;
/// How long a device holds the line low when sending a 0
const DEVICE_HOLD_US: u32 = 15;
/// Minimum master low time recognised as a reset
const RESET_MIN_US: u32 = 480;
/// Presence pulse, relative to the end of the reset pulse
const PRESENCE_START_US: u32 = 15;
const PRESENCE_LEN_US: u32 = 120;

pub enum Device {
    /// Nothing on the bus but the pull-up
    Absent,
    /// Answers resets and sends back every byte it receives
    Loopback,
    /// A thermometer that understands skip ROM, convert and read scratchpad
    Ds18b20 { scratchpad: [u8; 9] },
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Stage {
    Rom,
    Function,
    Idle,
}

struct State {
    now: u32,
    device: Device,
    stage: Stage,

    master_low_since: Option<u32>,
    longest_low: u32,
    device_low: Option<(u32, u32)>,

    written: Vec<bool>,
    rx_bits: u8,
    rx_count: u8,
    received: Vec<u8>,
    tx: VecDeque<bool>,
    conversions: u32,
}

impl State {
    fn falling(&mut self) {
        if self.master_low_since.is_none() {
            self.master_low_since = Some(self.now);
        }
    }

    fn rising(&mut self) {
        let Some(since) = self.master_low_since.take() else {
            return;
        };
        let low = self.now - since;
        self.longest_low = self.longest_low.max(low);

        if low >= RESET_MIN_US {
            self.on_reset();
        } else if low < READ_PULSE_MAX_US {
            let bit = self.tx.pop_front().unwrap_or(true);
            if !bit {
                self.device_low = Some((since, since + DEVICE_HOLD_US));
            }
        } else {
            self.on_bit(low < DEVICE_SAMPLE_US);
        }
    }

    fn on_reset(&mut self) {
        self.rx_bits = 0;
        self.rx_count = 0;
        self.tx.clear();
        self.stage = Stage::Rom;
        if !matches!(self.device, Device::Absent) {
            let start = self.now + PRESENCE_START_US;
            self.device_low = Some((start, start + PRESENCE_LEN_US));
        }
    }

    fn on_bit(&mut self, bit: bool) {
        self.written.push(bit);
        self.rx_bits |= u8::from(bit) << self.rx_count;
        self.rx_count += 1;
        if self.rx_count == 8 {
            let byte = self.rx_bits;
            self.rx_bits = 0;
            self.rx_count = 0;
            self.received.push(byte);
            self.on_byte(byte);
        }
    }

    fn on_byte(&mut self, byte: u8) {
        match self.device {
            Device::Absent => {}
            Device::Loopback => self.queue(&[byte]),
            Device::Ds18b20 { scratchpad } => match (self.stage, byte) {
                (Stage::Rom, commands::SKIP_ROM) => self.stage = Stage::Function,
                (Stage::Function, 0x44) => {
                    self.conversions += 1;
                    self.stage = Stage::Idle;
                }
                (Stage::Function, 0xBE) => {
                    self.queue(&scratchpad);
                    self.stage = Stage::Idle;
                }
                _ => self.stage = Stage::Idle,
            },
        }
    }

    fn queue(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.tx.extend((0..8).map(|i| (byte >> i) & 1 == 1));
        }
    }

    fn line_is_high(&self) -> bool {
        let device_low = self
            .device_low
            .is_some_and(|(start, end)| (start..end).contains(&self.now));
        self.master_low_since.is_none() && !device_low
    }
}

#[derive(Clone)]
pub struct SimBus(Rc<RefCell<State>>);

impl SimBus {
    pub fn new(device: Device) -> Self {
        Self(Rc::new(RefCell::new(State {
            now: 0,
            device,
            stage: Stage::Rom,
            master_low_since: None,
            longest_low: 0,
            device_low: None,
            written: Vec::new(),
            rx_bits: 0,
            rx_count: 0,
            received: Vec::new(),
            tx: VecDeque::new(),
            conversions: 0,
        })))
    }

    /// A driver and delay attached to this bus
    pub fn master(&self) -> (OneWire<SimLine>, SimDelay) {
        (OneWire::new(SimLine(self.clone())), SimDelay(self.clone()))
    }

    /// Microseconds since the bus was created
    pub fn now(&self) -> u32 {
        self.0.borrow().now
    }

    /// Longest time the master has held the line low
    pub fn longest_low(&self) -> u32 {
        self.0.borrow().longest_low
    }

    pub fn is_released(&self) -> bool {
        self.0.borrow().master_low_since.is_none()
    }

    /// Every bit the device saw written, in bus order
    pub fn written_bits(&self) -> Vec<bool> {
        self.0.borrow().written.clone()
    }

    /// Every complete byte the device received
    pub fn received(&self) -> Vec<u8> {
        self.0.borrow().received.clone()
    }

    /// Number of conversions the device was asked to start
    pub fn conversions(&self) -> u32 {
        self.0.borrow().conversions
    }
}

pub struct SimLine(SimBus);

impl BusLine for SimLine {
    type Error = Infallible;

    fn drive_low(&mut self) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().falling();
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().rising();
        Ok(())
    }

    fn sense(&mut self) -> Result<bool, Infallible> {
        Ok(self.0 .0.borrow().line_is_high())
    }
}

pub struct SimDelay(SimBus);

impl DelayUs<u32> for SimDelay {
    fn delay_us(&mut self, us: u32) {
        self.0 .0.borrow_mut().now += us;
    }
}
