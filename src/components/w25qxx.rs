// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # W25Qxx serial NOR flash
//!
//! Standard single-wire SPI commands of the Winbond W25Q family. Every
//! command runs with chip select asserted and releases it before returning,
//! including when the bus fails. Program and erase commands poll the BUSY
//! status bit for at most the configured budget.
//!
//! ```ignore
//! let mut flash = W25qxx::new(spi, cs, DEFAULT_BUSY_BUDGET);
//! let id = flash.init()?;
//! flash.erase_sector(0)?;
//! flash.write_data(0x10, b"hello")?;
//! ```

use embedded_hal::blocking::spi::{Transfer, Write};
use embedded_hal::digital::v2::OutputPin;

use super::paged::pages;
use crate::error::{Error, Result};
use crate::poll;

pub const PAGE_SIZE: u32 = 256;
pub const SECTOR_SIZE: u32 = 4 * 1024;
pub const BLOCK_SIZE: u32 = 64 * 1024;

/// Manufacturer and device ID of the W25Q64, as returned by [`W25qxx::read_id`]
pub const W25Q64_ID: u16 = 0xEF16;

/// Default number of status polls while the device is busy
pub const DEFAULT_BUSY_BUDGET: u32 = 0x0100_0000;

const STATUS_BUSY: u8 = 1 << 0;
const STATUS_WEL: u8 = 1 << 1;

mod command {
    pub const WRITE_ENABLE: u8 = 0x06;
    pub const WRITE_DISABLE: u8 = 0x04;
    pub const READ_STATUS: u8 = 0x05;
    pub const PAGE_PROGRAM: u8 = 0x02;
    pub const SECTOR_ERASE: u8 = 0x20;
    pub const BLOCK_ERASE: u8 = 0xD8;
    pub const CHIP_ERASE: u8 = 0xC7;
    pub const READ_DATA: u8 = 0x03;
    pub const JEDEC_ID: u8 = 0x9F;
    pub const MANUFACTURER_DEVICE_ID: u8 = 0x90;
    pub const POWER_DOWN: u8 = 0xB9;
    pub const RELEASE_POWER_DOWN: u8 = 0xAB;
}

/// JEDEC identification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JedecId {
    pub manufacturer: u8,
    pub memory_type: u8,
    pub capacity: u8,
}

pub struct W25qxx<SPI, CS> {
    spi: SPI,
    cs: CS,
    busy_budget: u32,
}

impl<SPI, CS, E> W25qxx<SPI, CS>
where
    SPI: Transfer<u8, Error = E> + Write<u8, Error = E>,
    E: Into<Error>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS, busy_budget: u32) -> Self {
        W25qxx {
            spi,
            cs,
            busy_budget,
        }
    }

    /// Wakes the device from power-down and reads its ID. Returns
    /// [`Error::Error`] if nothing answers on the bus.
    pub fn init(&mut self) -> Result<u16> {
        self.cs.set_high().map_err(|_| Error::Error)?;
        self.wake_up()?;
        let id = self.read_id()?;
        if id == 0x0000 || id == 0xFFFF {
            warn!("w25qxx: no device");
            return Err(Error::Error);
        }
        debug!("w25qxx: device id {=u16:#x}", id);
        Ok(id)
    }

    /// Manufacturer and device ID
    pub fn read_id(&mut self) -> Result<u16> {
        let mut frame = [command::MANUFACTURER_DEVICE_ID, 0, 0, 0, 0xFF, 0xFF];
        self.transaction(|spi| spi.transfer(&mut frame).map(|_| ()))?;
        Ok(u16::from_be_bytes([frame[4], frame[5]]))
    }

    pub fn read_jedec_id(&mut self) -> Result<JedecId> {
        let mut frame = [command::JEDEC_ID, 0xFF, 0xFF, 0xFF];
        self.transaction(|spi| spi.transfer(&mut frame).map(|_| ()))?;
        Ok(JedecId {
            manufacturer: frame[1],
            memory_type: frame[2],
            capacity: frame[3],
        })
    }

    /// Status register 1
    pub fn read_status(&mut self) -> Result<u8> {
        let mut frame = [command::READ_STATUS, 0xFF];
        self.transaction(|spi| spi.transfer(&mut frame).map(|_| ()))?;
        Ok(frame[1])
    }

    pub fn is_busy(&mut self) -> Result<bool> {
        Ok(self.read_status()? & STATUS_BUSY != 0)
    }

    /// True if the write-enable latch is set.
    pub fn is_write_enabled(&mut self) -> Result<bool> {
        Ok(self.read_status()? & STATUS_WEL != 0)
    }

    pub fn write_enable(&mut self) -> Result<()> {
        self.command(&[command::WRITE_ENABLE])
    }

    pub fn write_disable(&mut self) -> Result<()> {
        self.command(&[command::WRITE_DISABLE])
    }

    /// Polls BUSY until the current program or erase finishes.
    pub fn wait_idle(&mut self) -> Result<()> {
        let mut status = Ok(());
        poll::wait(self.busy_budget, || match self.read_status() {
            Ok(value) => value & STATUS_BUSY == 0,
            Err(e) => {
                status = Err(e);
                true
            }
        })?;
        status
    }

    /// Erases the 4 KiB sector containing `address`.
    pub fn erase_sector(&mut self, address: u32) -> Result<()> {
        self.erase(command::SECTOR_ERASE, address & !(SECTOR_SIZE - 1))
    }

    /// Erases the 64 KiB block containing `address`.
    pub fn erase_block(&mut self, address: u32) -> Result<()> {
        self.erase(command::BLOCK_ERASE, address & !(BLOCK_SIZE - 1))
    }

    pub fn erase_chip(&mut self) -> Result<()> {
        self.write_enable()?;
        self.command(&[command::CHIP_ERASE])?;
        self.wait_idle()
    }

    /// Programs up to one page. Bytes past the end of the page wrap to its
    /// start.
    pub fn program_page(&mut self, address: u32, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if data.len() > PAGE_SIZE as usize {
            return Err(Error::InvalidParameter);
        }
        self.write_enable()?;
        let header = addressed(command::PAGE_PROGRAM, address);
        self.transaction(|spi| {
            spi.write(&header)?;
            spi.write(data)
        })?;
        self.wait_idle()
    }

    /// Programs `data` at `address`, split at every page boundary. The
    /// target range must be erased.
    pub fn write_data(&mut self, address: u32, data: &[u8]) -> Result<()> {
        for segment in pages(address, data.len(), PAGE_SIZE) {
            self.program_page(
                segment.address,
                &data[segment.offset..segment.offset + segment.len],
            )?;
        }
        Ok(())
    }

    pub fn read_data(&mut self, address: u32, buffer: &mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let header = addressed(command::READ_DATA, address);
        buffer.fill(0xFF);
        self.transaction(|spi| {
            spi.write(&header)?;
            spi.transfer(buffer).map(|_| ())
        })
    }

    /// Enters deep power-down. Only [`W25qxx::wake_up`] is accepted until
    /// then.
    pub fn power_down(&mut self) -> Result<()> {
        self.command(&[command::POWER_DOWN])
    }

    /// Releases deep power-down. The device needs a few microseconds before
    /// it takes the next command.
    pub fn wake_up(&mut self) -> Result<()> {
        self.command(&[command::RELEASE_POWER_DOWN])
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn erase(&mut self, opcode: u8, address: u32) -> Result<()> {
        self.write_enable()?;
        self.command(&addressed(opcode, address))?;
        self.wait_idle()
    }

    fn command(&mut self, bytes: &[u8]) -> Result<()> {
        self.transaction(|spi| spi.write(bytes))
    }

    /// Runs `f` with chip select asserted. Chip select is released on every
    /// path; a bus error takes precedence over a pin error.
    fn transaction<T>(
        &mut self,
        f: impl FnOnce(&mut SPI) -> core::result::Result<T, E>,
    ) -> Result<T> {
        self.cs.set_low().map_err(|_| Error::Error)?;
        let result = f(&mut self.spi).map_err(Into::into);
        let released = self.cs.set_high().map_err(|_| Error::Error);
        let value = result?;
        released?;
        Ok(value)
    }
}

/// Opcode followed by a 24-bit address
fn addressed(opcode: u8, address: u32) -> [u8; 4] {
    let [_, high, mid, low] = address.to_be_bytes();
    [opcode, high, mid, low]
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    /// A W25Q64 model behind a recording bus.
    struct Device {
        memory: Vec<u8>,
        selected: bool,
        frame: Vec<u8>,
        frames: Vec<Vec<u8>>,
        write_enabled: bool,
        busy_reads: u32,
        busy_after_write: u32,
        fail_on: Option<u8>,
    }

    impl Device {
        fn new(busy_after_write: u32) -> Rc<RefCell<Device>> {
            Rc::new(RefCell::new(Device {
                memory: vec![0xFF; 2 * BLOCK_SIZE as usize],
                selected: false,
                frame: Vec::new(),
                frames: Vec::new(),
                write_enabled: false,
                busy_reads: 0,
                busy_after_write,
                fail_on: None,
            }))
        }

        fn address(&self) -> usize {
            usize::from(self.frame[1]) << 16
                | usize::from(self.frame[2]) << 8
                | usize::from(self.frame[3])
        }

        fn response(&mut self, position: usize) -> u8 {
            match (self.frame[0], position) {
                (command::READ_STATUS, p) if p >= 1 => {
                    let mut status = if self.write_enabled { STATUS_WEL } else { 0 };
                    if self.busy_reads > 0 {
                        self.busy_reads -= 1;
                        status |= STATUS_BUSY;
                    }
                    status
                }
                (command::MANUFACTURER_DEVICE_ID, 4) => 0xEF,
                (command::MANUFACTURER_DEVICE_ID, 5) => 0x16,
                (command::JEDEC_ID, 1) => 0xEF,
                (command::JEDEC_ID, 2) => 0x40,
                (command::JEDEC_ID, 3) => 0x17,
                (command::READ_DATA, p) if p >= 4 => self.memory[self.address() + p - 4],
                _ => 0xFF,
            }
        }

        fn deselect(&mut self) {
            self.selected = false;
            let frame = core::mem::take(&mut self.frame);
            if frame.is_empty() {
                return;
            }
            self.frame = frame.clone();
            match frame[0] {
                command::WRITE_ENABLE => self.write_enabled = true,
                command::WRITE_DISABLE => self.write_enabled = false,
                command::PAGE_PROGRAM if self.write_enabled => {
                    let page = self.address() & !(PAGE_SIZE as usize - 1);
                    for (i, &b) in frame[4..].iter().enumerate() {
                        let column = (self.address() + i) % PAGE_SIZE as usize;
                        self.memory[page + column] &= b;
                    }
                    self.finish_write();
                }
                command::SECTOR_ERASE if self.write_enabled => {
                    let start = self.address();
                    self.memory[start..start + SECTOR_SIZE as usize].fill(0xFF);
                    self.finish_write();
                }
                command::CHIP_ERASE if self.write_enabled => {
                    self.memory.fill(0xFF);
                    self.finish_write();
                }
                _ => {}
            }
            self.frame.clear();
            self.frames.push(frame);
        }

        fn finish_write(&mut self) {
            self.write_enabled = false;
            self.busy_reads = self.busy_after_write;
        }
    }

    struct Spi(Rc<RefCell<Device>>);
    struct Cs(Rc<RefCell<Device>>);

    impl Transfer<u8> for Spi {
        type Error = Error;

        fn transfer<'w>(&mut self, words: &'w mut [u8]) -> Result<&'w [u8]> {
            let mut device = self.0.borrow_mut();
            assert!(device.selected);
            for word in words.iter_mut() {
                if device.frame.is_empty() && device.fail_on == Some(*word) {
                    return Err(Error::Timeout);
                }
                device.frame.push(*word);
                let position = device.frame.len() - 1;
                *word = device.response(position);
            }
            Ok(words)
        }
    }

    impl Write<u8> for Spi {
        type Error = Error;

        fn write(&mut self, words: &[u8]) -> Result<()> {
            let mut device = self.0.borrow_mut();
            assert!(device.selected);
            if device.frame.is_empty() && device.fail_on == words.first().copied() {
                return Err(Error::Timeout);
            }
            device.frame.extend_from_slice(words);
            Ok(())
        }
    }

    impl OutputPin for Cs {
        type Error = Infallible;

        fn set_low(&mut self) -> core::result::Result<(), Infallible> {
            self.0.borrow_mut().selected = true;
            Ok(())
        }

        fn set_high(&mut self) -> core::result::Result<(), Infallible> {
            let mut device = self.0.borrow_mut();
            if device.selected {
                device.deselect();
            }
            Ok(())
        }
    }

    fn open(busy_after_write: u32, budget: u32) -> (W25qxx<Spi, Cs>, Rc<RefCell<Device>>) {
        let device = Device::new(busy_after_write);
        let flash = W25qxx::new(Spi(device.clone()), Cs(device.clone()), budget);
        (flash, device)
    }

    #[test]
    fn init_reads_the_device_id() {
        let (mut flash, device) = open(0, 8);

        assert_eq!(flash.init(), Ok(W25Q64_ID));
        assert_eq!(
            flash.read_jedec_id(),
            Ok(JedecId {
                manufacturer: 0xEF,
                memory_type: 0x40,
                capacity: 0x17,
            })
        );
        assert_eq!(device.borrow().frames[0], vec![command::RELEASE_POWER_DOWN]);
    }

    #[test]
    fn write_data_programs_page_segments() {
        let (mut flash, device) = open(2, 8);
        let data: Vec<u8> = (0..=255u8).chain(0..=99u8).collect();

        flash.write_data(0xF0, &data).unwrap();

        let programs: Vec<(usize, usize)> = device
            .borrow()
            .frames
            .iter()
            .filter(|f| f[0] == command::PAGE_PROGRAM)
            .map(|f| ((f[1] as usize) << 16 | (f[2] as usize) << 8 | f[3] as usize, f.len() - 4))
            .collect();
        assert_eq!(programs, vec![(0xF0, 16), (0x100, 256), (0x200, 84)]);

        let mut back = vec![0u8; data.len()];
        flash.read_data(0xF0, &mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn short_write_across_a_page_lands_in_the_next_page() {
        let (mut flash, device) = open(0, 8);
        let data: Vec<u8> = (1..=20u8).collect();

        flash.write_data(0xF0, &data).unwrap();

        let mut back = [0u8; 20];
        flash.read_data(0xF0, &mut back).unwrap();
        assert_eq!(&back[..], &data[..]);
        assert!(device.borrow().memory[0x00..0x04].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn erase_aligns_to_the_sector() {
        let (mut flash, device) = open(0, 8);
        flash.write_data(0x1000, &[0; 4]).unwrap();

        flash.erase_sector(0x1234).unwrap();

        assert_eq!(
            device.borrow().frames.last(),
            Some(&vec![command::READ_STATUS, 0xFF])
        );
        assert!(device
            .borrow()
            .frames
            .contains(&vec![command::SECTOR_ERASE, 0x00, 0x10, 0x00]));
        assert!(device.borrow().memory[0x1000..0x2000].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn busy_polling_honours_the_budget() {
        let (mut flash, _) = open(8, 8);
        assert_eq!(flash.program_page(0, &[1]), Err(Error::Timeout));

        let (mut flash, _) = open(7, 8);
        assert_eq!(flash.program_page(0, &[1]), Ok(()));
    }

    #[test]
    fn oversized_pages_are_rejected() {
        let (mut flash, device) = open(0, 8);
        assert_eq!(
            flash.program_page(0, &[0; 257]),
            Err(Error::InvalidParameter)
        );
        assert!(device.borrow().frames.is_empty());
    }

    #[test]
    fn chip_select_is_released_when_the_bus_fails() {
        let (mut flash, device) = open(0, 8);
        device.borrow_mut().fail_on = Some(command::JEDEC_ID);

        assert_eq!(flash.read_jedec_id(), Err(Error::Timeout));
        assert!(!device.borrow().selected);

        device.borrow_mut().fail_on = None;
        assert!(flash.read_jedec_id().is_ok());
    }
}
