// Copyright 2024 The hc32m423-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # I2C serial EEPROM (24Cxx family)
//!
//! Writes are split into page writes, each followed by acknowledge polling
//! until the device has finished its internal write cycle.
//!
//! ```ignore
//! let mut eeprom = Eeprom::bl24c02f(i2c);
//! eeprom.write(0x10, b"hello, world")?;
//! let mut buf = [0u8; 12];
//! eeprom.read(0x10, &mut buf)?;
//! ```

use embedded_hal::blocking::i2c::{Write, WriteRead};
use heapless::Vec;

use super::paged::segments;
use crate::error::{Error, Result};
use crate::poll;

/// Largest page supported by [`Eeprom`]
pub const MAX_PAGE_SIZE: usize = 64;

const MAX_ADDRESS_BYTES: usize = 2;

/// Memory organisation of an EEPROM
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    /// Size in bytes
    pub capacity: u32,
    /// Largest write that fits in one transaction
    pub page_size: u32,
    /// Width of the memory address sent before data, 1 or 2 bytes
    pub address_bytes: u8,
}

/// BL24C02F: 2 Kbit, 8-byte pages
pub const BL24C02F: Geometry = Geometry {
    capacity: 256,
    page_size: 8,
    address_bytes: 1,
};

/// 7-bit bus address of the BL24C02F with A2..A0 tied low
pub const BL24C02F_ADDRESS: u8 = 0x50;

/// Default number of acknowledge polls after a page write
pub const DEFAULT_BUSY_BUDGET: u32 = 0x2000;

pub struct Eeprom<I2C> {
    i2c: I2C,
    address: u8,
    geometry: Geometry,
    busy_budget: u32,
}

impl<I2C> Eeprom<I2C> {
    /// Returns [`Error::InvalidParameter`] for an empty page or one larger
    /// than [`MAX_PAGE_SIZE`], an address width other than 1 or 2 bytes, or
    /// a capacity the address width cannot reach.
    pub fn new(i2c: I2C, address: u8, geometry: Geometry, busy_budget: u32) -> Result<Self> {
        let address_bytes = usize::from(geometry.address_bytes);
        if geometry.page_size == 0
            || geometry.page_size as usize > MAX_PAGE_SIZE
            || address_bytes == 0
            || address_bytes > MAX_ADDRESS_BYTES
        {
            return Err(Error::InvalidParameter);
        }
        let reachable = 1u64 << (8 * address_bytes);
        if u64::from(geometry.capacity) > reachable {
            return Err(Error::InvalidParameter);
        }
        Ok(Eeprom {
            i2c,
            address,
            geometry,
            busy_budget,
        })
    }

    /// The BL24C02F fitted on the evaluation board
    pub fn bl24c02f(i2c: I2C) -> Self {
        Eeprom {
            i2c,
            address: BL24C02F_ADDRESS,
            geometry: BL24C02F,
            busy_budget: DEFAULT_BUSY_BUDGET,
        }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn check_range(&self, address: u32, len: usize) -> Result<()> {
        let end = u64::from(address) + len as u64;
        if end > u64::from(self.geometry.capacity) {
            Err(Error::InvalidParameter)
        } else {
            Ok(())
        }
    }

    fn memory_address(&self, address: u32) -> Vec<u8, MAX_ADDRESS_BYTES> {
        let bytes = address.to_be_bytes();
        let width = usize::from(self.geometry.address_bytes);
        bytes[bytes.len() - width..].iter().copied().collect()
    }
}

impl<I2C, E> Eeprom<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
    E: Into<Error>,
{
    /// Writes `data` at `address`, one page write per segment.
    ///
    /// The first segment that fails aborts the write; earlier segments stay
    /// written.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.check_range(address, data.len())?;

        for segment in segments(address, data.len(), self.geometry.page_size) {
            let mut frame: Vec<u8, { MAX_PAGE_SIZE + MAX_ADDRESS_BYTES }> =
                self.memory_address(segment.address).iter().copied().collect();
            frame
                .extend_from_slice(&data[segment.offset..segment.offset + segment.len])
                .map_err(|_| Error::InvalidParameter)?;

            trace!("eeprom: page write at {=u32}", segment.address);
            self.i2c.write(self.address, &frame).map_err(Into::into)?;
            self.wait_idle()?;
        }
        Ok(())
    }

    pub fn write_byte(&mut self, address: u32, byte: u8) -> Result<()> {
        self.write(address, &[byte])
    }

    /// Sequential read of `buffer.len()` bytes from `address`.
    pub fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<()> {
        self.check_range(address, buffer.len())?;
        if buffer.is_empty() {
            return Ok(());
        }
        let memory_address = self.memory_address(address);
        self.i2c
            .write_read(self.address, &memory_address, buffer)
            .map_err(Into::into)
    }

    pub fn read_byte(&mut self, address: u32) -> Result<u8> {
        let mut byte = [0u8];
        self.read(address, &mut byte)?;
        Ok(byte[0])
    }

    /// Polls the device with empty writes until it acknowledges, which it
    /// does once its internal write cycle has finished.
    pub fn wait_idle(&mut self) -> Result<()> {
        let (i2c, address) = (&mut self.i2c, self.address);
        poll::wait(self.busy_budget, || i2c.write(address, &[]).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec as StdVec;

    /// A 24Cxx with one address byte that stays busy for `busy_polls`
    /// addressings after every write.
    struct MockEeprom {
        memory: [u8; 256],
        page_writes: StdVec<(u8, StdVec<u8>)>,
        busy_polls: u32,
        busy: u32,
        fail_page_write: Option<usize>,
    }

    impl MockEeprom {
        fn new(busy_polls: u32) -> Self {
            MockEeprom {
                memory: [0xFF; 256],
                page_writes: StdVec::new(),
                busy_polls,
                busy: 0,
                fail_page_write: None,
            }
        }
    }

    impl Write for MockEeprom {
        type Error = Error;

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<()> {
            if self.busy > 0 {
                self.busy -= 1;
                return Err(Error::Error);
            }
            if bytes.is_empty() {
                return Ok(());
            }
            if self.fail_page_write == Some(self.page_writes.len()) {
                return Err(Error::Error);
            }

            self.page_writes.push((address, bytes.to_vec()));
            let start = bytes[0];
            let page = start & !7;
            for (i, &b) in bytes[1..].iter().enumerate() {
                let column = (start as usize + i) & 7;
                self.memory[page as usize + column] = b;
            }
            self.busy = self.busy_polls;
            Ok(())
        }
    }

    impl WriteRead for MockEeprom {
        type Error = Error;

        fn write_read(&mut self, _: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<()> {
            let start = usize::from(bytes[0]);
            buffer.copy_from_slice(&self.memory[start..start + buffer.len()]);
            Ok(())
        }
    }

    fn sample(len: usize) -> StdVec<u8> {
        (0..len as u8).collect()
    }

    #[test]
    fn writes_are_split_at_page_boundaries() {
        let mut eeprom = Eeprom::bl24c02f(MockEeprom::new(3));
        let data = sample(20);

        eeprom.write(5, &data).unwrap();

        let mock = eeprom.release();
        let writes: StdVec<(u8, usize)> = mock
            .page_writes
            .iter()
            .map(|(_, frame)| (frame[0], frame.len() - 1))
            .collect();
        assert_eq!(writes, vec![(5, 3), (8, 8), (16, 8), (24, 1)]);
        assert!(mock.page_writes.iter().all(|(addr, _)| *addr == BL24C02F_ADDRESS));
        assert_eq!(&mock.memory[5..25], &data[..]);
    }

    #[test]
    fn short_writes_wrap_within_the_page() {
        let mut eeprom = Eeprom::bl24c02f(MockEeprom::new(0));

        eeprom.write(6, &[1, 2, 3, 4]).unwrap();

        let mock = eeprom.release();
        assert_eq!(mock.page_writes.len(), 1);
        assert_eq!(&mock.memory[0..8], &[3, 4, 0xFF, 0xFF, 0xFF, 0xFF, 1, 2]);
    }

    #[test]
    fn reads_back_what_was_written() {
        let mut eeprom = Eeprom::bl24c02f(MockEeprom::new(2));

        eeprom.write_byte(0x42, 0xA5).unwrap();
        assert_eq!(eeprom.read_byte(0x42), Ok(0xA5));

        let mut buf = [0u8; 4];
        eeprom.read(0x40, &mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF, 0xA5, 0xFF]);
    }

    #[test]
    fn out_of_range_accesses_are_rejected() {
        let mut eeprom = Eeprom::bl24c02f(MockEeprom::new(0));

        assert_eq!(eeprom.write(250, &[0; 7]), Err(Error::InvalidParameter));
        assert_eq!(eeprom.read(256, &mut [0; 1]), Err(Error::InvalidParameter));
        assert!(eeprom.write(248, &[0; 8]).is_ok());
        assert!(eeprom.release().page_writes.len() == 1);
    }

    #[test]
    fn first_failing_segment_aborts() {
        let mut mock = MockEeprom::new(0);
        mock.fail_page_write = Some(1);
        let mut eeprom = Eeprom::bl24c02f(mock);

        assert_eq!(eeprom.write(0, &sample(24)), Err(Error::Error));
        assert_eq!(eeprom.release().page_writes.len(), 1);
    }

    #[test]
    fn busy_device_times_out() {
        let mut eeprom = Eeprom::new(MockEeprom::new(10), BL24C02F_ADDRESS, BL24C02F, 10).unwrap();
        assert_eq!(eeprom.write(0, &[1]), Err(Error::Timeout));

        let mut eeprom = Eeprom::new(MockEeprom::new(10), BL24C02F_ADDRESS, BL24C02F, 11).unwrap();
        assert_eq!(eeprom.write(0, &[1]), Ok(()));
    }

    #[test]
    fn unsupported_geometries_are_rejected() {
        let big_pages = Geometry {
            page_size: 128,
            ..BL24C02F
        };
        let no_address = Geometry {
            address_bytes: 0,
            ..BL24C02F
        };
        assert!(Eeprom::new(MockEeprom::new(0), 0x50, big_pages, 1).is_err());
        assert!(Eeprom::new(MockEeprom::new(0), 0x50, no_address, 1).is_err());
    }

    #[test]
    fn empty_pages_are_rejected() {
        let geometry = Geometry {
            page_size: 0,
            ..BL24C02F
        };
        assert_eq!(
            Eeprom::new(MockEeprom::new(0), 0x50, geometry, 1).err(),
            Some(Error::InvalidParameter)
        );
    }

    #[test]
    fn capacity_must_fit_the_address_width() {
        let too_large = Geometry {
            capacity: 512,
            ..BL24C02F
        };
        assert_eq!(
            Eeprom::new(MockEeprom::new(0), 0x50, too_large, 1).err(),
            Some(Error::InvalidParameter)
        );

        let two_byte = Geometry {
            capacity: 512,
            page_size: 16,
            address_bytes: 2,
        };
        assert!(Eeprom::new(MockEeprom::new(0), 0x50, two_byte, 1).is_ok());
    }
}
