// License below.
//! Implements the sector-addressable disk image backing the ATA
//! controller.
#![warn(missing_docs)]

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use super::error::PodError;

/// Size of one disk sector in bytes.
pub const SECTOR_SIZE: usize = 512;

/// A flat array of 512-byte sectors, optionally backed by a host
/// file.
///
/// All reads and writes go through the ATA state machine; nothing
/// else touches the image. Writes stay in memory until `flush`.
pub struct DiskImage {
    sectors: Vec<u8>,
    path: Option<PathBuf>,
}

impl DiskImage {
    /// Creates a blank, zero-filled image of `count` sectors.
    pub fn blank(count: usize) -> DiskImage {
        DiskImage {
            sectors: vec![0u8; count * SECTOR_SIZE],
            path: None,
        }
    }

    /// Loads a disk image from a host file.
    ///
    /// A trailing partial sector is padded with zeroes.
    pub fn from_file(fp: &Path) -> Result<DiskImage, PodError> {
        trace!("Loading disk image `{}`.", fp.display());
        let mut bytes = Vec::new();
        File::open(fp)?.read_to_end(&mut bytes)?;
        let partial = bytes.len() % SECTOR_SIZE;
        if partial != 0 {
            warn!("Disk image is not sector aligned; padding the last {} bytes.", SECTOR_SIZE - partial);
            bytes.resize(bytes.len() + SECTOR_SIZE - partial, 0);
        }
        info!("Disk image holds {} sectors.", bytes.len() / SECTOR_SIZE);
        Ok(DiskImage {
            sectors: bytes,
            path: Some(fp.to_path_buf()),
        })
    }

    /// Wraps an in-memory byte buffer as a disk image.
    pub fn from_bytes(mut bytes: Vec<u8>) -> DiskImage {
        let partial = bytes.len() % SECTOR_SIZE;
        if partial != 0 {
            bytes.resize(bytes.len() + SECTOR_SIZE - partial, 0);
        }
        DiskImage { sectors: bytes, path: None }
    }

    /// Number of sectors in the image.
    pub fn sector_count(&self) -> u64 {
        (self.sectors.len() / SECTOR_SIZE) as u64
    }

    /// Borrows the whole image, e.g. for firmware header parsing.
    pub fn bytes(&self) -> &[u8] {
        &self.sectors
    }

    /// Reads one sector into `buf`.
    ///
    /// # Returns
    /// `false` if the LBA is out of range; `buf` is zero-filled
    /// then, matching what the bus-side ATA fault path hands out.
    pub fn read_sector(&self, lba: u64, buf: &mut [u8; SECTOR_SIZE]) -> bool {
        if lba >= self.sector_count() {
            for b in buf.iter_mut() { *b = 0; }
            return false;
        }
        let at = (lba as usize) * SECTOR_SIZE;
        buf.copy_from_slice(&self.sectors[at..at + SECTOR_SIZE]);
        true
    }

    /// Writes one sector from `buf`.
    ///
    /// # Returns
    /// `false` if the LBA is out of range; nothing is written then.
    pub fn write_sector(&mut self, lba: u64, buf: &[u8; SECTOR_SIZE]) -> bool {
        if lba >= self.sector_count() {
            return false;
        }
        let at = (lba as usize) * SECTOR_SIZE;
        self.sectors[at..at + SECTOR_SIZE].copy_from_slice(buf);
        true
    }

    /// Writes the image back to its backing file, if any.
    pub fn flush(&self) -> Result<(), PodError> {
        if let Some(ref fp) = self.path {
            trace!("Flushing disk image to `{}`.", fp.display());
            File::create(fp)?.write_all(&self.sectors)?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sector_round_trip() {
        let mut disk = DiskImage::blank(8);
        let mut sector = [0u8; SECTOR_SIZE];
        for (i, b) in sector.iter_mut().enumerate() { *b = i as u8; }
        assert!(disk.write_sector(5, &sector));

        let mut readback = [0xFFu8; SECTOR_SIZE];
        assert!(disk.read_sector(5, &mut readback));
        assert_eq!(&sector[..], &readback[..]);
    }

    #[test]
    fn out_of_range_reads_zero_fill() {
        let disk = DiskImage::blank(2);
        let mut buf = [0xAAu8; SECTOR_SIZE];
        assert!(!disk.read_sector(2, &mut buf));
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn partial_images_are_padded() {
        let disk = DiskImage::from_bytes(vec![1u8; SECTOR_SIZE + 7]);
        assert_eq!(disk.sector_count(), 2);
        let mut buf = [0u8; SECTOR_SIZE];
        assert!(disk.read_sector(1, &mut buf));
        assert_eq!(buf[6], 1);
        assert_eq!(buf[7], 0);
    }
}


/*
Licensed to the Apache Software Foundation (ASF) under one
or more contributor license agreements.  See the NOTICE file
distributed with this work for additional information
regarding copyright ownership.  The ASF licenses this file
to you under the Apache License, Version 2.0 (the
"License"); you may not use this file except in compliance
with the License.  You may obtain a copy of the License at

  http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing,
software distributed under the License is distributed on an
"AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
KIND, either express or implied.  See the License for the
specific language governing permissions and limitations
under the License.
*/
