// License below.
//! Implements parsing of the iPod firmware master image.
//!
//! A full firmware partition begins with a branded warning header,
//! the `"]ih["` magic at 0x100, and a directory of 40-byte entries
//! from 0x4200. Each entry names one embedded image by a reversed
//! four-byte type code — `"soso"` on disk is the `osos` operating
//! system image — together with its file offset, size, load address
//! and entry point. The directory ends at the first entry without
//! the `"!ATA"` signature.
#![warn(missing_docs)]

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use super::error::PodError;

/// Offset of the magic bytes within the image.
pub const MAGIC_OFFSET: usize = 0x100;

/// The master header magic.
pub const MAGIC: &[u8; 4] = b"]ih[";

/// Offset of the first directory entry.
pub const DIRECTORY_OFFSET: usize = 0x4200;

/// Size of one directory entry in bytes.
pub const ENTRY_SIZE: usize = 40;

/// Signature opening every directory entry.
pub const ENTRY_SIGNATURE: &[u8; 4] = b"!ATA";

/// The kind of an embedded firmware image.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ImageKind {
    #[doc = "The operating system image."]       Osos,
    #[doc = "The resource image."]               Rsrc,
    #[doc = "The updater image."]                Aupd,
    #[doc = "The hibernation image."]            Hibe,
    #[doc = "Any type code this code predates."] Other([u8; 4]),
}

impl ImageKind {
    /// Decodes a type code, un-reversing the on-disk byte order.
    fn from_reversed(raw: &[u8]) -> ImageKind {
        let code = [raw[3], raw[2], raw[1], raw[0]];
        match &code {
            b"osos" => ImageKind::Osos,
            b"rsrc" => ImageKind::Rsrc,
            b"aupd" => ImageKind::Aupd,
            b"hibe" => ImageKind::Hibe,
            _ => ImageKind::Other(code),
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ImageKind::Osos => write!(f, "osos"),
            ImageKind::Rsrc => write!(f, "rsrc"),
            ImageKind::Aupd => write!(f, "aupd"),
            ImageKind::Hibe => write!(f, "hibe"),
            ImageKind::Other(code) => write!(f, "{}", String::from_utf8_lossy(&code)),
        }
    }
}

/// One entry of the firmware directory.
#[derive(Debug, Clone, Copy)]
pub struct ImageEntry {
    /// What the image is.
    pub kind: ImageKind,
    /// Image version stamp.
    pub version: u32,
    /// Payload offset within the firmware file.
    pub offset: u32,
    /// Payload size in bytes.
    pub size: u32,
    /// Guest address the payload is loaded at.
    pub load_addr: u32,
    /// Guest address execution starts at, relative to the load address.
    pub entry_offset: u32,
    /// Payload checksum stamp.
    pub checksum: u32,
    /// Target device identifier.
    pub dev_id: u32,
}

impl ImageEntry {
    /// Absolute guest entry point of this image.
    pub fn entry_point(&self) -> u32 {
        self.load_addr.wrapping_add(self.entry_offset)
    }
}

/// Checks whether a byte buffer carries the firmware master header.
pub fn has_master_header(image: &[u8]) -> bool {
    image.len() >= MAGIC_OFFSET + 4 && &image[MAGIC_OFFSET..MAGIC_OFFSET + 4] == MAGIC
}

/// Parses the firmware directory out of a master image.
///
/// # Returns
/// - `Ok`: All entries up to the first non-`"!ATA"` signature.
/// - `Err`: The magic is missing or the directory is truncated.
pub fn parse_directory(image: &[u8]) -> Result<Vec<ImageEntry>, PodError> {
    if !has_master_header(image) {
        return Err(PodError::InvalidFirmwareImage(
            "master header magic \"]ih[\" not found at 0x100".to_string()));
    }

    let mut entries = Vec::new();
    let mut at = DIRECTORY_OFFSET;
    loop {
        if at + ENTRY_SIZE > image.len() {
            if entries.is_empty() {
                return Err(PodError::InvalidFirmwareImage(
                    "directory truncated before the first entry".to_string()));
            }
            break;
        }
        let raw = &image[at..at + ENTRY_SIZE];
        if &raw[0..4] != ENTRY_SIGNATURE { break; }

        let entry = ImageEntry {
            kind:         ImageKind::from_reversed(&raw[4..8]),
            version:      LittleEndian::read_u32(&raw[8..]),
            offset:       LittleEndian::read_u32(&raw[12..]),
            size:         LittleEndian::read_u32(&raw[16..]),
            load_addr:    LittleEndian::read_u32(&raw[20..]),
            entry_offset: LittleEndian::read_u32(&raw[24..]),
            checksum:     LittleEndian::read_u32(&raw[28..]),
            dev_id:       LittleEndian::read_u32(&raw[32..]),
        };
        debug!("Firmware directory entry: {} at {:#010X}, {} bytes, load {:#010X}.",
               entry.kind, entry.offset, entry.size, entry.load_addr);
        entries.push(entry);
        at += ENTRY_SIZE;
    }
    Ok(entries)
}

/// Borrows an entry's payload out of the firmware file.
pub fn payload<'a>(image: &'a [u8], entry: &ImageEntry) -> Result<&'a [u8], PodError> {
    let from = entry.offset as usize;
    let to = from + entry.size as usize;
    if to > image.len() {
        return Err(PodError::InvalidFirmwareImage(
            format!("{} payload runs past the end of the file", entry.kind)));
    }
    Ok(&image[from..to])
}


#[cfg(test)]
mod test {
    use super::*;

    fn build_image() -> Vec<u8> {
        let mut image = vec![0u8; 0x5000];
        image[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(MAGIC);

        let mut entry = vec![0u8; ENTRY_SIZE];
        entry[0..4].copy_from_slice(ENTRY_SIGNATURE);
        entry[4..8].copy_from_slice(b"soso"); // Reversed "osos".
        entry[12..16].copy_from_slice(&0x4800u32.to_le_bytes()); // Offset.
        entry[16..20].copy_from_slice(&0x10u32.to_le_bytes());   // Size.
        entry[20..24].copy_from_slice(&0x10000000u32.to_le_bytes());
        entry[24..28].copy_from_slice(&0x100u32.to_le_bytes());
        image[DIRECTORY_OFFSET..DIRECTORY_OFFSET + ENTRY_SIZE].copy_from_slice(&entry);

        for i in 0..0x10usize {
            image[0x4800 + i] = i as u8;
        }
        image
    }

    #[test]
    fn parses_a_single_osos_entry() {
        let image = build_image();
        let entries = parse_directory(&image).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ImageKind::Osos);
        assert_eq!(entries[0].load_addr, 0x10000000);
        assert_eq!(entries[0].entry_point(), 0x10000100);

        let bytes = payload(&image, &entries[0]).unwrap();
        assert_eq!(bytes.len(), 0x10);
        assert_eq!(bytes[5], 5);
    }

    #[test]
    fn directory_stops_at_a_foreign_signature() {
        let mut image = build_image();
        let second = DIRECTORY_OFFSET + ENTRY_SIZE;
        image[second..second + 4].copy_from_slice(b"????");
        assert_eq!(parse_directory(&image).unwrap().len(), 1);
    }

    #[test]
    fn missing_magic_is_rejected() {
        let image = vec![0u8; 0x5000];
        assert!(!has_master_header(&image));
        assert!(parse_directory(&image).is_err());
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
