//! Reads the build number out of a host DLL's `VS_VERSIONINFO` resource.
//!
//! The file is parsed from disk so that the identity is known before the
//! module is mapped into the process.

use std::fs;
use std::io;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use cryshim_abi::WordSize;
use thiserror::Error;

use crate::builds::BuildIdentity;

const MACHINE_I386: u16 = 0x014c;
const MACHINE_AMD64: u16 = 0x8664;
const OPTIONAL_MAGIC_PE32: u16 = 0x010b;
const OPTIONAL_MAGIC_PE32_PLUS: u16 = 0x020b;
const RESOURCE_DIRECTORY_INDEX: usize = 2;
const RT_VERSION: u32 = 16;
const VERSION_RESOURCE_ID: u32 = 1;
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
const SUBDIRECTORY_FLAG: u32 = 0x8000_0000;

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("not a PE image: {0}")]
    NotPe(&'static str),

    #[error("unsupported machine type {0:#06x}")]
    UnsupportedMachine(u16),

    #[error("the image has no version resource")]
    NoVersionResource,

    #[error("malformed version resource: {0}")]
    Malformed(&'static str),

    #[error("image truncated at offset {0:#x}")]
    Truncated(usize),
}

pub type Result<T> = std::result::Result<T, VersionError>;

/// `dwFileVersionMS` / `dwFileVersionLS` split into words, e.g. 1.1.1.6156.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
}

impl FileVersion {
    fn from_words(ms: u32, ls: u32) -> Self {
        Self {
            major: (ms >> 16) as u16,
            minor: ms as u16,
            patch: (ls >> 16) as u16,
            build: ls as u16,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageVersion {
    pub word_size: WordSize,
    pub file_version: FileVersion,
}

impl ImageVersion {
    pub fn identity(&self) -> BuildIdentity {
        BuildIdentity::new(u32::from(self.file_version.build), self.word_size)
    }
}

struct Image<'a> {
    bytes: &'a [u8],
}

/// `base + delta`, refusing offsets that do not fit the address space.
fn offset(base: usize, delta: usize) -> Result<usize> {
    base.checked_add(delta).ok_or(VersionError::Truncated(base))
}

impl<'a> Image<'a> {
    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(VersionError::Truncated(offset))
    }

    fn u16(&self, offset: usize) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.slice(offset, 2)?))
    }

    fn u32(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }
}

#[derive(Clone, Copy, Debug)]
struct Section {
    virtual_address: u32,
    virtual_size: u32,
    raw_size: u32,
    raw_offset: u32,
}

struct PeFile<'a> {
    image: Image<'a>,
    word_size: WordSize,
    sections: Vec<Section>,
    resource_rva: u32,
}

impl<'a> PeFile<'a> {
    fn parse(bytes: &'a [u8]) -> Result<Self> {
        let image = Image { bytes };

        if image.slice(0, 2).map_err(|_| VersionError::NotPe("file too small"))? != b"MZ" {
            return Err(VersionError::NotPe("missing MZ signature"));
        }
        let nt = image.u32(0x3C)? as usize;
        if image.slice(nt, 4)? != b"PE\0\0" {
            return Err(VersionError::NotPe("missing PE signature"));
        }

        let coff = offset(nt, 4)?;
        let machine = image.u16(coff)?;
        let word_size = match machine {
            MACHINE_I386 => WordSize::Bits32,
            MACHINE_AMD64 => WordSize::Bits64,
            other => return Err(VersionError::UnsupportedMachine(other)),
        };
        let section_count = image.u16(coff + 2)? as usize;
        let optional_size = image.u16(coff + 16)? as usize;

        let optional = coff + 20;
        let (count_offset, directories_offset) = match image.u16(optional)? {
            OPTIONAL_MAGIC_PE32 => (92, 96),
            OPTIONAL_MAGIC_PE32_PLUS => (108, 112),
            _ => return Err(VersionError::NotPe("unknown optional header magic")),
        };
        let directory_count = image.u32(optional + count_offset)? as usize;
        let resource_rva = if directory_count > RESOURCE_DIRECTORY_INDEX {
            image.u32(optional + directories_offset + RESOURCE_DIRECTORY_INDEX * 8)?
        } else {
            0
        };

        let table = optional + optional_size;
        let sections = (0..section_count)
            .map(|i| {
                let header = table + i * 40;
                Ok(Section {
                    virtual_size: image.u32(header + 8)?,
                    virtual_address: image.u32(header + 12)?,
                    raw_size: image.u32(header + 16)?,
                    raw_offset: image.u32(header + 20)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { image, word_size, sections, resource_rva })
    }

    fn rva_to_offset(&self, rva: u32) -> Result<usize> {
        self.sections
            .iter()
            .find(|s| {
                let extent = s.virtual_size.max(s.raw_size);
                rva >= s.virtual_address && rva - s.virtual_address < extent
            })
            .ok_or(VersionError::Malformed("RVA outside of every section"))
            .and_then(|s| {
                (rva - s.virtual_address)
                    .checked_add(s.raw_offset)
                    .map(|file_offset| file_offset as usize)
                    .ok_or(VersionError::Malformed("section raw offset out of range"))
            })
    }

    /// Looks up an entry of a resource directory. `None` as id takes the
    /// first ID entry (used for the language level).
    fn find_entry(&self, directory: usize, id: Option<u32>) -> Result<Option<u32>> {
        let named = self.image.u16(directory + 12)? as usize;
        let ids = self.image.u16(directory + 14)? as usize;
        for i in named..named + ids {
            let entry = directory + 16 + i * 8;
            let entry_id = self.image.u32(entry)?;
            if id.map_or(true, |wanted| wanted == entry_id) {
                return Ok(Some(self.image.u32(entry + 4)?));
            }
        }
        Ok(None)
    }

    fn version_resource(&self) -> Result<&'a [u8]> {
        if self.resource_rva == 0 {
            return Err(VersionError::NoVersionResource);
        }
        let root = self.rva_to_offset(self.resource_rva)?;

        let mut directory = root;
        for id in [Some(RT_VERSION), Some(VERSION_RESOURCE_ID)] {
            let next = self.find_entry(directory, id)?.ok_or(VersionError::NoVersionResource)?;
            if next & SUBDIRECTORY_FLAG == 0 {
                return Err(VersionError::Malformed("expected a resource subdirectory"));
            }
            directory = offset(root, (next & !SUBDIRECTORY_FLAG) as usize)?;
        }

        let data_entry = self.find_entry(directory, None)?.ok_or(VersionError::NoVersionResource)?;
        if data_entry & SUBDIRECTORY_FLAG != 0 {
            return Err(VersionError::Malformed("expected a resource data entry"));
        }
        let data_entry = offset(root, data_entry as usize)?;
        let data_rva = self.image.u32(data_entry)?;
        let data_size = self.image.u32(data_entry + 4)? as usize;

        self.image.slice(self.rva_to_offset(data_rva)?, data_size)
    }
}

fn parse_fixed_file_info(resource: &[u8]) -> Result<FileVersion> {
    let image = Image { bytes: resource };

    let key: Vec<u16> = "VS_VERSION_INFO\0".encode_utf16().collect();
    let key_bytes = image.slice(6, key.len() * 2).map_err(|_| VersionError::Malformed("resource too small"))?;
    let matches = key_bytes
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .eq(key.iter().copied());
    if !matches {
        return Err(VersionError::Malformed("missing VS_VERSION_INFO key"));
    }

    // the value is 32-bit aligned after the key
    let fixed = (6 + key.len() * 2 + 3) & !3;
    if image.u32(fixed)? != FIXED_FILE_INFO_SIGNATURE {
        return Err(VersionError::Malformed("bad VS_FIXEDFILEINFO signature"));
    }
    Ok(FileVersion::from_words(image.u32(fixed + 8)?, image.u32(fixed + 12)?))
}

pub fn read_image_version(bytes: &[u8]) -> Result<ImageVersion> {
    let pe = PeFile::parse(bytes)?;
    let file_version = parse_fixed_file_info(pe.version_resource()?)?;
    Ok(ImageVersion { word_size: pe.word_size, file_version })
}

pub fn read_image_version_from_file(path: impl AsRef<Path>) -> Result<ImageVersion> {
    let bytes = fs::read(path.as_ref())?;
    read_image_version(&bytes)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn put16(buf: &mut [u8], at: usize, v: u16) {
        LittleEndian::write_u16(&mut buf[at..at + 2], v);
    }

    fn put32(buf: &mut [u8], at: usize, v: u32) {
        LittleEndian::write_u32(&mut buf[at..at + 4], v);
    }

    fn resource_directory(buf: &mut [u8], at: usize, id: u32, target: u32) {
        put16(buf, at + 14, 1);
        put32(buf, at + 16, id);
        put32(buf, at + 20, target);
    }

    /// A minimal DLL image: headers plus one `.rsrc` section holding a
    /// version resource for `1.1.<build>`.
    pub(crate) fn synthetic_image(machine: u16, build: u16, resource_type: u32) -> Vec<u8> {
        const NT: usize = 0x40;
        const RSRC_RVA: u32 = 0x1000;
        const RSRC_FILE: usize = 0x200;

        let pe32_plus = machine == MACHINE_AMD64;
        let optional_size = if pe32_plus { 240 } else { 224 };
        let mut buf = vec![0u8; RSRC_FILE + 0x100];

        buf[0..2].copy_from_slice(b"MZ");
        put32(&mut buf, 0x3C, NT as u32);
        buf[NT..NT + 4].copy_from_slice(b"PE\0\0");
        let coff = NT + 4;
        put16(&mut buf, coff, machine);
        put16(&mut buf, coff + 2, 1);
        put16(&mut buf, coff + 16, optional_size as u16);

        let optional = coff + 20;
        let (magic, count_at, dirs_at) = if pe32_plus {
            (OPTIONAL_MAGIC_PE32_PLUS, 108, 112)
        } else {
            (OPTIONAL_MAGIC_PE32, 92, 96)
        };
        put16(&mut buf, optional, magic);
        put32(&mut buf, optional + count_at, 16);
        put32(&mut buf, optional + dirs_at + 2 * 8, RSRC_RVA);
        put32(&mut buf, optional + dirs_at + 2 * 8 + 4, 0xB4);

        let section = optional + optional_size;
        buf[section..section + 5].copy_from_slice(b".rsrc");
        put32(&mut buf, section + 8, 0x100);
        put32(&mut buf, section + 12, RSRC_RVA);
        put32(&mut buf, section + 16, 0x100);
        put32(&mut buf, section + 20, RSRC_FILE as u32);

        let r = RSRC_FILE;
        resource_directory(&mut buf, r, resource_type, SUBDIRECTORY_FLAG | 0x18);
        resource_directory(&mut buf, r + 0x18, VERSION_RESOURCE_ID, SUBDIRECTORY_FLAG | 0x30);
        resource_directory(&mut buf, r + 0x30, 0x409, 0x48);
        put32(&mut buf, r + 0x48, RSRC_RVA + 0x58);
        put32(&mut buf, r + 0x4C, 92);

        let v = r + 0x58;
        put16(&mut buf, v, 92);
        put16(&mut buf, v + 2, 52);
        for (i, unit) in "VS_VERSION_INFO\0".encode_utf16().enumerate() {
            put16(&mut buf, v + 6 + i * 2, unit);
        }
        put32(&mut buf, v + 40, FIXED_FILE_INFO_SIGNATURE);
        put32(&mut buf, v + 44, 0x0001_0000);
        put32(&mut buf, v + 48, 0x0001_0001);
        put32(&mut buf, v + 52, 0x0001_0000 | u32::from(build));

        buf
    }

    #[test]
    fn reads_32_bit_build() {
        let image = synthetic_image(MACHINE_I386, 6156, RT_VERSION);
        let version = read_image_version(&image).unwrap();
        assert_eq!(version.word_size, WordSize::Bits32);
        assert_eq!(version.file_version, FileVersion { major: 1, minor: 1, patch: 1, build: 6156 });
        assert_eq!(version.identity(), BuildIdentity::new(6156, WordSize::Bits32));
    }

    #[test]
    fn reads_64_bit_build() {
        let image = synthetic_image(MACHINE_AMD64, 6729, RT_VERSION);
        let version = read_image_version(&image).unwrap();
        assert_eq!(version.identity(), BuildIdentity::new(6729, WordSize::Bits64));
    }

    #[test]
    fn missing_version_resource() {
        let image = synthetic_image(MACHINE_I386, 6156, 3);
        assert!(matches!(read_image_version(&image), Err(VersionError::NoVersionResource)));
    }

    #[test]
    fn bad_signature() {
        let mut image = synthetic_image(MACHINE_I386, 6156, RT_VERSION);
        put32(&mut image, 0x200 + 0x58 + 40, 0xDEAD_BEEF);
        assert!(matches!(read_image_version(&image), Err(VersionError::Malformed(_))));
    }

    #[test]
    fn rejects_non_pe_and_foreign_machines() {
        assert!(matches!(read_image_version(b"ELF"), Err(VersionError::NotPe(_))));
        assert!(matches!(read_image_version(&[]), Err(VersionError::NotPe(_))));

        let arm = synthetic_image(0x01c0, 6156, RT_VERSION);
        assert!(matches!(read_image_version(&arm), Err(VersionError::UnsupportedMachine(0x01c0))));
    }

    #[test]
    fn section_offset_past_the_address_space() {
        let mut image = synthetic_image(MACHINE_I386, 6156, RT_VERSION);
        let section = 0x40 + 4 + 20 + 224;
        put32(&mut image, section + 20, 0xFFFF_FFF8);
        // resource root 0x10 into the section
        put32(&mut image, 0x40 + 4 + 20 + 96 + 2 * 8, 0x1010);
        assert!(matches!(read_image_version(&image), Err(VersionError::Malformed(_))));
    }

    #[test]
    fn truncated_image() {
        let image = synthetic_image(MACHINE_I386, 6156, RT_VERSION);
        assert!(read_image_version(&image[..0x150]).is_err());
    }
}
