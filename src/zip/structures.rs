use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io::{Cursor, Read};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Version needed to extract: 2.0 (DEFLATE).
pub const VERSION_NEEDED: u16 = 20;

/// Version made by: MS-DOS host, APPNOTE 2.0.
pub const VERSION_MADE_BY: u16 = 20;

/// General purpose flag bit 11: file name is UTF-8.
pub const FLAG_UTF8_NAME: u16 = 0x0800;

/// DOS-encoded modification time and date as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const EPOCH: Self = Self {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// Encode a calendar timestamp, clamping years outside 1980..=2107.
    pub fn from_naive(ts: NaiveDateTime) -> Self {
        if ts.year() < 1980 {
            return Self::EPOCH;
        }
        let year = (ts.year() - 1980).min(127) as u16;
        let date = (year << 9) | ((ts.month() as u16) << 5) | ts.day() as u16;
        let time =
            ((ts.hour() as u16) << 11) | ((ts.minute() as u16) << 5) | (ts.second() as u16 / 2);
        Self { time, date }
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk EOCD without a comment.
    pub fn new(total_entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    /// Parse an EOCD record. Returns `None` if the slice is too short or the
    /// signature does not match.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return None;
        }

        let mut cursor = Cursor::new(&data[4..]);

        Some(Self {
            disk_number: cursor.read_u16::<LittleEndian>().ok()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>().ok()?,
            disk_entries: cursor.read_u16::<LittleEndian>().ok()?,
            total_entries: cursor.read_u16::<LittleEndian>().ok()?,
            cd_size: cursor.read_u32::<LittleEndian>().ok()?,
            cd_offset: cursor.read_u32::<LittleEndian>().ok()?,
            comment_len: cursor.read_u16::<LittleEndian>().ok()?,
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        out.extend_from_slice(Self::SIGNATURE);
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// Header fields shared by the local header and its central directory record.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    pub file_name: String,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl EntryHeader {
    /// Write the 30-byte local file header followed by the file name.
    pub fn write_local(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        let name = self.file_name.as_bytes();
        out.extend_from_slice(LFH_SIGNATURE);
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.extend_from_slice(name);
        Ok(())
    }

    /// Write the central directory record pointing back at `lfh_offset`.
    pub fn write_central(&self, lfh_offset: u32, out: &mut Vec<u8>) -> std::io::Result<()> {
        let name = self.file_name.as_bytes();
        out.extend_from_slice(CDFH_SIGNATURE);
        out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags)?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_u16::<LittleEndian>(0)?; // file comment length
        out.write_u16::<LittleEndian>(0)?; // disk number start
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(0)?; // external attributes
        out.write_u32::<LittleEndian>(lfh_offset)?;
        out.extend_from_slice(name);
        Ok(())
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub is_directory: bool,
}

impl ZipFileEntry {
    /// Parse a central directory record starting at the cursor position.
    ///
    /// Leaves the cursor on the first byte after the record (name, extra field
    /// and comment included).
    pub fn read_central(cursor: &mut Cursor<&[u8]>) -> std::io::Result<Self> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Invalid Central Directory File Header",
            ));
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy conversion keeps non-UTF8 names readable
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
        let is_directory = file_name.ends_with('/');

        let skip = extra_field_length as u64 + file_comment_length as u64;
        let end = cursor.position() + skip;
        if end > cursor.get_ref().len() as u64 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Central Directory record runs past end of directory",
            ));
        }
        cursor.set_position(end);

        Ok(ZipFileEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            last_mod_time,
            last_mod_date,
            is_directory,
        })
    }

    /// Parse modification date to (year, month, day)
    pub fn mod_date(&self) -> (u16, u8, u8) {
        let day = (self.last_mod_date & 0x1F) as u8;
        let month = ((self.last_mod_date >> 5) & 0x0F) as u8;
        let year = ((self.last_mod_date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Parse modification time to (hour, minute, second)
    pub fn mod_time(&self) -> (u8, u8, u8) {
        let second = ((self.last_mod_time & 0x1F) * 2) as u8;
        let minute = ((self.last_mod_time >> 5) & 0x3F) as u8;
        let hour = ((self.last_mod_time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_header() -> EntryHeader {
        EntryHeader {
            file_name: "data.json".to_string(),
            flags: FLAG_UTF8_NAME,
            compression_method: CompressionMethod::Deflate,
            modified: DosDateTime::EPOCH,
            crc32: 0xDEAD_BEEF,
            compressed_size: 5,
            uncompressed_size: 7,
        }
    }

    #[test]
    fn dos_timestamp_round_trips_through_entry_helpers() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 17)
            .unwrap()
            .and_hms_opt(14, 25, 42)
            .unwrap();
        let dos = DosDateTime::from_naive(ts);
        let entry = ZipFileEntry {
            file_name: String::new(),
            compression_method: CompressionMethod::Stored,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: 0,
            last_mod_time: dos.time,
            last_mod_date: dos.date,
            is_directory: false,
        };
        assert_eq!(entry.mod_date(), (2024, 3, 17));
        assert_eq!(entry.mod_time(), (14, 25, 42));
    }

    #[test]
    fn timestamps_before_1980_clamp_to_epoch() {
        let ts = NaiveDate::from_ymd_opt(1975, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(DosDateTime::from_naive(ts), DosDateTime::EPOCH);
    }

    #[test]
    fn local_header_layout() {
        let mut out = Vec::new();
        sample_header().write_local(&mut out).unwrap();

        assert_eq!(out.len(), LFH_SIZE + "data.json".len());
        assert_eq!(&out[0..4], LFH_SIGNATURE);
        assert_eq!(u16::from_le_bytes([out[8], out[9]]), 8);
        assert_eq!(
            u32::from_le_bytes([out[14], out[15], out[16], out[17]]),
            0xDEAD_BEEF
        );
        assert_eq!(u16::from_le_bytes([out[26], out[27]]), 9);
        assert_eq!(&out[30..], b"data.json");
    }

    #[test]
    fn central_record_parses_back() {
        let mut out = Vec::new();
        sample_header().write_central(1234, &mut out).unwrap();
        assert_eq!(out.len(), CDFH_MIN_SIZE + "data.json".len());

        let mut cursor = Cursor::new(out.as_slice());
        let entry = ZipFileEntry::read_central(&mut cursor).unwrap();
        assert_eq!(entry.file_name, "data.json");
        assert_eq!(entry.compression_method, CompressionMethod::Deflate);
        assert_eq!(entry.crc32, 0xDEAD_BEEF);
        assert_eq!(entry.compressed_size, 5);
        assert_eq!(entry.uncompressed_size, 7);
        assert_eq!(entry.lfh_offset, 1234);
        assert_eq!(cursor.position(), out.len() as u64);
    }

    #[test]
    fn eocd_round_trip() {
        let mut out = Vec::new();
        EndOfCentralDirectory::new(3, 150, 900)
            .write_to(&mut out)
            .unwrap();
        assert_eq!(out.len(), EndOfCentralDirectory::SIZE);

        let eocd = EndOfCentralDirectory::from_bytes(&out).unwrap();
        assert_eq!(eocd.total_entries, 3);
        assert_eq!(eocd.disk_entries, 3);
        assert_eq!(eocd.cd_size, 150);
        assert_eq!(eocd.cd_offset, 900);
        assert_eq!(eocd.comment_len, 0);
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        assert!(EndOfCentralDirectory::from_bytes(&[0u8; 22]).is_none());
        assert!(EndOfCentralDirectory::from_bytes(b"PK\x05\x06").is_none());
    }
}
