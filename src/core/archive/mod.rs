// ─── Archives ───
// Zip-compatible package archives: reading subtrees out, zipping trees up.

pub mod reader;
pub mod writer;

pub use reader::{ExtractOptions, Extraction, PackageArchive};
pub use writer::zip_directory;

#[cfg(test)]
pub(crate) mod testing {
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Write a fixture archive. Names ending in `/` become directory entries.
    pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default();
        for (name, bytes) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(bytes).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    /// Write a single stored entry whose central directory record claims an
    /// uncompressed size of `claimed` bytes.
    pub fn write_archive_claiming_size(path: &Path, name: &str, bytes: &[u8], claimed: u64) {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .large_file(true);
        let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer.start_file(name, options).unwrap();
        writer.write_all(bytes).unwrap();
        let mut zip = writer.finish().unwrap().into_inner();

        let central = zip
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .expect("central directory header");
        let u16_at = |zip: &[u8], at: usize| u16::from_le_bytes([zip[at], zip[at + 1]]) as usize;
        let size32 = central + 24;
        if zip[size32..size32 + 4] == [0xff; 4] {
            // Sizes live in the zip64 extended information field.
            let mut at = central + 46 + u16_at(&zip[..], central + 28);
            let end = at + u16_at(&zip[..], central + 30);
            while at + 4 <= end {
                let (id, len) = (u16_at(&zip[..], at), u16_at(&zip[..], at + 2));
                if id == 0x0001 {
                    zip[at + 4..at + 12].copy_from_slice(&claimed.to_le_bytes());
                    break;
                }
                at += 4 + len;
            }
        } else {
            let clamped = claimed.min(u64::from(u32::MAX - 1)) as u32;
            zip[size32..size32 + 4].copy_from_slice(&clamped.to_le_bytes());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, zip).unwrap();
    }
}
