use std::fs::File;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::error::{LoaderError, LoaderResult};

/// Zip the contents of `source` into `dest`, entry names relative to `source`.
///
/// Directories get their own `name/` entries. Children are written in sorted
/// order so the same tree always produces the same entry list.
pub fn zip_directory(source: &Path, dest: &Path) -> LoaderResult<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LoaderError::io(parent, e))?;
    }
    let file = File::create(dest).map_err(|e| LoaderError::io(dest, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    add_dir(&mut writer, source, source, options)?;
    writer.finish()?;
    Ok(())
}

fn add_dir(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: SimpleFileOptions,
) -> LoaderResult<()> {
    let mut children = std::fs::read_dir(dir)
        .map_err(|e| LoaderError::io(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| LoaderError::io(dir, e))?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let path = child.path();
        let relative = path
            .strip_prefix(root)
            .map_err(|e| LoaderError::Other(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if path.is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
            add_dir(writer, root, &path, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut input = File::open(&path).map_err(|e| LoaderError::io(&path, e))?;
            std::io::copy(&mut input, writer).map_err(|e| LoaderError::io(&path, e))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zips_nested_tree_with_forward_slash_names() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("work");
        std::fs::create_dir_all(source.join("assets/textures")).unwrap();
        std::fs::write(source.join("assets/textures/a.png"), b"png-bytes").unwrap();
        let dest = dir.path().join("out").join("overlay.zip");

        zip_directory(&source, &dest).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"assets/".to_string()));
        assert!(names.contains(&"assets/textures/".to_string()));
        assert!(names.contains(&"assets/textures/a.png".to_string()));

        let mut entry = archive.by_name("assets/textures/a.png").unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
        assert_eq!(bytes, b"png-bytes");
    }
}
