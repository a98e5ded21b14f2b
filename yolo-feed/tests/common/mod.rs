use anyhow::Result;
use image::{Rgb, RgbImage};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

/// Write a solid color PNG image.
pub fn write_png(path: &Path, width: u32, height: u32, value: u8) -> Result<()> {
    let image = RgbImage::from_pixel(width, height, Rgb([value, value, value]));
    image.save(path)?;
    Ok(())
}

/// Write `count` PNG images named `<index>.png` and a manifest listing them with one box each.
pub fn write_dataset(dir: &Path, manifest: &str, count: usize, box_text: &str) -> Result<PathBuf> {
    let mut text = String::new();

    for index in 0..count {
        let image_path = dir.join(format!("{}.png", index));
        write_png(&image_path, 100, 100, index as u8)?;
        writeln!(text, "{} {}", image_path.display(), box_text)?;
    }

    let manifest_path = dir.join(manifest);
    fs::write(&manifest_path, text)?;
    Ok(manifest_path)
}
