use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// An in-memory RGBA8 bitmap with EXIF orientation already applied.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The background decode task was torn down before producing a result.
    #[error("decode task for {} did not complete", path.display())]
    Task { path: PathBuf },
}

/// Image decode collaborator: file path in, oriented bitmap out.
pub trait Decode: Send + Sync + 'static {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError>;
}

/// Decoder backed by the `image` crate with EXIF orientation correction.
#[derive(Debug, Clone, Default)]
pub struct ImageDecoder;

impl Decode for ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        let reader = image::ImageReader::open(path)
            .map_err(|source| DecodeError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .with_guessed_format()
            .map_err(|source| DecodeError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let img = reader.decode().map_err(|source| DecodeError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        // Convert to RGBA8 early so orientation ops work on a concrete buffer.
        let mut img = img.to_rgba8();

        let orientation = read_orientation(path).unwrap_or(1);
        match orientation {
            1 => {}
            2 => {
                img = image::imageops::flip_horizontal(&img);
            }
            3 => {
                img = image::imageops::rotate180(&img);
            }
            4 => {
                img = image::imageops::flip_vertical(&img);
            }
            5 => {
                img = image::imageops::rotate90(&img);
                img = image::imageops::flip_horizontal(&img);
            }
            6 => {
                img = image::imageops::rotate90(&img);
            }
            7 => {
                img = image::imageops::rotate270(&img);
                img = image::imageops::flip_horizontal(&img);
            }
            8 => {
                img = image::imageops::rotate270(&img);
            }
            _ => {}
        }

        let (width, height) = img.dimensions();
        Ok(DecodedImage {
            path: path.to_path_buf(),
            width,
            height,
            pixels: img.into_raw(),
        })
    }
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let val = field.value.get_uint(0)?;
    let o = val as u16;
    debug!("exif orientation {} for {}", o, path.display());
    Some(o)
}
