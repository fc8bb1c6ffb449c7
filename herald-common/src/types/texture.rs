//! 纹理负载
//!
//! 上传时编码为 PNG，下载时交给 image crate 识别格式并解码为 RGBA 像素。

use anyhow::{Context, anyhow};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// 解码后的二维 RGBA 像素缓冲
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// 行优先的 RGBA 数据，长度为 `width * height * 4`
    pub pixels: Vec<u8>,
}

impl Texture {
    /// 从原始像素创建纹理，长度不符时返回错误
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(anyhow!(
                "pixel buffer of {} bytes does not match {}x{} RGBA",
                pixels.len(),
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 创建单色纹理
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// 读取单个像素
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let slice = self.pixels.get(offset..offset + 4)?;
        Some([slice[0], slice[1], slice[2], slice[3]])
    }

    /// 解码任意受支持格式的图像字节，失败时返回 `None`
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                log::debug!("Texture decode failed: {}", e);
                return None;
            }
        };
        let rgba = image.to_rgba8();
        Some(Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }

    /// 编码为 PNG 字节流
    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        let image = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", self.width, self.height))?;
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .context("Failed to encode texture as PNG")?;
        Ok(out.into_inner())
    }
}
