#![allow(dead_code)]

use std::path::Path;

use image::{Rgba, RgbaImage};

/// Transparent `width x height` image with an opaque rectangle `[x0, x1) x [y0, y1)`.
pub fn sprite(width: u32, height: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Rgba([180, 90, 30, 255]));
        }
    }
    img
}

pub fn write_png(root: &Path, relative: &str, img: &RgbaImage) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    img.save(&path).unwrap();
}

pub fn read(root: &Path, relative: &str) -> Vec<u8> {
    std::fs::read(root.join(relative)).unwrap()
}

pub fn open(root: &Path, relative: &str) -> RgbaImage {
    image::open(root.join(relative)).unwrap().to_rgba8()
}
