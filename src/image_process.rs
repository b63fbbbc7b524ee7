//! Low level filters the plate pipeline is built from.
//!
//! imageproc covers the binary morphology, thresholds, gradients and contour
//! tracing. Gray level morphology with rectangular (non square) structuring
//! elements is not there, so it lives here.

use image::{ GrayImage, Luma, imageops };
use imageproc::contours::{ self, BorderType, Contour };
use imageproc::point::Point;
use imageproc::rect::Rect;
use imageproc::region_labelling::{ connected_components, Connectivity };
use imageproc::{ contrast, gradients };

use std::cmp;
use std::collections::HashSet;

/// Width x height of a rectangular structuring element, anchored at its center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectKernel {
    pub width: u32,
    pub height: u32,
}

impl RectKernel {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// sliding min or max along one axis, pixels outside the image are skipped
fn rect_pass(img: &GrayImage, size: u32, horizontal: bool, pick: fn(u8, u8) -> u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let before = size / 2;
    let after = size.saturating_sub(1) - before;
    let mut out = GrayImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let (pos, len) = if horizontal { (x, width) } else { (y, height) };
            let lo = pos.saturating_sub(before);
            let hi = cmp::min(pos + after, len - 1);
            let mut value = if horizontal { img.get_pixel(lo, y)[0] } else { img.get_pixel(x, lo)[0] };
            for i in lo + 1..=hi {
                let v = if horizontal { img.get_pixel(i, y)[0] } else { img.get_pixel(x, i)[0] };
                value = pick(value, v);
            }
            out.put_pixel(x, y, Luma([value]));
        }
    }
    out
}

pub fn dilate_rect(img: &GrayImage, kernel: RectKernel) -> GrayImage {
    let horizontal = rect_pass(img, kernel.width, true, cmp::max);
    rect_pass(&horizontal, kernel.height, false, cmp::max)
}

pub fn erode_rect(img: &GrayImage, kernel: RectKernel) -> GrayImage {
    let horizontal = rect_pass(img, kernel.width, true, cmp::min);
    rect_pass(&horizontal, kernel.height, false, cmp::min)
}

/// Dilation followed by erosion, fills dark gaps narrower than the kernel.
pub fn close_rect(img: &GrayImage, kernel: RectKernel) -> GrayImage {
    erode_rect(&dilate_rect(img, kernel), kernel)
}

/// closing minus the input: dark details smaller than the kernel on a light surround.
pub fn black_hat(img: &GrayImage, kernel: RectKernel) -> GrayImage {
    let closed = close_rect(img, kernel);
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let value = closed.get_pixel(x, y)[0].saturating_sub(img.get_pixel(x, y)[0]);
        *pixel = Luma([value]);
    }
    out
}

/// Absolute horizontal Scharr response stretched onto [0, 255] using the
/// image's own extremes. A flat response maps to an all zero image.
pub fn normalized_gradient_x(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width, height);
    }
    let gradient = gradients::horizontal_scharr(img);
    let magnitudes: Vec<f32> = gradient.pixels().map(|p| (p[0] as f32).abs()).collect();
    let min = magnitudes.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = magnitudes.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range <= 0.0 {
        return GrayImage::new(width, height);
    }
    let data = magnitudes.iter().map(|v| (255.0 * (v - min) / range) as u8).collect();
    // buffer length always matches width * height here
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Global Otsu threshold, pixels above the level become 255.
pub fn otsu_binarize(img: &GrayImage) -> GrayImage {
    if img.width() == 0 || img.height() == 0 {
        return img.clone();
    }
    let level = contrast::otsu_level(img);
    contrast::threshold(img, level)
}

/// Otsu with the polarity flipped, dark strokes become foreground.
pub fn otsu_binarize_inv(img: &GrayImage) -> GrayImage {
    let mut out = otsu_binarize(img);
    imageops::invert(&mut out);
    out
}

/// Keeps `img` where `mask` is non zero.
pub fn mask_and(img: &GrayImage, mask: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if x >= mask.width() || y >= mask.height() || mask.get_pixel(x, y)[0] == 0 {
            *pixel = Luma([0]);
        }
    }
    out
}

/// Zeroes every 8-connected foreground blob that touches the image edge.
pub fn clear_border(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return img.clone();
    }
    let labels = connected_components(img, Connectivity::Eight, Luma([0u8]));
    let mut touching = HashSet::new();
    for x in 0..width {
        touching.insert(labels.get_pixel(x, 0)[0]);
        touching.insert(labels.get_pixel(x, height - 1)[0]);
    }
    for y in 0..height {
        touching.insert(labels.get_pixel(0, y)[0]);
        touching.insert(labels.get_pixel(width - 1, y)[0]);
    }
    touching.remove(&0);

    let mut out = img.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if touching.contains(&labels.get_pixel(x, y)[0]) {
            *pixel = Luma([0]);
        }
    }
    out
}

/// Outermost boundaries only, holes and nested shapes are dropped.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour<i32>> {
    contours::find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .collect()
}

/// Shoelace area of the polygon through the boundary points.
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points.iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Axis aligned box with inclusive extents, so a single point is 1x1.
pub fn bounding_rect(points: &[Point<i32>]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = cmp::min(min_x, p.x);
        min_y = cmp::min(min_y, p.y);
        max_x = cmp::max(max_x, p.x);
        max_y = cmp::max(max_y, p.y);
    }
    let width = (max_x - min_x + 1) as u32;
    let height = (max_y - min_y + 1) as u32;
    Some(Rect::at(min_x, min_y).of_size(width, height))
}

pub fn aspect_ratio(rect: &Rect) -> f32 {
    rect.width() as f32 / rect.height() as f32
}

/// Copies the part of `img` under `rect`, clipped to the image.
pub fn crop(img: &GrayImage, rect: &Rect) -> GrayImage {
    let x = cmp::max(rect.left(), 0) as u32;
    let y = cmp::max(rect.top(), 0) as u32;
    let width = cmp::min(rect.width(), img.width().saturating_sub(x));
    let height = cmp::min(rect.height(), img.height().saturating_sub(y));
    imageops::crop_imm(img, x, y, width, height).to_image()
}


#[cfg(test)]
mod test {

    use image::{ GrayImage, Luma };
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::point::Point;
    use imageproc::rect::Rect;

    use super::*;

    fn count_foreground(img: &GrayImage) -> usize {
        img.pixels().filter(|p| p[0] != 0).count()
    }

    #[test]
    fn rect_dilation_grows_by_half_kernel() {
        let mut img = GrayImage::new(20, 20);
        img.put_pixel(10, 10, Luma([200]));
        let dilated = dilate_rect(&img, RectKernel::new(5, 3));
        assert_eq!(count_foreground(&dilated), 15);
        assert_eq!(dilated.get_pixel(8, 9)[0], 200);
        assert_eq!(dilated.get_pixel(12, 11)[0], 200);
        assert_eq!(dilated.get_pixel(13, 10)[0], 0);
        assert_eq!(dilated.get_pixel(10, 12)[0], 0);
    }

    #[test]
    fn erosion_ignores_outside_of_image() {
        let img = GrayImage::from_pixel(6, 4, Luma([90]));
        let eroded = erode_rect(&img, RectKernel::new(13, 5));
        assert!(eroded.pixels().all(|p| p[0] == 90));
    }

    #[test]
    fn black_hat_picks_thin_dark_bars() {
        let mut img = GrayImage::from_pixel(40, 20, Luma([220]));
        draw_filled_rect_mut(&mut img, Rect::at(18, 4).of_size(3, 12), Luma([20]));
        let hat = black_hat(&img, RectKernel::new(13, 5));
        assert_eq!(hat.get_pixel(19, 10)[0], 200);
        assert_eq!(hat.get_pixel(5, 10)[0], 0);
        assert_eq!(count_foreground(&hat), 36);
    }

    #[test]
    fn flat_gradient_normalizes_to_zero() {
        let img = GrayImage::from_pixel(30, 10, Luma([77]));
        let gradient = normalized_gradient_x(&img);
        assert_eq!(gradient.dimensions(), (30, 10));
        assert_eq!(count_foreground(&gradient), 0);
    }

    #[test]
    fn gradient_spans_full_range() {
        let mut img = GrayImage::new(30, 10);
        draw_filled_rect_mut(&mut img, Rect::at(15, 0).of_size(15, 10), Luma([255]));
        let gradient = normalized_gradient_x(&img);
        let max = gradient.pixels().map(|p| p[0]).max().unwrap();
        assert_eq!(max, 255);
        assert_eq!(gradient.get_pixel(3, 5)[0], 0);
    }

    #[test]
    fn inverted_otsu_makes_dark_foreground() {
        let mut img = GrayImage::from_pixel(20, 10, Luma([210]));
        draw_filled_rect_mut(&mut img, Rect::at(5, 2).of_size(4, 6), Luma([15]));
        let roi = otsu_binarize_inv(&img);
        assert_eq!(roi.get_pixel(6, 4)[0], 255);
        assert_eq!(roi.get_pixel(0, 0)[0], 0);
        assert_eq!(count_foreground(&roi), 24);
    }

    #[test]
    fn clear_border_keeps_only_interior_blobs() {
        let mut roi = GrayImage::new(40, 20);
        // touches the left edge
        draw_filled_rect_mut(&mut roi, Rect::at(0, 5).of_size(4, 8), Luma([255]));
        // interior
        draw_filled_rect_mut(&mut roi, Rect::at(15, 5).of_size(5, 8), Luma([255]));
        let cleared = clear_border(&roi);
        assert_eq!(cleared.get_pixel(1, 8)[0], 0);
        assert_eq!(cleared.get_pixel(17, 8)[0], 255);
        assert_eq!(count_foreground(&cleared), 40);
    }

    #[test]
    fn mask_and_keeps_overlap() {
        let mut a = GrayImage::new(10, 10);
        draw_filled_rect_mut(&mut a, Rect::at(0, 0).of_size(6, 10), Luma([255]));
        let mut b = GrayImage::new(10, 10);
        draw_filled_rect_mut(&mut b, Rect::at(4, 0).of_size(6, 10), Luma([255]));
        let both = mask_and(&a, &b);
        assert_eq!(count_foreground(&both), 20);
    }

    #[test]
    fn contour_of_filled_rectangle() {
        let mut mask = GrayImage::new(30, 20);
        draw_filled_rect_mut(&mut mask, Rect::at(2, 3).of_size(10, 4), Luma([255]));
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        let rect = bounding_rect(&contours[0].points).unwrap();
        assert_eq!((rect.left(), rect.top(), rect.width(), rect.height()), (2, 3, 10, 4));
        assert_eq!(contour_area(&contours[0].points), 27.0);
        assert_eq!(aspect_ratio(&rect), 2.5);
    }

    #[test]
    fn nested_shapes_are_not_external() {
        let mut mask = GrayImage::new(40, 40);
        draw_filled_rect_mut(&mut mask, Rect::at(2, 2).of_size(30, 30), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(8, 8).of_size(18, 18), Luma([0]));
        draw_filled_rect_mut(&mut mask, Rect::at(14, 14).of_size(5, 5), Luma([255]));
        assert_eq!(external_contours(&mask).len(), 1);
    }

    #[test]
    fn area_of_degenerate_contours() {
        assert_eq!(contour_area(&[]), 0.0);
        let line = [Point::new(0, 0), Point::new(5, 0)];
        assert_eq!(contour_area(&line), 0.0);
        assert!(bounding_rect(&[]).is_none());
    }

    #[test]
    fn crop_clips_to_image() {
        let img = GrayImage::from_pixel(10, 10, Luma([1]));
        let part = crop(&img, &Rect::at(6, 7).of_size(10, 10));
        assert_eq!(part.dimensions(), (4, 3));
    }
}
