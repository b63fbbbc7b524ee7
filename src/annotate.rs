use image::{ Rgb, RgbImage };
use imageproc::contours::Contour;
use imageproc::drawing;
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use rusttype::{ Font, Scale };

use std::fs;
use std::path::Path;

use crate::error::LprError;
use crate::image_process;
use crate::utils;
use crate::PlateReading;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const LINE_THICKNESS: i32 = 2;
const TEXT_SCALE: f32 = 24.0;
const TEXT_OFFSET: i32 = 15;

pub fn load_font(path: impl AsRef<Path>) -> Result<Font<'static>, LprError> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    Font::try_from_vec(data).ok_or_else(|| LprError::invalid_font(path))
}

/// Corners of the smallest rotated rectangle around the contour.
pub fn plate_box(contour: &Contour<i32>) -> Option<[Point<i32>; 4]> {
    if contour.points.is_empty() {
        return None;
    }
    Some(min_area_rect(&contour.points))
}

fn draw_thick_line(img: &mut RgbImage, start: Point<i32>, end: Point<i32>, color: Rgb<u8>) {
    for dx in 0..LINE_THICKNESS {
        for dy in 0..LINE_THICKNESS {
            drawing::draw_line_segment_mut(
                img,
                ((start.x + dx) as f32, (start.y + dy) as f32),
                ((end.x + dx) as f32, (end.y + dy) as f32),
                color,
            );
        }
    }
}

/// Draws the plate outline and, given a font, the cleaned text just above it.
pub fn annotate(img: &mut RgbImage, reading: &PlateReading, font: Option<&Font<'_>>) {
    let contour = match &reading.contour {
        Some(contour) => contour,
        None => return,
    };
    if let Some(corners) = plate_box(contour) {
        for i in 0..corners.len() {
            draw_thick_line(img, corners[i], corners[(i + 1) % corners.len()], GREEN);
        }
    }

    let (font, text) = match (font, &reading.text) {
        (Some(font), Some(text)) => (font, utils::cleanup_text(text)),
        _ => return,
    };
    if text.is_empty() {
        return;
    }
    if let Some(rect) = image_process::bounding_rect(&contour.points) {
        let y = (rect.top() - TEXT_OFFSET).max(0);
        drawing::draw_text_mut(img, GREEN, rect.left(), y, Scale::uniform(TEXT_SCALE), font, &text);
    }
}


#[cfg(test)]
mod test {

    use image::{ Rgb, RgbImage };
    use imageproc::contours::{ BorderType, Contour };
    use imageproc::point::Point;

    use super::{ annotate, load_font, plate_box, GREEN };
    use crate::PlateReading;

    fn reading() -> PlateReading {
        let points = vec![
            Point::new(20, 30),
            Point::new(109, 30),
            Point::new(109, 49),
            Point::new(20, 49),
        ];
        let contour = Contour { points, border_type: BorderType::Outer, parent: None };
        PlateReading {
            text: Some("AB1234".to_string()),
            bounding_box: crate::image_process::bounding_rect(&contour.points),
            contour: Some(contour),
        }
    }

    #[test]
    fn box_of_axis_aligned_contour() {
        let corners = plate_box(reading().contour.as_ref().unwrap()).unwrap();
        let xs: Vec<i32> = corners.iter().map(|p| p.x).collect();
        let ys: Vec<i32> = corners.iter().map(|p| p.y).collect();
        let near = |a: Option<&i32>, b: i32| a.map_or(false, |a| (a - b).abs() <= 1);
        assert!(near(xs.iter().min(), 20));
        assert!(near(xs.iter().max(), 109));
        assert!(near(ys.iter().min(), 30));
        assert!(near(ys.iter().max(), 49));
    }

    #[test]
    fn draws_outline_without_font() {
        let mut img = RgbImage::new(200, 100);
        annotate(&mut img, &reading(), None);
        assert!((29..=32).any(|y| *img.get_pixel(60, y) == GREEN));
        assert_eq!(*img.get_pixel(60, 40), Rgb([0, 0, 0]));
    }

    #[test]
    fn nothing_drawn_without_plate() {
        let mut img = RgbImage::new(50, 50);
        annotate(&mut img, &PlateReading::none(), None);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn missing_font_is_an_error() {
        assert!(load_font("/no/such/font.ttf").is_err());
    }
}
