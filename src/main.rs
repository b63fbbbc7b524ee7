use clap::{ Arg, App, ArgMatches };
use env_logger::Env;
use log::{ error, info };

use std::error::Error;
use std::fs;
use std::path::{ Path, PathBuf };
use std::str::FromStr;

use lpr_classic::config::LprConfig;
use lpr_classic::{ annotate, utils, Lpr };


fn parse_or<T: FromStr>(matches: &ArgMatches, name: &str, default: T) -> Result<T, String> {
    match matches.value_of(name) {
        Some(raw) => raw.parse().map_err(|_| format!("invalid value for --{}: {}", name, raw)),
        None => Ok(default),
    }
}

fn config_from(matches: &ArgMatches) -> Result<LprConfig, String> {
    let defaults = LprConfig::default();
    Ok(LprConfig {
        min_aspect_ratio: parse_or(matches, "min-aspect-ratio", defaults.min_aspect_ratio)?,
        max_aspect_ratio: parse_or(matches, "max-aspect-ratio", defaults.max_aspect_ratio)?,
        candidate_count: parse_or(matches, "candidates", defaults.candidate_count)?,
        psm: parse_or(matches, "psm", defaults.psm)?,
        lang: matches.value_of("lang").map(String::from).unwrap_or(defaults.lang),
        clear_border: matches.is_present("clear-border"),
        debug: matches.is_present("debug") || matches.is_present("debug-dir"),
        debug_dir: matches.value_of("debug-dir").map(PathBuf::from),
        resize_width: parse_or(matches, "width", defaults.resize_width)?,
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let matches = App::new("lpr-classic")
                    .version("0.1.0")
                    .about("Finds and reads license plates with classical image processing and tesseract")
                    .arg(Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .value_name("DIR")
                        .help("directory with the images to read")
                        .takes_value(true)
                        .required(true))
                    .arg(Arg::with_name("clear-border")
                        .short("c")
                        .long("clear-border")
                        .help("remove blobs touching the plate crop border before OCR"))
                    .arg(Arg::with_name("psm")
                        .short("p")
                        .long("psm")
                        .value_name("N")
                        .help("tesseract page segmentation mode [default: 7]")
                        .takes_value(true))
                    .arg(Arg::with_name("debug")
                        .short("d")
                        .long("debug")
                        .help("show every intermediate image"))
                    .arg(Arg::with_name("debug-dir")
                        .long("debug-dir")
                        .value_name("DIR")
                        .help("write intermediate images here, implies --debug")
                        .takes_value(true))
                    .arg(Arg::with_name("min-aspect-ratio")
                        .long("min-aspect-ratio")
                        .value_name("RATIO")
                        .help("smallest plate width/height [default: 4]")
                        .takes_value(true))
                    .arg(Arg::with_name("max-aspect-ratio")
                        .long("max-aspect-ratio")
                        .value_name("RATIO")
                        .help("largest plate width/height [default: 5]")
                        .takes_value(true))
                    .arg(Arg::with_name("candidates")
                        .long("candidates")
                        .value_name("N")
                        .help("how many of the largest regions to consider [default: 5]")
                        .takes_value(true))
                    .arg(Arg::with_name("lang")
                        .long("lang")
                        .value_name("LANG")
                        .help("tesseract language [default: eng]")
                        .takes_value(true))
                    .arg(Arg::with_name("width")
                        .long("width")
                        .value_name("PX")
                        .help("width images are resized to [default: 600]")
                        .takes_value(true))
                    .arg(Arg::with_name("font")
                        .long("font")
                        .value_name("TTF")
                        .help("font used to write the plate text on the output image")
                        .takes_value(true))
                    .arg(Arg::with_name("output-dir")
                        .long("output-dir")
                        .value_name("DIR")
                        .help("save annotated images here")
                        .takes_value(true))
                    .arg(Arg::with_name("show")
                        .long("show")
                        .help("display each annotated image (display-window builds)"))
                    .get_matches();

    let input = matches.value_of("input").ok_or("input directory is required")?;
    let config = config_from(&matches)?;
    if let Some(dir) = &config.debug_dir {
        fs::create_dir_all(dir)?;
    }
    let output_dir = matches.value_of("output-dir").map(PathBuf::from);
    if let Some(dir) = &output_dir {
        fs::create_dir_all(dir)?;
    }
    let font = match matches.value_of("font") {
        Some(path) => Some(annotate::load_font(path)?),
        None => None,
    };
    let show = matches.is_present("show");

    let resize_width = config.resize_width;
    let lpr = Lpr::new(config)?;
    let paths = utils::list_images(input)?;
    info!("{} images under {}", paths.len(), input);

    let (mut found, mut failed) = (0, 0);
    for path in &paths {
        info!("reading {}", path.display());
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                error!("could not decode {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };
        let img = utils::resize_to_width(&img, resize_width);

        let reading = lpr.find_and_extract_text(&img);
        let text = match &reading.text {
            Some(text) => text,
            None => {
                info!("no plate found in {}", path.display());
                continue;
            }
        };
        found += 1;
        println!("{}", text);
        info!("plate {:?} in {}", text, path.display());

        if output_dir.is_none() && !show {
            continue;
        }
        let mut annotated = img.to_rgb8();
        annotate::annotate(&mut annotated, &reading, font.as_ref());
        if let Some(dir) = &output_dir {
            let target = output_path(dir, path);
            if let Err(e) = annotated.save(&target) {
                error!("could not write {}: {}", target.display(), e);
            }
        }
        if show {
            display(&annotated);
        }
    }

    info!("processed {} images, {} plates, {} unreadable files", paths.len(), found, failed);
    Ok(())
}

fn output_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    dir.join(format!("{}_plate.png", stem))
}

#[cfg(feature = "display-window")]
fn display(img: &image::RgbImage) {
    let rgba = image::DynamicImage::ImageRgb8(img.clone()).to_rgba8();
    imageproc::window::display_image("Output Image", &rgba, img.width(), img.height());
}

#[cfg(not(feature = "display-window"))]
fn display(_img: &image::RgbImage) {
    log::warn!("--show needs a build with the display-window feature");
}
