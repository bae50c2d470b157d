use image;
use js_sys;
use wasm_bindgen::prelude::*;
use web_sys::console;

mod color;
mod error;
mod forest;
mod graph;
mod grid;
mod segment;

pub use color::{mean_colors, ColorSource, Coloring, RandomPalette, SpreadPalette};
pub use error::SegmentError;
pub use forest::SegmentForest;
pub use graph::{build_edges, sort_edges, Edge, Metric};
pub use grid::{Cell, Grid};
pub use segment::{segment, segment_image, segment_with, Options, Segmented, Segmenter};

#[wasm_bindgen]
pub struct WasmSegmenter {
    img: image::DynamicImage,
}

#[wasm_bindgen]
impl WasmSegmenter {
    #[wasm_bindgen(constructor)]
    pub fn new(img: &[u8]) -> Result<WasmSegmenter, JsValue> {
        match image::load_from_memory(img) {
            Ok(img) => Ok(WasmSegmenter { img }),
            Err(e) => Err(js_sys::Error::new(&e.to_string()).into()),
        }
    }

    #[wasm_bindgen]
    pub fn process(&self, granularity: f32, lab: bool, mean: bool) -> Result<Vec<u8>, JsValue> {
        let options =
            Options::new(granularity).with_metric(if lab { Metric::Lab } else { Metric::Rgb });
        let coloring = if mean {
            Coloring::Mean
        } else {
            Coloring::Spread
        };
        let segmented = match segment_image(&self.img, &options, coloring) {
            Ok(segmented) => segmented,
            Err(e) => return Err(js_sys::Error::new(&e.to_string()).into()),
        };
        console::log_1(&format!("{} segments", segmented.segments).into());

        let res = segmented.image;
        let mut out = Vec::new();
        let encoder = image::png::PNGEncoder::new(&mut out);
        match encoder.encode(&res, res.width(), res.height(), image::ColorType::RGB(8)) {
            Err(e) => Err(js_sys::Error::new(&e.to_string()).into()),
            Ok(_) => Ok(out),
        }
    }
}

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}
