pub mod command;
pub mod decoder;
pub mod detector;
pub mod dispatcher;
pub mod docx_processor;
pub mod image_processor;
pub mod ocr_service;
pub mod pdf_processor;
pub mod rasterizer;
pub mod xlsx_processor;

pub use dispatcher::Dispatcher;
pub use ocr_service::{OcrEngine, OcrService};
pub use rasterizer::{PageRasterizer, PdftoppmRasterizer};
