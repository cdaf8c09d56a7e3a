//! Public types for the labelscan API.

mod image;
mod outcome;
mod row;

pub use image::ImageRecord;
pub use outcome::ExtractionOutcome;
pub use row::{LABEL_SEPARATOR, ResultRow, bag_of_words};
