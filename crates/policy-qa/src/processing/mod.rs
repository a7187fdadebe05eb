pub mod extractor;
pub mod segmenter;

pub use extractor::TextExtractor;
pub use segmenter::{ClauseSegmenter, SegmentStrategy};
