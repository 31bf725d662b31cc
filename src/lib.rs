//! 단일 도로 영상에서 좌/우 차선 경계를 검출하고 원본 위에 합성하는 OpenCV 파이프라인.
//!
//! ```no_run
//! use hough_lanes::{image_io, LaneConfig, Pipeline};
//! # fn main() -> hough_lanes::LaneDetectionResult<()> {
//! let pipeline = Pipeline::new(LaneConfig::default())?;
//! let img = image_io::read_image("./Assets/1.jpg".as_ref())?;
//! let detection = pipeline.process(&img)?;
//! let merged = image_io::side_by_side(&img, &detection.annotated)?;
//! image_io::write_image("./Assets/1_out.jpg".as_ref(), &merged)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fitting;
pub mod image_io;
pub mod lane_detection;

pub use config::{
    BlendWeights, BlurParams, CannyParams, HoughParams, LaneConfig, LaneGeometry, RoiShape,
};
pub use error::{FitError, LaneDetectionError, LaneDetectionResult};
pub use fitting::{FittedLine, LineSegment, PointSet};
pub use lane_detection::{LaneDetection, LaneLines, Pipeline};
