use std::path::Path;

use opencv::{
    core::{self, Mat, Vector},
    imgcodecs,
    prelude::*,
};

use crate::error::{LaneDetectionError, LaneDetectionResult};

/// 영상 파일을 3채널 BGR `Mat`으로 읽어옵니다.
///
/// 파일이 없거나 디코딩할 수 없으면 `LaneDetectionError::Decode`.
pub fn read_image(path: &Path) -> LaneDetectionResult<Mat> {
    let decode_error = || LaneDetectionError::Decode {
        path: path.to_path_buf(),
    };
    let path_str = path.to_str().ok_or_else(decode_error)?;
    let img = imgcodecs::imread(path_str, imgcodecs::IMREAD_COLOR)?;
    if img.empty() {
        return Err(decode_error());
    }
    Ok(img)
}

/// 영상을 파일로 저장합니다. 형식은 확장자로 결정됩니다.
pub fn write_image(path: &Path, img: &Mat) -> LaneDetectionResult<()> {
    let encode_error = || LaneDetectionError::Encode {
        path: path.to_path_buf(),
    };
    let path_str = path.to_str().ok_or_else(encode_error)?;
    if !imgcodecs::imwrite(path_str, img, &Vector::new())? {
        return Err(encode_error());
    }
    Ok(())
}

/// 두 영상을 가로로 이어붙입니다. 높이와 형식이 같아야 합니다.
pub fn side_by_side(left: &Mat, right: &Mat) -> LaneDetectionResult<Mat> {
    if left.rows() != right.rows() {
        return Err(LaneDetectionError::DimensionMismatch {
            expected: left.size()?,
            actual: right.size()?,
        });
    }
    if left.typ() != right.typ() {
        return Err(LaneDetectionError::InvalidImage(format!(
            "cannot concatenate a {}-channel image with a {}-channel image",
            left.channels(),
            right.channels()
        )));
    }
    let mut srcs: Vector<Mat> = Vector::new();
    srcs.push(left.try_clone()?);
    srcs.push(right.try_clone()?);
    let mut merged = Mat::default();
    core::hconcat(&srcs, &mut merged)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, Size, CV_8UC3};

    fn color(rows: i32, cols: i32, value: f64) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(value)).unwrap()
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = read_image(Path::new("./definitely/not/here.jpg")).unwrap_err();
        assert!(matches!(err, LaneDetectionError::Decode { .. }));
    }

    #[test]
    fn side_by_side_doubles_the_width() {
        let merged = side_by_side(&color(30, 40, 10.0), &color(30, 40, 200.0)).unwrap();
        assert_eq!(merged.size().unwrap(), Size::new(80, 30));
        assert_eq!(merged.at_2d::<core::Vec3b>(0, 0).unwrap()[0], 10);
        assert_eq!(merged.at_2d::<core::Vec3b>(0, 79).unwrap()[0], 200);
    }

    #[test]
    fn side_by_side_requires_equal_heights() {
        let err = side_by_side(&color(30, 40, 0.0), &color(31, 40, 0.0)).unwrap_err();
        assert!(matches!(err, LaneDetectionError::DimensionMismatch { .. }));
    }

    #[test]
    fn side_by_side_rejects_mixed_pixel_types() {
        let gray =
            Mat::new_rows_cols_with_default(30, 40, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        let err = side_by_side(&color(30, 40, 0.0), &gray).unwrap_err();
        assert!(matches!(err, LaneDetectionError::InvalidImage(_)));
    }

    #[test]
    fn png_round_trip_through_disk_is_lossless() {
        let path = std::env::temp_dir().join(format!("hough_lanes_io_{}.png", std::process::id()));
        let img = color(12, 16, 77.0);
        write_image(&path, &img).unwrap();
        let back = read_image(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back.data_bytes().unwrap(), img.data_bytes().unwrap());
    }
}
