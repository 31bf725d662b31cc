use std::path::PathBuf;

use opencv::core::Size;
use thiserror::Error;

/// 파이프라인 함수들에서 공통으로 사용할 `Result` 타입 별칭입니다.
pub type LaneDetectionResult<T> = Result<T, LaneDetectionError>;

/// 차선 검출 파이프라인에서 호출부로 전달되는 에러입니다.
///
/// `FitError`와 달리 이 에러들은 모두 치명적이며, 발생하면 해당 호출은 결과 영상 없이 종료됩니다.
#[derive(Debug, Error)]
pub enum LaneDetectionError {
    /// 잘못된 정적 파라미터 (짝수 커널, 잘못된 ROI 등). `Pipeline::new`에서만 발생합니다.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// 입력 파일이 없거나 영상으로 디코딩할 수 없음
    #[error("failed to decode image `{}`", .path.display())]
    Decode { path: PathBuf },

    /// 결과 영상을 파일로 인코딩하지 못함
    #[error("failed to encode image `{}`", .path.display())]
    Encode { path: PathBuf },

    /// 파이프라인이 처리할 수 없는 입력 영상 (빈 영상, 3채널이 아닌 영상)
    #[error("invalid input image: {0}")]
    InvalidImage(String),

    /// 합성하려는 두 영상의 크기가 다름
    #[error("image size mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch { expected: Size, actual: Size },

    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

/// 한쪽 차선의 직선 피팅 실패.
///
/// 파이프라인 내부에서 해당 차선을 그리지 않는 것으로 복구되며, 호출부로 전파되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("no points were assigned to this lane side")]
    Empty,

    /// 모든 점의 x좌표가 같아 y = ax + b 형태로 표현할 수 없음
    #[error("points are vertically aligned; slope is undefined")]
    Vertical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_path() {
        let err = LaneDetectionError::Decode {
            path: PathBuf::from("./Assets/missing.jpg"),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode image `./Assets/missing.jpg`"
        );
    }

    #[test]
    fn opencv_errors_convert_transparently() {
        let cv = opencv::Error::new(opencv::core::StsBadArg, "bad argument");
        let err: LaneDetectionError = cv.into();
        assert!(matches!(err, LaneDetectionError::OpenCv(_)));
        assert!(err.to_string().contains("bad argument"));
    }
}
