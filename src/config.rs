use std::f64::consts::PI;

use crate::error::{LaneDetectionError, LaneDetectionResult};

/// 파이프라인 전체의 튜닝 파라미터 묶음입니다.
///
/// `Pipeline::new`에서 한 번 검증된 뒤로는 변경되지 않으며, 모든 단계는 읽기만 합니다.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LaneConfig {
    pub blur: BlurParams,
    pub canny: CannyParams,
    pub roi: RoiShape,
    pub hough: HoughParams,
    pub lanes: LaneGeometry,
    pub blend: BlendWeights,
}

/// 가우시안 블러 파라미터. sigma가 0이면 커널 크기로부터 자동 계산됩니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurParams {
    pub kernel_width: i32,
    pub kernel_height: i32,
    pub sigma_x: f64,
    pub sigma_y: f64,
}

/// 캐니 엣지 검출의 히스테리시스 임계값과 Sobel 커널 크기
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub aperture_size: i32,
    pub l2_gradient: bool,
}

/// 관심영역(ROI) 다각형의 정의 방식
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RoiShape {
    /// 좌하 (0, h), 좌상 (500, 330), 우상 (570, 330), 우하 (w, h).
    ///
    /// 아래쪽 두 꼭짓점은 영상 크기에 맞춰 매번 다시 계산되고, 위쪽 두 꼭짓점은
    /// 기준 카메라에서 측정한 절대 픽셀 좌표입니다.
    #[default]
    DefaultTrapezoid,

    /// 호출자가 지정한 꼭짓점 목록 (픽셀 좌표).
    ///
    /// 오목한 다각형도 그대로 채워집니다. 순서가 뒤섞여 자기 교차하는 다각형이
    /// 되는지는 검사하지 않습니다.
    Polygon(Vec<(i32, i32)>),
}

/// 확률적 허프 변환(HoughLinesP) 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    /// 거리 해상도 (픽셀)
    pub rho: f64,
    /// 각도 해상도 (라디안)
    pub theta: f64,
    /// 누적 투표 임계값
    pub threshold: i32,
    pub min_line_length: f64,
    pub max_line_gap: f64,
}

/// 좌/우 분류와 최종 차선 렌더링에 사용되는 기하 파라미터
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneGeometry {
    /// |기울기|가 이 값보다 작은 세그먼트는 수평 잡음으로 간주해 버립니다.
    pub slope_threshold: f64,
    /// 오른쪽 차선을 평가할 두 x좌표
    pub right_span: (i32, i32),
    /// 왼쪽 차선을 평가할 두 x좌표
    pub left_span: (i32, i32),
    /// BGR 순서
    pub color: [f64; 3],
    pub thickness: i32,
}

/// `output = alpha * original + beta * overlay + gamma`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for BlurParams {
    fn default() -> Self {
        Self {
            kernel_width: 5,
            kernel_height: 5,
            sigma_x: 0.0,
            sigma_y: 0.0,
        }
    }
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            low_threshold: 100.0,
            high_threshold: 200.0,
            aperture_size: 3,
            l2_gradient: false,
        }
    }
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            rho: 1.0,
            theta: PI / 180.0,
            threshold: 30,
            min_line_length: 20.0,
            max_line_gap: 20.0,
        }
    }
}

impl Default for LaneGeometry {
    fn default() -> Self {
        Self {
            slope_threshold: 0.2,
            right_span: (550, 850),
            left_span: (120, 425),
            color: [0.0, 255.0, 0.0],
            thickness: 8,
        }
    }
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            gamma: 0.0,
        }
    }
}

impl RoiShape {
    /// `width` x `height` 영상에 대한 ROI 꼭짓점들을 반환합니다.
    pub fn vertices(&self, width: i32, height: i32) -> Vec<(i32, i32)> {
        match self {
            RoiShape::DefaultTrapezoid => vec![
                (0, height),
                (500, 330),
                (570, 330),
                (width, height),
            ],
            RoiShape::Polygon(points) => points.clone(),
        }
    }
}

impl LaneConfig {
    /// 정적 파라미터를 검사합니다. 실패 시 `LaneDetectionError::Configuration`.
    pub fn validate(&self) -> LaneDetectionResult<()> {
        let blur = &self.blur;
        for (name, side) in [("width", blur.kernel_width), ("height", blur.kernel_height)] {
            if side <= 0 || side % 2 == 0 {
                return Err(config_error(format!(
                    "blur kernel {name} must be a positive odd number, got {side}"
                )));
            }
        }
        if !(blur.sigma_x >= 0.0 && blur.sigma_y >= 0.0) {
            return Err(config_error(format!(
                "blur sigmas must be non-negative, got ({}, {})",
                blur.sigma_x, blur.sigma_y
            )));
        }

        let canny = &self.canny;
        if !(canny.low_threshold >= 0.0 && canny.high_threshold >= 0.0) {
            return Err(config_error(format!(
                "canny thresholds must be non-negative, got ({}, {})",
                canny.low_threshold, canny.high_threshold
            )));
        }
        if ![3, 5, 7].contains(&canny.aperture_size) {
            return Err(config_error(format!(
                "canny aperture must be 3, 5 or 7, got {}",
                canny.aperture_size
            )));
        }

        if let RoiShape::Polygon(points) = &self.roi {
            if points.len() < 3 {
                return Err(config_error(format!(
                    "roi polygon needs at least 3 vertices, got {}",
                    points.len()
                )));
            }
        }

        let hough = &self.hough;
        if !(hough.rho > 0.0 && hough.theta > 0.0) || hough.threshold <= 0 {
            return Err(config_error(format!(
                "hough rho, theta and threshold must be positive, got ({}, {}, {})",
                hough.rho, hough.theta, hough.threshold
            )));
        }
        if !(hough.min_line_length >= 0.0 && hough.max_line_gap >= 0.0) {
            return Err(config_error(format!(
                "hough min length and max gap must be non-negative, got ({}, {})",
                hough.min_line_length, hough.max_line_gap
            )));
        }

        let lanes = &self.lanes;
        if !lanes.slope_threshold.is_finite() || lanes.slope_threshold < 0.0 {
            return Err(config_error(format!(
                "slope threshold must be a finite non-negative number, got {}",
                lanes.slope_threshold
            )));
        }
        for (side, (x1, x2)) in [("left", lanes.left_span), ("right", lanes.right_span)] {
            if x1 == x2 {
                return Err(config_error(format!(
                    "{side} evaluation span needs two distinct x coordinates, got {x1}"
                )));
            }
        }
        if lanes.thickness <= 0 {
            return Err(config_error(format!(
                "lane thickness must be positive, got {}",
                lanes.thickness
            )));
        }

        Ok(())
    }
}

fn config_error(message: String) -> LaneDetectionError {
    LaneDetectionError::Configuration(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rejected(config: LaneConfig) {
        match config.validate() {
            Err(LaneDetectionError::Configuration(_)) => {}
            other => panic!("expected a configuration error, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(LaneConfig::default().validate().is_ok());
    }

    #[test]
    fn even_blur_kernel_is_rejected() {
        let mut config = LaneConfig::default();
        config.blur.kernel_width = 4;
        assert_rejected(config);

        let mut config = LaneConfig::default();
        config.blur.kernel_height = 0;
        assert_rejected(config);
    }

    #[test]
    fn unsupported_aperture_is_rejected() {
        let mut config = LaneConfig::default();
        config.canny.aperture_size = 300;
        assert_rejected(config);
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let mut config = LaneConfig::default();
        config.roi = RoiShape::Polygon(vec![(0, 0), (10, 10)]);
        assert_rejected(config);
    }

    #[test]
    fn nan_slope_threshold_is_rejected() {
        let mut config = LaneConfig::default();
        config.lanes.slope_threshold = f64::NAN;
        assert_rejected(config);
    }

    #[test]
    fn collapsed_span_is_rejected() {
        let mut config = LaneConfig::default();
        config.lanes.left_span = (200, 200);
        assert_rejected(config);
    }

    #[test]
    fn default_trapezoid_follows_image_size() {
        let roi = RoiShape::DefaultTrapezoid;
        assert_eq!(
            roi.vertices(960, 540),
            vec![(0, 540), (500, 330), (570, 330), (960, 540)]
        );
        assert_eq!(roi.vertices(1280, 720)[3], (1280, 720));
    }

    #[test]
    fn explicit_polygon_is_returned_as_given() {
        let points = vec![(0, 100), (40, 20), (60, 20), (100, 100)];
        let roi = RoiShape::Polygon(points.clone());
        assert_eq!(roi.vertices(1, 1), points);
    }
}
