use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vec4i, Vector, CV_8UC3},
    imgproc,
    prelude::*,
};
use opencv::core::AlgorithmHint::ALGO_HINT_DEFAULT;
use tracing::{debug, Level};

use crate::config::LaneConfig;
use crate::error::{LaneDetectionError, LaneDetectionResult};
use crate::fitting::{classify_segments, fit_line, FittedLine, LineSegment, PointSet};

/// 허프 세그먼트 디버그 영상에 쓰는 색(빨강, BGR)과 두께
const SEGMENT_COLOR: [f64; 3] = [0.0, 0.0, 255.0];
const SEGMENT_THICKNESS: i32 = 3;

/// 좌/우 차선 피팅 결과. 점이 없거나 수직으로 퇴화한 쪽은 `None`입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaneLines {
    pub left: Option<FittedLine>,
    pub right: Option<FittedLine>,
}

/// 한 장의 영상에 대한 파이프라인 실행 결과
#[derive(Debug)]
pub struct LaneDetection {
    /// 원본 위에 차선이 합성된 영상 (원본과 같은 크기)
    pub annotated: Mat,
    pub segments: Vec<LineSegment>,
    pub lines: LaneLines,
}

/// 단일 영상 차선 검출 파이프라인입니다.
///
/// 그레이 변환/블러 → 캐니 엣지 → 사다리꼴 ROI → 확률적 허프 변환 → 좌/우 직선 피팅 → 원본과 합성.
///
/// 설정은 생성 시점에 한 번 검증되고 이후 바뀌지 않습니다. 모든 단계가 `&self`만
/// 빌리고 매 호출마다 자기 버퍼를 새로 할당하므로, 하나의 `Pipeline`을 여러 스레드에서
/// 동시에 사용해도 됩니다.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: LaneConfig,
}

impl Pipeline {
    /// 설정을 검증하고 파이프라인을 생성합니다.
    ///
    /// # 에러
    /// - 짝수 블러 커널, 지원하지 않는 aperture, 꼭짓점이 3개 미만인 ROI 등은
    ///   `LaneDetectionError::Configuration`
    pub fn new(config: LaneConfig) -> LaneDetectionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 입력 영상을 그레이스케일로 변환합니다.
    ///
    /// # 인자
    /// * `img` - BGR 색상 영상
    pub fn gray_scale(&self, img: &Mat) -> LaneDetectionResult<Mat> {
        let mut gray = Mat::default();
        imgproc::cvt_color(img, &mut gray, imgproc::COLOR_BGR2GRAY, 0, ALGO_HINT_DEFAULT)?;
        Ok(gray)
    }

    /// 가우시안 블러를 적용하여 영상 노이즈를 줄입니다.
    pub fn noise_removal(&self, img: &Mat) -> LaneDetectionResult<Mat> {
        let blur = &self.config.blur;
        let mut dst = Mat::default();
        imgproc::gaussian_blur(
            img,
            &mut dst,
            Size::new(blur.kernel_width, blur.kernel_height),
            blur.sigma_x,
            blur.sigma_y,
            core::BORDER_DEFAULT,
            ALGO_HINT_DEFAULT,
        )?;
        Ok(dst)
    }

    /// 전처리: 그레이 변환 후 블러. 결과는 입력과 같은 크기의 단일 채널 영상입니다.
    pub fn preprocess(&self, img: &Mat) -> LaneDetectionResult<Mat> {
        let gray = self.gray_scale(img)?;
        self.noise_removal(&gray)
    }

    /// 캐니(Canny) 엣지 검출을 수행합니다.
    ///
    /// 높은 임계값을 넘는 픽셀은 항상 엣지, 낮은 임계값 미만은 항상 비엣지이고, 그 사이는
    /// 강한 엣지와 8-연결되어 있을 때만 엣지로 남습니다.
    ///
    /// # 반환
    /// * 엣지를 나타내는 이진(0/255) 영상
    pub fn edge_detection(&self, img: &Mat) -> LaneDetectionResult<Mat> {
        let canny = &self.config.canny;
        let mut edges = Mat::default();
        imgproc::canny(
            img,
            &mut edges,
            canny.low_threshold,
            canny.high_threshold,
            canny.aperture_size,
            canny.l2_gradient,
        )?;
        Ok(edges)
    }

    /// `width` x `height` 영상에 적용될 ROI 꼭짓점들
    pub fn roi_vertices(&self, width: i32, height: i32) -> Vector<Point> {
        self.config
            .roi
            .vertices(width, height)
            .into_iter()
            .map(|(x, y)| Point::new(x, y))
            .collect()
    }

    /// 관심영역(ROI) 다각형 내부만 남기고 외부 픽셀은 0으로 만듭니다.
    ///
    /// # 반환
    /// * ROI가 적용된 영상 (입력과 같은 크기, 같은 형식)
    pub fn roi(&self, img: &Mat) -> LaneDetectionResult<Mat> {
        // 영상과 동일한 크기의 검정색 마스크 생성
        let mut mask = Mat::zeros(img.rows(), img.cols(), img.typ())?.to_mat()?;
        let vertices = self.roi_vertices(img.cols(), img.rows());

        let mut contour_vec: Vector<Vector<Point>> = Vector::new();
        contour_vec.push(vertices);

        // 마스크에 흰색으로 폴리곤(ROI) 영역을 채움. 오목한 다각형도 외부는 0으로 남음
        imgproc::fill_poly(
            &mut mask,
            &contour_vec,
            Scalar::all(255.0),
            imgproc::LINE_8,
            0,
            Point::new(0, 0),
        )?;

        let mut masked_img = Mat::default();
        core::bitwise_and(img, &mask, &mut masked_img, &Mat::default())?;
        Ok(masked_img)
    }

    /// 확률적 허프 변환으로 선분들을 검출합니다.
    ///
    /// 엣지 픽셀이 하나도 없으면 빈 목록을 돌려주며, 이는 에러가 아닙니다.
    pub fn hough_segments(&self, img: &Mat) -> LaneDetectionResult<Vec<LineSegment>> {
        let hough = &self.config.hough;
        let mut lines: Vector<Vec4i> = Vector::new();
        imgproc::hough_lines_p(
            img,
            &mut lines,
            hough.rho,
            hough.theta,
            hough.threshold,
            hough.min_line_length,
            hough.max_line_gap,
        )?;
        Ok(lines.iter().map(LineSegment::from).collect())
    }

    /// 선분들을 좌/우로 분류하고 각각을 직선 하나로 피팅합니다.
    ///
    /// 한쪽의 피팅이 실패(점 없음, 수직)하면 그쪽만 `None`이 되고 다른 쪽에는 영향이 없습니다.
    pub fn fit_lanes(&self, segments: &[LineSegment]) -> LaneLines {
        let sides = classify_segments(segments, self.config.lanes.slope_threshold);
        debug!(
            left_points = sides.left.len(),
            right_points = sides.right.len(),
            "classified segments"
        );
        LaneLines {
            left: fit_side("left", &sides.left),
            right: fit_side("right", &sides.right),
        }
    }

    /// 0으로 채운 `size` 크기의 3채널 영상 위에 피팅된 차선을 그립니다.
    ///
    /// 각 직선은 설정된 두 x좌표(오른쪽 550/850, 왼쪽 120/425 기본값)에서 평가한 두 점을 잇습니다.
    pub fn draw_lanes(&self, size: Size, lines: &LaneLines) -> LaneDetectionResult<Mat> {
        let lanes = &self.config.lanes;
        let mut line_img = Mat::new_size_with_default(size, CV_8UC3, Scalar::all(0.0))?;
        let color = Scalar::new(lanes.color[0], lanes.color[1], lanes.color[2], 0.0);

        for (line, (xa, xb)) in [(lines.right, lanes.right_span), (lines.left, lanes.left_span)] {
            let Some(line) = line else {
                continue;
            };
            let (x1, y1) = line.pixel_at(xa);
            let (x2, y2) = line.pixel_at(xb);
            imgproc::line(
                &mut line_img,
                Point::new(x1, y1),
                Point::new(x2, y2),
                color,
                lanes.thickness,
                imgproc::LINE_8,
                0,
            )?;
        }
        Ok(line_img)
    }

    /// 차선 피팅 + 렌더링. 차선 오버레이 영상과 피팅 결과를 함께 돌려줍니다.
    pub fn lane_line_fitting(
        &self,
        size: Size,
        segments: &[LineSegment],
    ) -> LaneDetectionResult<(Mat, LaneLines)> {
        let lines = self.fit_lanes(segments);
        let line_img = self.draw_lanes(size, &lines)?;
        Ok((line_img, lines))
    }

    /// 원본과 오버레이를 가중 합성합니다: `alpha * img + beta * overlay + gamma`.
    ///
    /// # 에러
    /// * 두 영상의 크기가 다르면 `DimensionMismatch`
    /// * 크기는 같지만 픽셀 형식이 다르면 `InvalidImage`
    pub fn weighted_img(&self, img: &Mat, overlay: &Mat) -> LaneDetectionResult<Mat> {
        let expected = img.size()?;
        let actual = overlay.size()?;
        if expected != actual {
            return Err(LaneDetectionError::DimensionMismatch { expected, actual });
        }
        if img.typ() != overlay.typ() {
            return Err(LaneDetectionError::InvalidImage(format!(
                "overlay has {} channel(s), source has {}",
                overlay.channels(),
                img.channels()
            )));
        }

        let blend = &self.config.blend;
        let mut blended = Mat::default();
        core::add_weighted(
            img,
            blend.alpha,
            overlay,
            blend.beta,
            blend.gamma,
            &mut blended,
            -1,
        )?;
        Ok(blended)
    }

    /// 검출된 원시 허프 선분들을 검정 배경 위에 빨간색으로 그립니다 (디버그용).
    pub fn segment_overlay(&self, size: Size, segments: &[LineSegment]) -> LaneDetectionResult<Mat> {
        let mut line_img = Mat::new_size_with_default(size, CV_8UC3, Scalar::all(0.0))?;
        let color = Scalar::new(SEGMENT_COLOR[0], SEGMENT_COLOR[1], SEGMENT_COLOR[2], 0.0);
        for s in segments {
            imgproc::line(
                &mut line_img,
                Point::new(s.x1, s.y1),
                Point::new(s.x2, s.y2),
                color,
                SEGMENT_THICKNESS,
                imgproc::LINE_8,
                0,
            )?;
        }
        Ok(line_img)
    }

    /// 단일 영상에 대한 전체 차선 검출 과정입니다.
    ///
    /// 1) 그레이 변환 + 가우시안 블러
    /// 2) 캐니 엣지
    /// 3) 사다리꼴 ROI
    /// 4) 허프 선분 검출
    /// 5) 좌/우 직선 피팅 및 렌더링
    /// 6) 원본과 합성
    ///
    /// # 에러
    /// * 빈 영상이나 3채널이 아닌 영상은 `InvalidImage`
    pub fn process(&self, frame: &Mat) -> LaneDetectionResult<LaneDetection> {
        if frame.empty() {
            return Err(LaneDetectionError::InvalidImage("image is empty".into()));
        }
        if frame.typ() != CV_8UC3 {
            return Err(LaneDetectionError::InvalidImage(format!(
                "expected an 8-bit 3-channel image, got {} channel(s)",
                frame.channels()
            )));
        }
        let size = frame.size()?;

        // 1) 그레이 변환 + 가우시안 블러
        let blur = self.preprocess(frame)?;

        // 2) 캐니 엣지
        let edges = self.edge_detection(&blur)?;

        // 3) ROI
        let roi_img = self.roi(&edges)?;
        if tracing::enabled!(Level::DEBUG) {
            let edge_pixels = core::count_non_zero(&edges)?;
            let roi_pixels = core::count_non_zero(&roi_img)?;
            debug!(edge_pixels, roi_pixels, "edge map masked");
        }

        // 4) 허프 선분
        let segments = self.hough_segments(&roi_img)?;
        debug!(segments = segments.len(), "hough segments detected");

        // 5) 좌/우 차선 피팅
        let (line_img, lines) = self.lane_line_fitting(size, &segments)?;

        // 6) 원본 영상과 합성
        let annotated = self.weighted_img(frame, &line_img)?;

        Ok(LaneDetection {
            annotated,
            segments,
            lines,
        })
    }
}

fn fit_side(side: &str, points: &PointSet) -> Option<FittedLine> {
    match fit_line(points) {
        Ok(line) => {
            debug!(side, slope = line.slope, intercept = line.intercept, "lane fitted");
            Some(line)
        }
        Err(err) => {
            debug!(side, %err, "lane omitted");
            None
        }
    }
}
