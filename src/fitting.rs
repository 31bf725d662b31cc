use opencv::core::Vec4i;

use crate::error::FitError;

/// 허프 변환으로 검출된 선분 하나. 영상 픽셀 좌표계(y축은 아래 방향)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl LineSegment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// (y2 - y1) / (x2 - x1). 수직 선분(x1 == x2)이면 `None`.
    pub fn slope(&self) -> Option<f64> {
        if self.x1 == self.x2 {
            return None;
        }
        Some((self.y2 - self.y1) as f64 / (self.x2 - self.x1) as f64)
    }
}

impl From<Vec4i> for LineSegment {
    fn from(v: Vec4i) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// 한쪽 차선에 배정된 선분 끝점들의 x, y 좌표 목록.
///
/// 좌표는 항상 (x, y) 쌍으로만 추가되므로 두 목록의 길이는 같습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl PointSet {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let (xs, ys) = points.into_iter().unzip();
        Self { xs, ys }
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    fn push_endpoints(&mut self, segment: &LineSegment) {
        self.xs.extend([segment.x1 as f64, segment.x2 as f64]);
        self.ys.extend([segment.y1 as f64, segment.y2 as f64]);
    }
}

/// 기울기 부호로 분류된 좌/우 점 집합
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneSides {
    pub left: PointSet,
    pub right: PointSet,
}

/// 선분들을 기울기로 좌/우 차선 후보에 배정합니다.
///
/// - 기울기 >= `slope_threshold` : 오른쪽
/// - 기울기 <= `-slope_threshold`: 왼쪽
/// - 그 사이(수평에 가까운 잡음)와 수직 선분은 버립니다.
///
/// 영상 좌표계는 y가 아래로 증가하므로, 오른쪽 차선은 양의 기울기를 가집니다.
pub fn classify_segments(segments: &[LineSegment], slope_threshold: f64) -> LaneSides {
    let mut sides = LaneSides::default();
    for segment in segments {
        let Some(slope) = segment.slope() else {
            continue;
        };
        if slope >= slope_threshold {
            sides.right.push_endpoints(segment);
        } else if slope <= -slope_threshold {
            sides.left.push_endpoints(segment);
        }
    }
    sides
}

/// y = slope * x + intercept
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedLine {
    pub slope: f64,
    pub intercept: f64,
}

impl FittedLine {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// `x`에서의 y값을 정수 픽셀로 (0 방향으로 절삭) 돌려줍니다.
    pub fn pixel_at(&self, x: i32) -> (i32, i32) {
        (x, self.eval(x as f64) as i32)
    }
}

/// (x, y) 점 집합에 1차 다항식 y = a*x + b 를 최소제곱법(OLS)으로 피팅합니다.
///
/// 빈 집합이면 `FitError::Empty`, 모든 x가 같으면 `FitError::Vertical`.
pub fn fit_line(points: &PointSet) -> Result<FittedLine, FitError> {
    let xs = points.xs();
    let ys = points.ys();
    debug_assert_eq!(xs.len(), ys.len());
    if xs.is_empty() {
        return Err(FitError::Empty);
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let sxx = xs.iter().map(|&x| (x - mean_x) * (x - mean_x)).sum::<f64>();
    let sxy = xs
        .iter()
        .zip(ys.iter())
        .map(|(&x, &y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>();

    if sxx.abs() < 1e-12 {
        return Err(FitError::Vertical);
    }

    let slope = sxy / sxx;
    Ok(FittedLine {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
