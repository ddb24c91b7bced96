//! 肺边界修正.
//!
//! 分割得到的肺掩膜常常在纵隔、血管附近出现凹陷. 本模块在轮廓上寻找拐点,
//! 两两组成候选点对, 计算三个几何特征并交给分类器判断是否要闭合两点之间的凹陷.
//!
//! 整个过程只会增加前景像素, 不会删除.

mod correct;
mod features;
mod fill;
mod inflection;
mod metrics;
mod pair;
mod spec;

pub use correct::{border_correct, Corrected};
pub use features::{single_lung_features, LungFeatures, PairFeatures, PointIndex};
pub use fill::fill_poly;
pub use inflection::find_inflection_points;
pub use metrics::{distance_metrics, euclidean, DistanceMetrics};
pub use pair::generate_point_pair;
pub use spec::BorderSpec;
