//! ラウンドのお題となる座標の生成と距離計算の実装

pub mod haversine;
pub mod random;

pub use haversine::HaversineDistance;
pub use random::RandomLocationGenerator;
