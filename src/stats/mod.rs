pub mod welford;

pub use welford::OnlineAccumulator;
