mod builder;
pub(crate) mod models;

pub use builder::Xiaohongshu;
