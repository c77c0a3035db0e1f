//! # Aether Core
//!
//! 医院运营看板的核心模块，提供领域数据结构、错误定义和通用工具。

pub mod error;
pub mod models;
pub mod utils;

pub use error::{AetherError, Result};
pub use models::*;
