pub use self::{board::*, board_generator::*, emoji_pool::*, level::*};

pub(crate) mod board;
pub(crate) mod board_generator;
pub(crate) mod emoji_pool;
pub(crate) mod level;
