pub mod default_user_seed;

pub use default_user_seed::*;
