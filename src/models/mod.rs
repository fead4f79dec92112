pub mod card;
pub mod deck;
pub mod media;
pub mod user;

pub use card::*;
pub use deck::*;
pub use media::*;
pub use user::*;
