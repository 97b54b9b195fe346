pub mod card;
pub mod deck;
pub mod price;
pub mod user;

pub use card::*;
pub use deck::*;
pub use price::*;
pub use user::*;
