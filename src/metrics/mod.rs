/// Classification quality measures
pub mod confusion;
