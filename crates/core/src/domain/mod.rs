pub mod outfit;
pub mod wardrobe;
pub mod weather;
