pub mod closet;
pub mod open_meteo;
