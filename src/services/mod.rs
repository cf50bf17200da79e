pub mod landcover;
pub mod layers;
pub mod map_data;
pub mod regions;
