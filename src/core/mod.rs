pub mod emissions;
pub mod end_use;
pub mod energy_use;
pub mod fuel;
pub mod index_adjustment;
pub mod index_engine;
pub mod normalized_load;
pub mod units;
