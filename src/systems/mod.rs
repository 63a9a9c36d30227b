mod animals;
mod bookkeeping;
mod buildings;
mod economy;

pub use animals::AnimalSystem;
pub use bookkeeping::BookkeepingSystem;
pub use buildings::BuildingSystem;
pub use economy::EconomySystem;
