//! Entity definitions (database row mappings).

mod reservation;
mod resource;
mod user;

pub use reservation::{ReservationEntity, ReservationWithNamesEntity};
pub use resource::ResourceEntity;
pub use user::UserEntity;
