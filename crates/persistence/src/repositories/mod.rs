//! Repository implementations for database operations.

mod reservation;
mod resource;
mod user;

pub use reservation::ReservationRepository;
pub use resource::ResourceRepository;
pub use user::UserRepository;
