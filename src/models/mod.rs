// Models module - Database entity representations

pub mod card;
pub mod company;
pub mod training;

pub use card::EnrollmentCard;
pub use company::Company;
pub use training::Training;
