// Services module - Business logic

pub mod card_issuer;
pub mod card_verifier;
pub mod images;
pub mod qr_generator;
pub mod training_registry;
pub mod verification_code;
