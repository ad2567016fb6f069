pub mod accounts;
pub mod land_documents;
pub mod land_images;
pub mod land_unlocks;
pub mod lands;
pub mod roles;
