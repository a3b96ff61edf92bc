pub mod budget;
pub mod generation_client;
pub mod planning;
