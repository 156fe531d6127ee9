pub mod conversation;
pub mod fact;
pub mod intent;
pub mod language;
pub mod product;
pub mod response;
pub mod utterance;
