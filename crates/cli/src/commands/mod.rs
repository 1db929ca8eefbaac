pub mod chat;
pub mod conversations;
pub mod ingest;
pub mod specialist;
