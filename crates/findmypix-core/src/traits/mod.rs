//! Collaborator traits consumed by the request pipeline.

mod session_source;
mod sign_out;

pub use session_source::SessionSource;
pub use sign_out::SignOutSink;
