mod flybot_error;

pub use flybot_error::{ErrorKind, FlybotError, FlybotResult};
