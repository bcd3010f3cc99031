
pub(crate) use handlers::{attempts_router, router};

#[cfg(test)]
mod tests;
