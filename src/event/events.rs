/// Messages background tasks send back to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Toast(String),
    SignedOut,
}
